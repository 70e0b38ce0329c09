//! Per-session cancellation
//!
//! Every session gets its own token/source pair. The token side can only be
//! observed; the source side can only cancel. Both wrap the same
//! `tokio_util` token, so a single `cancel()` reaches the orchestrator loop
//! and any transport future waiting on `cancelled()`.

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::debug;

/// Read-only view of a session's cancellation state.
#[derive(Debug, Clone)]
pub struct CancelToken {
    inner: CancellationToken,
}

impl CancelToken {
    /// Once true, stays true.
    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Resolves when the paired source cancels.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.inner.cancelled()
    }
}

/// Cancelling side of a session's token pair.
#[derive(Debug, Clone)]
pub struct CancelSource {
    inner: CancellationToken,
}

impl CancelSource {
    /// Idempotent: repeated calls have no further effect.
    pub fn cancel(&self) {
        if !self.inner.is_cancelled() {
            debug!("Cancellation requested");
        }
        self.inner.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }
}

/// Issues fresh token/source pairs.
#[derive(Debug, Default)]
pub struct CancellationController;

impl CancellationController {
    pub fn new() -> Self {
        Self
    }

    pub fn create(&self) -> (CancelToken, CancelSource) {
        let inner = CancellationToken::new();
        (
            CancelToken {
                inner: inner.clone(),
            },
            CancelSource { inner },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn cancel_is_idempotent_and_monotonic() {
        let controller = CancellationController::new();
        let (token, source) = controller.create();
        assert!(!token.is_cancelled());

        source.cancel();
        source.cancel();
        assert!(token.is_cancelled());
        assert!(source.is_cancelled());
    }

    #[test]
    fn pairs_are_independent() {
        let controller = CancellationController::new();
        let (first, first_source) = controller.create();
        let (second, _second_source) = controller.create();

        first_source.cancel();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_future_wakes_waiters() {
        let (token, source) = CancellationController::new().create();
        let waiter = tokio::spawn(async move {
            token.cancelled().await;
            token.is_cancelled()
        });

        source.cancel();
        let woke = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
        assert!(woke);
    }
}
