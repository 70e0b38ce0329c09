//! Attempt/backoff loop
//!
//! The loop is bounded by the policy's attempt count and checks the session
//! token before each attempt and before and after each backoff wait. The
//! transport call and the backoff sleep are the only suspension points and
//! both race against the token.

use std::sync::Arc;

use studio_core::{GenerationError, GenerationRequest, RetryPolicy};
use tracing::{debug, info, warn};

use crate::session::{GenerationSession, Outcome};
use crate::transport::GenerationTransport;

pub struct RetryOrchestrator {
    transport: Arc<dyn GenerationTransport>,
}

impl RetryOrchestrator {
    pub fn new(transport: Arc<dyn GenerationTransport>) -> Self {
        Self { transport }
    }

    /// Drive `session` to a terminal state.
    ///
    /// `on_retry(attempt, error)` fires once per scheduled retry, in attempt
    /// order, before the backoff wait begins. It never fires after the
    /// outcome is decided.
    pub async fn run<F>(
        &self,
        session: &mut GenerationSession,
        request: &GenerationRequest,
        policy: &RetryPolicy,
        mut on_retry: F,
    ) -> Outcome
    where
        F: FnMut(u32, &GenerationError),
    {
        let session_id = session.id();
        let token = session.token().clone();
        let max_attempts = policy.max_attempts();

        if let Some(outcome) = session.outcome() {
            warn!("[{}] Session already finished, not running", session_id);
            return outcome;
        }
        if !session.state().is_active() && session.start().is_err() {
            return Outcome::Aborted;
        }

        loop {
            let attempt = session.attempt();

            if token.is_cancelled() {
                info!("[{}] Cancelled before attempt {}", session_id, attempt);
                session.abort();
                return Outcome::Aborted;
            }

            debug!("[{}] Attempt {}/{}", session_id, attempt, max_attempts);
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => Err(GenerationError::Cancelled),
                result = self.transport.generate(request, &token) => result,
            };

            let error = match result {
                Ok(result) => {
                    info!(
                        "[{}] Generation {} succeeded on attempt {}",
                        session_id, result.id, attempt
                    );
                    session.succeed(&result);
                    return Outcome::Succeeded(result);
                }
                Err(error) => error,
            };

            if token.is_cancelled() {
                info!("[{}] Cancelled during attempt {}", session_id, attempt);
                session.abort();
                return Outcome::Aborted;
            }

            session.record_error(&error);

            if !error.is_retryable() {
                warn!("[{}] Fatal error on attempt {}: {}", session_id, attempt, error);
                session.fail(&error);
                return Outcome::Failed {
                    error,
                    attempts: attempt,
                };
            }

            if attempt >= max_attempts {
                let exhausted = GenerationError::exhausted(&error, attempt);
                warn!(
                    "[{}] Giving up after {} attempts: {}",
                    session_id, attempt, error
                );
                session.fail(&exhausted);
                return Outcome::Failed {
                    error: exhausted,
                    attempts: attempt,
                };
            }

            session.schedule_retry(&error);
            on_retry(attempt, &error);

            let delay = policy.delay_for(attempt);
            info!(
                "[{}] Attempt {} failed ({}), retrying in {:?}",
                session_id, attempt, error, delay
            );

            if token.is_cancelled() {
                session.abort();
                return Outcome::Aborted;
            }
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    info!("[{}] Cancelled during backoff", session_id);
                    session.abort();
                    return Outcome::Aborted;
                }
                _ = tokio::time::sleep(delay) => {}
            }
            if token.is_cancelled() {
                session.abort();
                return Outcome::Aborted;
            }

            session.begin_attempt();
        }
    }
}
