//! Request submission
//!
//! `GenerationStudio` validates raw input, starts at most one session at a
//! time, runs it on the orchestrator and feeds successful results into the
//! history and transcript.

use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use generation_state::GenerationState;
use history_cache::{FilePersistence, HistoryCache, PersistenceGateway, Transcript};
use studio_core::{
    GenerationError, GenerationRequest, HistoryItem, RawGenerationInput, RetryPolicy,
    StudioConfig, TranscriptEntry,
};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::cancellation::{CancelSource, CancellationController};
use crate::orchestrator::RetryOrchestrator;
use crate::session::{GenerationSession, Outcome, SessionSnapshot};
use crate::transport::{GenerationTransport, HttpGenerationTransport};

type RetryObserver = Arc<dyn Fn(u32, &GenerationError) + Send + Sync>;

/// Slot holding the id of the running session, if any.
///
/// The slot is released when the session task finishes, after its result
/// has been written to the history.
#[derive(Default)]
struct ActiveSlot(StdMutex<Option<Uuid>>);

impl ActiveSlot {
    fn try_claim(&self, session_id: Uuid) -> Result<(), GenerationError> {
        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Err(GenerationError::SessionBusy);
        }
        *slot = Some(session_id);
        Ok(())
    }

    fn release(&self, session_id: Uuid) {
        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if *slot == Some(session_id) {
            *slot = None;
        }
    }

    fn current(&self) -> Option<Uuid> {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the slot even if the session task panics.
struct SlotGuard {
    slot: Arc<ActiveSlot>,
    session_id: Uuid,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.slot.release(self.session_id);
    }
}

pub struct GenerationStudio {
    orchestrator: Arc<RetryOrchestrator>,
    policy: RetryPolicy,
    cancellation: CancellationController,
    history: Arc<Mutex<HistoryCache>>,
    transcript: Arc<Mutex<Transcript>>,
    active: Arc<ActiveSlot>,
    retry_observer: Option<RetryObserver>,
}

impl GenerationStudio {
    /// Build a studio, restoring history and transcript from `gateway`.
    pub async fn load(
        transport: Arc<dyn GenerationTransport>,
        gateway: Arc<dyn PersistenceGateway>,
        history_capacity: usize,
        policy: RetryPolicy,
    ) -> Self {
        let history = HistoryCache::load(Arc::clone(&gateway), history_capacity).await;
        let transcript = Transcript::load(gateway).await;

        Self {
            orchestrator: Arc::new(RetryOrchestrator::new(transport)),
            policy,
            cancellation: CancellationController::new(),
            history: Arc::new(Mutex::new(history)),
            transcript: Arc::new(Mutex::new(transcript)),
            active: Arc::new(ActiveSlot::default()),
            retry_observer: None,
        }
    }

    /// HTTP transport and file persistence as described by `config`.
    pub async fn from_config(config: &StudioConfig) -> Result<Self, GenerationError> {
        let transport = HttpGenerationTransport::from_config(config)?;
        let gateway = FilePersistence::new(config.records_dir());
        Ok(Self::load(
            Arc::new(transport),
            Arc::new(gateway),
            config.history_capacity,
            config.retry_policy(),
        )
        .await)
    }

    /// Observer invoked for every scheduled retry of every session.
    pub fn with_retry_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(u32, &GenerationError) + Send + Sync + 'static,
    {
        self.retry_observer = Some(Arc::new(observer));
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Validate `raw` and start a session for it.
    ///
    /// Invalid input fails with `GenerationError::Validation` before any
    /// session exists; a running session makes this fail with
    /// `GenerationError::SessionBusy` and leaves that session untouched.
    pub async fn submit(&self, raw: RawGenerationInput) -> Result<SessionHandle, GenerationError> {
        let request = GenerationRequest::try_from(raw)?;

        let (token, source) = self.cancellation.create();
        let mut session = GenerationSession::new(token);
        let session_id = session.id();

        self.active.try_claim(session_id)?;
        let guard = SlotGuard {
            slot: Arc::clone(&self.active),
            session_id,
        };
        if let Err(err) = session.start() {
            error!("[{}] Failed to start session: {}", session_id, err);
            return Err(GenerationError::SessionBusy);
        }
        let snapshots = session.subscribe();

        info!(
            "[{}] Submitted generation (style: {}, prompt: {} chars)",
            session_id,
            request.style(),
            request.prompt().len()
        );
        self.transcript
            .lock()
            .await
            .append(TranscriptEntry::user(&request))
            .await;

        let orchestrator = Arc::clone(&self.orchestrator);
        let policy = self.policy.clone();
        let history = Arc::clone(&self.history);
        let transcript = Arc::clone(&self.transcript);
        let observer = self.retry_observer.clone();

        let task = tokio::spawn(async move {
            let _guard = guard;
            let outcome = orchestrator
                .run(&mut session, &request, &policy, |attempt, error| {
                    if let Some(observer) = observer.as_ref() {
                        observer(attempt, error);
                    }
                })
                .await;

            if let Outcome::Succeeded(result) = &outcome {
                history.lock().await.insert(HistoryItem::from(result)).await;
                transcript
                    .lock()
                    .await
                    .append(TranscriptEntry::ai(result))
                    .await;
            }
            outcome
        });

        Ok(SessionHandle {
            session_id,
            source,
            snapshots,
            task,
        })
    }

    /// Id of the running session, if any.
    pub fn active_session(&self) -> Option<Uuid> {
        self.active.current()
    }

    /// History, newest first.
    pub async fn history(&self) -> Vec<HistoryItem> {
        self.history.lock().await.to_vec()
    }

    pub async fn restore(&self, id: &str) -> Option<HistoryItem> {
        self.history.lock().await.restore(id).cloned()
    }

    pub async fn transcript(&self) -> Vec<TranscriptEntry> {
        self.transcript.lock().await.entries().to_vec()
    }

    /// Clear the history and the transcript.
    pub async fn clear(&self) {
        self.history.lock().await.clear().await;
        self.transcript.lock().await.clear().await;
        info!("History and transcript cleared");
    }
}

/// Caller-side view of a running session.
pub struct SessionHandle {
    session_id: Uuid,
    source: CancelSource,
    snapshots: watch::Receiver<SessionSnapshot>,
    task: JoinHandle<Outcome>,
}

impl SessionHandle {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn state(&self) -> GenerationState {
        self.snapshots.borrow().state.clone()
    }

    pub fn attempts(&self) -> u32 {
        self.snapshots.borrow().attempt
    }

    pub fn last_error(&self) -> Option<String> {
        self.snapshots.borrow().last_error.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Request cancellation; takes effect at the session's next checkpoint.
    pub fn cancel(&self) {
        self.source.cancel();
    }

    /// A cancel handle that can outlive `wait()`.
    pub fn canceller(&self) -> CancelSource {
        self.source.clone()
    }

    /// Wait for the terminal outcome.
    pub async fn wait(self) -> Outcome {
        let attempts = self.attempts();
        match self.task.await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!("[{}] Session task failed: {}", self.session_id, err);
                Outcome::Failed {
                    error: GenerationError::Rejected(format!("Session task failed: {err}")),
                    attempts,
                }
            }
        }
    }
}
