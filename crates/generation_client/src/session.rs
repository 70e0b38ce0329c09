//! Generation session bookkeeping
//!
//! A `GenerationSession` owns the lifecycle FSM of one submit-to-outcome
//! run, its cancellation token, the attempt counter and the latest error.
//! Every accepted transition is published as a `SessionSnapshot` on a
//! `watch` channel so observers can follow the session without sharing
//! mutable state with it.

use generation_state::{GenerationEvent, GenerationState, StateMachine, TransitionError};
use serde::Serialize;
use studio_core::{GenerationError, GenerationResult};
use tokio::sync::watch;
use tracing::warn;
use uuid::Uuid;

use crate::cancellation::CancelToken;

/// Terminal result of a session.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Succeeded(GenerationResult),
    Failed { error: GenerationError, attempts: u32 },
    /// Cancelled by the owner. Not a failure.
    Aborted,
}

impl Outcome {
    pub fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }

    /// Message to show the user; `None` for success and cancellation.
    pub fn error_message(&self) -> Option<String> {
        match self {
            Self::Failed { error, .. } => Some(error.to_string()),
            _ => None,
        }
    }
}

/// Observable view of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub state: GenerationState,
    pub attempt: u32,
    pub last_error: Option<String>,
}

pub struct GenerationSession {
    id: Uuid,
    token: CancelToken,
    machine: StateMachine,
    attempt: u32,
    last_error: Option<GenerationError>,
    result: Option<GenerationResult>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl GenerationSession {
    pub fn new(token: CancelToken) -> Self {
        let id = Uuid::new_v4();
        let (snapshots, _) = watch::channel(SessionSnapshot {
            session_id: id,
            state: GenerationState::Idle,
            attempt: 0,
            last_error: None,
        });
        Self {
            id,
            token,
            machine: StateMachine::new(),
            attempt: 0,
            last_error: None,
            result: None,
            snapshots,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    pub fn state(&self) -> &GenerationState {
        self.machine.state()
    }

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn last_error(&self) -> Option<&GenerationError> {
        self.last_error.as_ref()
    }

    /// How the session ended; `None` while it is still idle or running.
    pub fn outcome(&self) -> Option<Outcome> {
        match self.machine.state() {
            GenerationState::Succeeded { .. } => self.result.clone().map(Outcome::Succeeded),
            GenerationState::Failed { attempts, .. } => {
                self.last_error.clone().map(|error| Outcome::Failed {
                    error,
                    attempts: *attempts,
                })
            }
            GenerationState::Aborted => Some(Outcome::Aborted),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    /// `Idle -> InFlight`; rejected with `SessionBusy` while active.
    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.apply(GenerationEvent::Submitted)?;
        self.attempt = 1;
        self.publish();
        Ok(())
    }

    pub(crate) fn begin_attempt(&mut self) {
        if self.apply(GenerationEvent::BackoffElapsed).is_ok() {
            self.attempt += 1;
            self.publish();
        }
    }

    pub(crate) fn record_error(&mut self, error: &GenerationError) {
        self.last_error = Some(error.clone());
        self.publish();
    }

    pub(crate) fn schedule_retry(&mut self, error: &GenerationError) {
        let _ = self.apply(GenerationEvent::RetryScheduled {
            attempt: self.attempt,
            error: error.to_string(),
        });
    }

    pub(crate) fn succeed(&mut self, result: &GenerationResult) {
        let applied = self.apply(GenerationEvent::AttemptSucceeded {
            result_id: result.id.clone(),
        });
        if applied.is_ok() {
            self.result = Some(result.clone());
        }
    }

    pub(crate) fn fail(&mut self, error: &GenerationError) {
        if self.machine.is_terminal() {
            return;
        }
        self.last_error = Some(error.clone());
        let _ = self.apply(GenerationEvent::FatalError {
            error: error.to_string(),
            attempts: self.attempt,
        });
    }

    pub(crate) fn abort(&mut self) {
        let _ = self.apply(GenerationEvent::Cancelled);
    }

    fn apply(&mut self, event: GenerationEvent) -> Result<(), TransitionError> {
        match self.machine.handle_event(event) {
            Ok(_) => {
                self.publish();
                Ok(())
            }
            Err(err) => {
                warn!("[{}] Rejected transition: {}", self.id, err);
                Err(err)
            }
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(SessionSnapshot {
            session_id: self.id,
            state: self.machine.state().clone(),
            attempt: self.attempt,
            last_error: self.last_error.as_ref().map(ToString::to_string),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancellation::CancellationController;

    fn session() -> GenerationSession {
        let (token, _source) = CancellationController::new().create();
        GenerationSession::new(token)
    }

    #[test]
    fn start_moves_to_in_flight() {
        let mut session = session();
        let rx = session.subscribe();
        session.start().unwrap();

        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.state, GenerationState::InFlight { attempt: 1 });
        assert_eq!(snapshot.attempt, 1);
        assert_eq!(snapshot.session_id, session.id());
    }

    #[test]
    fn second_start_is_busy() {
        let mut session = session();
        session.start().unwrap();
        let err = session.start().unwrap_err();
        assert!(matches!(err, TransitionError::SessionBusy(_)));
    }

    #[test]
    fn retry_cycle_updates_snapshot() {
        let mut session = session();
        session.start().unwrap();
        let error = GenerationError::Transport("connection reset".to_string());
        session.record_error(&error);
        session.schedule_retry(&error);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.state.retry_count(), Some(1));
        assert_eq!(snapshot.last_error.as_deref(), Some("Transport error: connection reset"));

        session.begin_attempt();
        assert_eq!(session.attempt(), 2);
        assert_eq!(session.state(), &GenerationState::InFlight { attempt: 2 });
    }

    #[test]
    fn nothing_moves_after_terminal() {
        let mut session = session();
        session.start().unwrap();
        session.abort();
        assert_eq!(session.state(), &GenerationState::Aborted);

        session.fail(&GenerationError::Transport("late".to_string()));
        session.begin_attempt();
        assert_eq!(session.state(), &GenerationState::Aborted);
        assert_eq!(session.attempt(), 1);
        assert!(session.last_error().is_none());
        assert_eq!(session.outcome(), Some(Outcome::Aborted));
    }

    #[test]
    fn outcome_reflects_failure() {
        let mut session = session();
        assert_eq!(session.outcome(), None);
        session.start().unwrap();
        assert_eq!(session.outcome(), None);

        let error = GenerationError::Rejected("unsupported image".to_string());
        session.fail(&error);
        assert_eq!(
            session.outcome(),
            Some(Outcome::Failed {
                error,
                attempts: 1
            })
        );
    }
}
