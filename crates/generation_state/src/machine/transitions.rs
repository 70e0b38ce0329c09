//! State transitions - FSM transition logic
//!
//! Implements the state machine that handles event-driven state transitions.

use thiserror::Error;
use tracing::debug;

use super::events::GenerationEvent;
use super::states::GenerationState;

/// Error type for rejected state transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid transition from {from:?} with event {event}")]
    InvalidTransition { from: GenerationState, event: String },

    #[error("State machine is in terminal state: {0:?}")]
    TerminalState(GenerationState),

    #[error("A session is already active: {0:?}")]
    SessionBusy(GenerationState),
}

/// Represents a state transition result.
#[derive(Debug, Clone)]
pub struct StateTransition {
    /// The state before the transition.
    pub from: GenerationState,
    /// The state after the transition.
    pub to: GenerationState,
    /// The event that triggered the transition.
    pub event: GenerationEvent,
}

/// State machine for one generation session.
#[derive(Debug, Clone)]
pub struct StateMachine {
    /// Current state.
    current_state: GenerationState,
    /// Transition history (limited).
    history: Vec<StateTransition>,
    /// Max history entries to keep.
    max_history: usize,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Create a new state machine in Idle state.
    pub fn new() -> Self {
        Self {
            current_state: GenerationState::Idle,
            history: Vec::new(),
            max_history: 50,
        }
    }

    /// Create a state machine with a specific initial state.
    pub fn with_state(state: GenerationState) -> Self {
        Self {
            current_state: state,
            history: Vec::new(),
            max_history: 50,
        }
    }

    /// Get the current state.
    pub fn state(&self) -> &GenerationState {
        &self.current_state
    }

    /// Get the transition history.
    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    pub fn is_terminal(&self) -> bool {
        self.current_state.is_terminal()
    }

    /// Handle an event and transition to a new state.
    ///
    /// Terminal states reject every event, and an active session rejects a
    /// second `Submitted` with `SessionBusy`. The state is left untouched
    /// whenever an error is returned.
    pub fn handle_event(
        &mut self,
        event: GenerationEvent,
    ) -> Result<StateTransition, TransitionError> {
        let old_state = self.current_state.clone();
        let new_state = Self::compute_next_state(&old_state, &event)?;

        debug!(
            "Session transition {} -> {} on {}",
            old_state.description(),
            new_state.description(),
            event.name()
        );
        self.current_state = new_state.clone();

        let transition = StateTransition {
            from: old_state,
            to: new_state,
            event,
        };

        // Add to history
        self.history.push(transition.clone());
        if self.history.len() > self.max_history {
            self.history.remove(0);
        }

        Ok(transition)
    }

    /// Compute the next state given current state and event.
    fn compute_next_state(
        state: &GenerationState,
        event: &GenerationEvent,
    ) -> Result<GenerationState, TransitionError> {
        use GenerationEvent::*;
        use GenerationState::*;

        if state.is_terminal() {
            return Err(TransitionError::TerminalState(state.clone()));
        }

        let next = match (state, event) {
            // ========== Start ==========
            (Idle, Submitted) => InFlight { attempt: 1 },
            (InFlight { .. } | Retrying { .. }, Submitted) => {
                return Err(TransitionError::SessionBusy(state.clone()))
            }

            // ========== Attempt outcomes ==========
            (InFlight { .. }, AttemptSucceeded { result_id }) => Succeeded {
                result_id: result_id.clone(),
            },
            (InFlight { .. }, RetryScheduled { attempt, error }) => Retrying {
                attempt: *attempt,
                last_error: error.clone(),
            },

            // ========== Backoff ==========
            (Retrying { attempt, .. }, BackoffElapsed) => InFlight {
                attempt: attempt + 1,
            },

            // ========== Terminal failures ==========
            (InFlight { .. } | Retrying { .. }, FatalError { error, attempts }) => Failed {
                error_message: error.clone(),
                attempts: *attempts,
                failed_at: chrono::Utc::now().to_rfc3339(),
            },
            (InFlight { .. } | Retrying { .. }, Cancelled) => Aborted,

            _ => {
                return Err(TransitionError::InvalidTransition {
                    from: state.clone(),
                    event: event.name().to_string(),
                })
            }
        };

        Ok(next)
    }
}
