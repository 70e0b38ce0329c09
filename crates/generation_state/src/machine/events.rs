//! Generation events - Defines events that trigger state transitions

use serde::{Deserialize, Serialize};

/// Defines the events that can trigger state transitions in the FSM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationEvent {
    /// A validated request was submitted.
    Submitted,

    /// The current attempt returned a result.
    AttemptSucceeded { result_id: String },

    /// The current attempt failed with a retryable error and attempts remain.
    RetryScheduled { attempt: u32, error: String },

    /// The backoff wait elapsed and the next attempt is starting.
    BackoffElapsed,

    /// A fatal error occurred or the attempts ran out.
    FatalError { error: String, attempts: u32 },

    /// The session token was observed cancelled.
    Cancelled,
}

impl GenerationEvent {
    /// Short name used in logs and transition errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::AttemptSucceeded { .. } => "attempt_succeeded",
            Self::RetryScheduled { .. } => "retry_scheduled",
            Self::BackoffElapsed => "backoff_elapsed",
            Self::FatalError { .. } => "fatal_error",
            Self::Cancelled => "cancelled",
        }
    }
}
