//! Session states - Defines all possible states of a generation session

use serde::{Deserialize, Serialize};

/// Defines the possible states of a generation session.
///
/// `Succeeded`, `Failed` and `Aborted` are terminal: once reached, the
/// machine refuses every further event.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GenerationState {
    /// No request submitted yet.
    #[default]
    Idle,

    /// An attempt is running against the remote endpoint.
    InFlight {
        /// The current attempt (1-based).
        attempt: u32,
    },

    /// Waiting out the backoff after a retryable failure.
    Retrying {
        /// The attempt that just failed.
        attempt: u32,
        /// Message of the failure that triggered the retry.
        last_error: String,
    },

    /// An attempt produced a result.
    Succeeded { result_id: String },

    /// Unrecoverable error or attempts exhausted.
    Failed {
        error_message: String,
        attempts: u32,
        failed_at: String, // ISO timestamp
    },

    /// The session was cancelled by its owner.
    Aborted,
}

impl GenerationState {
    /// Check if this is a terminal state (no more transitions allowed).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded { .. } | Self::Failed { .. } | Self::Aborted
        )
    }

    /// Check if a session is running (in flight or backing off).
    pub fn is_active(&self) -> bool {
        matches!(self, Self::InFlight { .. } | Self::Retrying { .. })
    }

    /// Retry counter shown to users while a session backs off.
    pub fn retry_count(&self) -> Option<u32> {
        match self {
            Self::Retrying { attempt, .. } => Some(*attempt),
            _ => None,
        }
    }

    /// Get a human-readable description of the current state.
    pub fn description(&self) -> &str {
        match self {
            Self::Idle => "Ready",
            Self::InFlight { .. } => "Generating",
            Self::Retrying { .. } => "Retrying",
            Self::Succeeded { .. } => "Done",
            Self::Failed { .. } => "Failed",
            Self::Aborted => "Cancelled",
        }
    }
}
