//! Error taxonomy for generation sessions.

use thiserror::Error;

/// Whether a failure may be retried by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Fatal,
    Retryable,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// Malformed or incomplete request, rejected before any network call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The remote endpoint answered with a non-success status.
    #[error("{message}")]
    Remote { status: u16, message: String },

    /// The request never produced a usable response (connect, timeout, decode).
    #[error("Transport error: {0}")]
    Transport(String),

    /// A transport-level failure explicitly marked as not worth retrying.
    #[error("{0}")]
    Rejected(String),

    /// The last retryable failure after the final permitted attempt.
    #[error("{message}")]
    RetryExhausted { message: String, attempts: u32 },

    #[error("A generation session is already in progress")]
    SessionBusy,

    #[error("Cancelled")]
    Cancelled,
}

impl GenerationError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Remote { .. } | Self::Transport(_) => ErrorClass::Retryable,
            Self::Validation(_)
            | Self::Rejected(_)
            | Self::RetryExhausted { .. }
            | Self::SessionBusy
            | Self::Cancelled => ErrorClass::Fatal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Retryable
    }

    /// Wrap the final retryable failure once attempts run out.
    pub fn exhausted(last: &GenerationError, attempts: u32) -> Self {
        Self::RetryExhausted {
            message: last.to_string(),
            attempts,
        }
    }
}

pub type Result<T> = std::result::Result<T, GenerationError>;
