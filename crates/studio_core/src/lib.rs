//! studio_core - Core types for the generation studio
//!
//! This crate provides the foundational types shared by every studio crate:
//! - `request` - Style, RawGenerationInput and the validated GenerationRequest
//! - `record` - GenerationResult, HistoryItem and TranscriptEntry
//! - `error` - GenerationError and its Fatal/Retryable classification
//! - `retry` - RetryPolicy and backoff delay computation
//! - `config` - StudioConfig loading (defaults, TOML file, environment)

pub mod config;
pub mod error;
pub mod paths;
pub mod record;
pub mod request;
pub mod retry;

// Re-export commonly used types
pub use config::{RetrySettings, StudioConfig};
pub use error::{ErrorClass, GenerationError, Result};
pub use record::{GenerationResult, HistoryItem, TranscriptEntry, TranscriptKind};
pub use request::{GenerationRequest, RawGenerationInput, Style};
pub use retry::RetryPolicy;
