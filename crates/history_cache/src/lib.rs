//! # History Cache
//!
//! Bounded, newest-first record of completed generations and the
//! conversational transcript, persisted best-effort through an injected
//! `PersistenceGateway`.

pub mod error;
pub mod history;
pub mod storage;
pub mod transcript;

// Re-exports
pub use error::PersistenceError;
pub use history::HistoryCache;
pub use storage::{FilePersistence, MemoryPersistence, PersistenceGateway};
pub use transcript::Transcript;

/// Record key under which the history is persisted.
pub const HISTORY_KEY: &str = "ai-studio-history";

/// Record key under which the transcript is persisted.
pub const TRANSCRIPT_KEY: &str = "ai-studio-messages";
