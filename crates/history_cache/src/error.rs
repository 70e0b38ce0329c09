//! Persistence error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Persistence backend failed: {0}")]
    Backend(String),

    #[error("Record is not valid JSON: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Record I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid record key: {0}")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, PersistenceError>;
