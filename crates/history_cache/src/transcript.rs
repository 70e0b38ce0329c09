//! Conversational transcript stored next to the history

use std::sync::Arc;

use studio_core::TranscriptEntry;
use tracing::{error, warn};

use crate::storage::PersistenceGateway;
use crate::TRANSCRIPT_KEY;

/// Append-only log of user submissions and generated results, oldest first.
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    gateway: Arc<dyn PersistenceGateway>,
}

impl Transcript {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self {
            entries: Vec::new(),
            gateway,
        }
    }

    pub async fn load(gateway: Arc<dyn PersistenceGateway>) -> Self {
        let mut transcript = Self::new(gateway);
        match transcript.gateway.load(TRANSCRIPT_KEY).await {
            Ok(Some(blob)) => match serde_json::from_str::<Vec<TranscriptEntry>>(&blob) {
                Ok(entries) => transcript.entries = entries,
                Err(err) => warn!("Ignoring malformed transcript record: {}", err),
            },
            Ok(None) => {}
            Err(err) => warn!("Failed to load transcript: {}", err),
        }
        transcript
    }

    pub async fn append(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
        match serde_json::to_string(&self.entries) {
            Ok(blob) => {
                if let Err(err) = self.gateway.save(TRANSCRIPT_KEY, &blob).await {
                    error!("Failed to save transcript: {}", err);
                }
            }
            Err(err) => error!("Failed to serialize transcript: {}", err),
        }
    }

    /// Empty the transcript and remove its record, readable or not.
    pub async fn clear(&mut self) {
        self.entries.clear();
        if let Err(err) = self.gateway.remove(TRANSCRIPT_KEY).await {
            error!("Failed to remove stored transcript: {}", err);
        }
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
