//! Generation results and their durable projections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::request::{GenerationRequest, Style};

/// A successful response from the remote generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub id: String,
    #[serde(rename = "imageUrl")]
    pub artifact_ref: String,
    pub prompt: String,
    pub style: Style,
    pub created_at: DateTime<Utc>,
}

/// An entry in the bounded history, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: String,
    #[serde(rename = "imageUrl")]
    pub artifact_ref: String,
    pub prompt: String,
    pub style: Style,
    pub created_at: DateTime<Utc>,
}

impl From<&GenerationResult> for HistoryItem {
    fn from(result: &GenerationResult) -> Self {
        Self {
            id: result.id.clone(),
            artifact_ref: result.artifact_ref.clone(),
            prompt: result.prompt.clone(),
            style: result.style,
            created_at: result.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptKind {
    User,
    Ai,
}

/// One line of the conversational transcript kept next to the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TranscriptKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEntry {
    pub fn user(request: &GenerationRequest) -> Self {
        Self {
            id: format!("user-{}", Uuid::new_v4()),
            kind: TranscriptKind::User,
            content: request.prompt().to_string(),
            image_url: Some(request.image_data().to_string()),
            style: Some(request.style()),
            timestamp: Utc::now(),
        }
    }

    pub fn ai(result: &GenerationResult) -> Self {
        Self {
            id: format!("ai-{}", result.id),
            kind: TranscriptKind::Ai,
            content: result.prompt.clone(),
            image_url: Some(result.artifact_ref.clone()),
            style: Some(result.style),
            timestamp: result.created_at,
        }
    }
}
