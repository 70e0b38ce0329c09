//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use studio_core::{GenerationError, GenerationRequest, GenerationResult, Style};
use tokio::time::Instant;

use crate::cancellation::CancelToken;
use crate::transport::GenerationTransport;

pub fn sample_request() -> GenerationRequest {
    GenerationRequest::new("data:image/png;base64,AAAA", "a red coat", Style::Vintage)
        .expect("valid request")
}

/// Plays back a fixed script of attempt results; `Ok(())` becomes a result.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<(), GenerationError>>>,
    call_times: Mutex<Vec<Instant>>,
    hang: bool,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<(), GenerationError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            call_times: Mutex::new(Vec::new()),
            hang: false,
        }
    }

    /// A transport whose calls never complete and ignore cancellation.
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.call_times.lock().unwrap().len()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationTransport for ScriptedTransport {
    async fn generate(
        &self,
        request: &GenerationRequest,
        _cancel: &CancelToken,
    ) -> Result<GenerationResult, GenerationError> {
        let call = {
            let mut times = self.call_times.lock().unwrap();
            times.push(Instant::now());
            times.len()
        };
        if self.hang {
            std::future::pending::<()>().await;
        }
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Transport("script exhausted".to_string())));
        next.map(|()| GenerationResult {
            id: format!("gen_{call}"),
            artifact_ref: format!("https://picsum.photos/512/512?random={call}"),
            prompt: request.prompt().to_string(),
            style: request.style(),
            created_at: Utc::now(),
        })
    }
}
