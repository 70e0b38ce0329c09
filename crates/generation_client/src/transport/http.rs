use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use studio_core::{GenerationError, GenerationRequest, GenerationResult, StudioConfig};
use tracing::{debug, warn};

use super::GenerationTransport;
use crate::cancellation::CancelToken;

/// Failure body returned by the endpoint on non-success statuses.
#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    message: String,
}

/// POSTs requests as JSON to the generation endpoint.
#[derive(Debug, Clone)]
pub struct HttpGenerationTransport {
    client: Client,
    endpoint: String,
}

impl HttpGenerationTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &StudioConfig) -> Result<Self, GenerationError> {
        Self::new(config.endpoint.clone(), config.request_timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, request: &GenerationRequest) -> Result<GenerationResult, GenerationError> {
        debug!("POST {} (style: {})", self.endpoint, request.style());

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<RemoteErrorBody>().await {
                Ok(body) => body.message,
                Err(_) => fallback_message(status),
            };
            warn!("Generation endpoint returned {}: {}", status, message);
            return Err(GenerationError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<GenerationResult>()
            .await
            .map_err(|e| GenerationError::Transport(format!("Invalid response body: {e}")))
    }
}

fn fallback_message(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()))
}

#[async_trait]
impl GenerationTransport for HttpGenerationTransport {
    async fn generate(
        &self,
        request: &GenerationRequest,
        cancel: &CancelToken,
    ) -> Result<GenerationResult, GenerationError> {
        // Dropping the request future aborts the underlying connection
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(GenerationError::Cancelled),
            result = self.send(request) => result,
        }
    }
}
