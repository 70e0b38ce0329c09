//! Remote generation call

mod http;

use async_trait::async_trait;
use studio_core::{GenerationError, GenerationRequest, GenerationResult};

use crate::cancellation::CancelToken;

pub use http::HttpGenerationTransport;

/// One attempt against the remote generator.
///
/// Implementations should stop outstanding work once `cancel` fires and
/// report it as `GenerationError::Cancelled`.
#[async_trait]
pub trait GenerationTransport: Send + Sync {
    async fn generate(
        &self,
        request: &GenerationRequest,
        cancel: &CancelToken,
    ) -> Result<GenerationResult, GenerationError>;
}
