//! LlmClient trait definition

use async_trait::async_trait;

use super::{GenerateRequest, GenerateResponse, LlmError};

/// Stateless generation client - each call is independent
///
/// One request produces exactly one HTTP call. Implementations never retry;
/// the caller decides what a failure means.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider name, for logging
    fn provider(&self) -> &str;

    /// Produce structured output or an image for a single prompt
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError>;
}
