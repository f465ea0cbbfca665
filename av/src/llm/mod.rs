//! Generation backend clients for AgriVision
//!
//! One logical operation per call: prompt (plus media) in, structured output or
//! an image out.

use std::sync::Arc;

use tracing::debug;

mod anthropic;
pub mod client;
mod error;
mod openai;
pub mod stub;
mod types;

pub use anthropic::AnthropicClient;
pub use client::LlmClient;
pub use error::LlmError;
pub use openai::OpenAIClient;
pub use stub::{StubClient, StubReply};
pub use types::{GenerateRequest, GenerateResponse, ModelConfig, OutputSpec, StopReason, TokenUsage};

use crate::config::LlmConfig;

/// Create an LLM client based on the provider specified in config
///
/// Supports "anthropic" and "openai" providers.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider.as_str() {
        "anthropic" => {
            debug!("create_client: creating Anthropic client");
            Ok(Arc::new(AnthropicClient::from_config(config)?))
        }
        "openai" => {
            debug!("create_client: creating OpenAI client");
            Ok(Arc::new(OpenAIClient::from_config(config)?))
        }
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            Err(LlmError::UnknownProvider(other.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider() {
        let config = LlmConfig {
            provider: "gemini".to_string(),
            ..Default::default()
        };
        let err = create_client(&config).err().unwrap();
        assert!(matches!(err, LlmError::UnknownProvider(ref p) if p == "gemini"));
    }

    #[test]
    #[serial_test::serial]
    fn test_create_client_dispatches_on_provider() {
        // SAFETY: tests that touch the process environment run serially
        unsafe { std::env::set_var("AGRIVISION_TEST_LLM_KEY", "sk-test") };

        for provider in ["anthropic", "openai"] {
            let config = LlmConfig {
                provider: provider.to_string(),
                api_key_env: Some("AGRIVISION_TEST_LLM_KEY".to_string()),
                ..Default::default()
            };
            let client = create_client(&config).unwrap();
            assert_eq!(client.provider(), provider);
        }

        unsafe { std::env::remove_var("AGRIVISION_TEST_LLM_KEY") };
    }

    #[test]
    fn test_missing_key_fails_before_any_request() {
        let config = LlmConfig {
            provider: "openai".to_string(),
            api_key_env: Some("AGRIVISION_UNSET_OPENAI_KEY".to_string()),
            ..Default::default()
        };
        let err = create_client(&config).err().unwrap();
        assert!(matches!(err, LlmError::MissingApiKey(_)));
    }
}
