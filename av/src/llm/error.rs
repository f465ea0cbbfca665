//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during a backend call
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{provider} does not support {operation}")]
    Unsupported {
        provider: &'static str,
        operation: &'static str,
    },

    #[error("LLM API key not found. Set the {0} environment variable.")]
    MissingApiKey(String),

    #[error("Unknown LLM provider: '{0}'. Supported: anthropic, openai")]
    UnknownProvider(String),
}

impl LlmError {
    /// Check if this is a rate limit error
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, LlmError::RateLimited { .. })
    }

    /// Whether the request never reached a model (configuration problem)
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            LlmError::MissingApiKey(_) | LlmError::UnknownProvider(_) | LlmError::Unsupported { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_rate_limit() {
        let err = LlmError::RateLimited {
            retry_after: Duration::from_secs(60),
        };
        assert!(err.is_rate_limit());

        let err = LlmError::ApiError {
            status: 500,
            message: "Server error".to_string(),
        };
        assert!(!err.is_rate_limit());
    }

    #[test]
    fn test_is_configuration() {
        assert!(LlmError::MissingApiKey("OPENAI_API_KEY".to_string()).is_configuration());
        assert!(
            LlmError::Unsupported {
                provider: "anthropic",
                operation: "image generation"
            }
            .is_configuration()
        );
        assert!(!LlmError::InvalidResponse("Bad JSON".to_string()).is_configuration());
    }

    #[test]
    fn test_messages() {
        let err = LlmError::Unsupported {
            provider: "anthropic",
            operation: "image generation",
        };
        assert_eq!(err.to_string(), "anthropic does not support image generation");
        assert!(
            LlmError::MissingApiKey("ANTHROPIC_API_KEY".to_string())
                .to_string()
                .contains("ANTHROPIC_API_KEY")
        );
    }
}
