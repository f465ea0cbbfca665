//! Flow error types

use std::time::Duration;
use thiserror::Error;

use crate::llm::LlmError;
use crate::prompts::ContractError;
use crate::schema::{SchemaError, ValidationError};

/// The backend did not produce a usable result
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation backend failed: {0}")]
    Backend(#[from] LlmError),

    #[error("model produced no usable output")]
    NoOutput,

    #[error("model produced no image")]
    NoMedia,

    #[error("model output rejected: {0}")]
    Schema(#[from] SchemaError),

    #[error("generation timed out after {0:?}")]
    Timeout(Duration),
}

/// Everything an invocation can fail with
#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl FlowError {
    pub fn is_validation(&self) -> bool {
        matches!(self, FlowError::Validation(_))
    }

    pub fn is_generation(&self) -> bool {
        matches!(self, FlowError::Generation(_))
    }

    pub fn is_contract(&self) -> bool {
        matches!(self, FlowError::Contract(_))
    }

    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            FlowError::Validation(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_generation(&self) -> Option<&GenerationError> {
        match self {
            FlowError::Generation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LlmError> for FlowError {
    fn from(e: LlmError) -> Self {
        FlowError::Generation(GenerationError::Backend(e))
    }
}

impl From<SchemaError> for FlowError {
    fn from(e: SchemaError) -> Self {
        FlowError::Generation(GenerationError::Schema(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_becomes_generation() {
        let err: FlowError = SchemaError::new("recommendation", "is required").into();
        assert!(err.is_generation());
        assert!(matches!(err.as_generation(), Some(GenerationError::Schema(_))));
    }

    #[test]
    fn test_validation_message_names_field() {
        let err: FlowError = ValidationError::field("soilMoisture", "must be between 0 and 100").into();
        assert!(err.is_validation());
        assert!(err.to_string().contains("soilMoisture"));
    }

    #[test]
    fn test_no_output_message() {
        assert_eq!(GenerationError::NoOutput.to_string(), "model produced no usable output");
    }
}
