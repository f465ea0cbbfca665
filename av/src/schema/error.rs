//! Contract error types

use std::fmt;

use thiserror::Error;

/// A single failed constraint on one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Wire name of the field (`soilMoisture`, `alerts[2].severity`)
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Input failed its record constraints
///
/// Always carries at least one field error; the first one is the field named in
/// the error message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.summary())]
pub struct ValidationError {
    errors: Vec<FieldError>,
}

impl ValidationError {
    /// Create an error for a single offending field
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError::new(field, message)],
        }
    }

    /// Build from collected field errors, `None` when there are none
    pub fn from_errors(errors: Vec<FieldError>) -> Option<Self> {
        if errors.is_empty() { None } else { Some(Self { errors }) }
    }

    /// The first offending field
    pub fn first(&self) -> &FieldError {
        &self.errors[0]
    }

    /// First offending field, plus a count of the rest
    fn summary(&self) -> String {
        let first = self.first();
        match self.errors.len() {
            1 => format!("invalid field `{}`: {}", first.field, first.message),
            n => format!("invalid field `{}`: {} (and {} more)", first.field, first.message, n - 1),
        }
    }

    /// Name of the first offending field
    pub fn field_name(&self) -> &str {
        &self.first().field
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Whether any error concerns `field`
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Prefix every field name, for nested records (`alerts[0].`)
    pub fn prefixed(self, prefix: &str) -> Self {
        Self {
            errors: self
                .errors
                .into_iter()
                .map(|e| FieldError::new(format!("{}{}", prefix, e.field), e.message))
                .collect(),
        }
    }
}

/// Generated output did not satisfy its record schema
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("output field `{field}` {message}")]
pub struct SchemaError {
    pub field: String,
    pub message: String,
}

impl SchemaError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<ValidationError> for SchemaError {
    fn from(err: ValidationError) -> Self {
        let first = err.first();
        Self::new(first.field.clone(), first.message.clone())
    }
}

/// Malformed `data:<mime>;base64,<data>` URI
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataUriError {
    #[error("missing `data:` scheme")]
    MissingScheme,

    #[error("missing `;base64,` marker")]
    NotBase64,

    #[error("invalid MIME type '{0}'")]
    InvalidMime(String),

    #[error("empty payload")]
    EmptyPayload,

    #[error("payload is not valid base64: {0}")]
    InvalidBase64(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_names_first_field() {
        let err = ValidationError::from_errors(vec![
            FieldError::new("soilMoisture", "must be between 0 and 100"),
            FieldError::new("humidity", "must be between 0 and 100"),
        ])
        .unwrap();

        assert_eq!(err.field_name(), "soilMoisture");
        assert!(err.has_field("humidity"));
        let msg = err.to_string();
        assert!(msg.contains("soilMoisture"));
        assert!(msg.contains("and 1 more"));
    }

    #[test]
    fn test_single_field_message() {
        let err = ValidationError::field("question", "must be at least 5 characters");
        assert_eq!(err.to_string(), "invalid field `question`: must be at least 5 characters");
        let source: &dyn std::error::Error = &err;
        assert!(source.source().is_none());
    }

    #[test]
    fn test_from_errors_empty() {
        assert!(ValidationError::from_errors(vec![]).is_none());
    }

    #[test]
    fn test_prefixed() {
        let err = ValidationError::field("severity", "unknown").prefixed("alerts[1].");
        assert_eq!(err.field_name(), "alerts[1].severity");
    }

    #[test]
    fn test_schema_error_from_validation() {
        let err: SchemaError = ValidationError::field("confidenceLevel", "must be between 0 and 1").into();
        assert_eq!(err.field, "confidenceLevel");
        assert!(err.to_string().contains("confidenceLevel"));
    }
}
