//! Schema contracts
//!
//! Typed input/output records for every advisory capability, plus the session
//! entity records. Each record implements [`Contract`]; output records also
//! implement [`OutputContract`] so the JSON Schema sent to the backend lives next
//! to the type it describes.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

mod avatar;
mod crop_qa;
mod dashboard;
mod data_uri;
mod error;
mod irrigation;
mod ndvi;
mod pest;
mod session;
mod yield_estimate;

pub use avatar::{AvatarInput, AvatarOutput};
pub use crop_qa::{CropAnswer, CropQuestion};
pub use dashboard::{Alert, DashboardInput, DashboardSummary, Severity};
pub use data_uri::DataUri;
pub use error::{DataUriError, FieldError, SchemaError, ValidationError};
pub use irrigation::{IrrigationInput, IrrigationOutput};
pub use ndvi::{NdviInput, NdviOutput};
pub use pest::{PestInput, PestOutput};
pub use session::{FarmSettings, FarmType, Language, PLACEHOLDER_AVATAR, UserProfile};
pub use yield_estimate::{YieldInput, YieldOutput};

/// A record with field-level constraints
pub trait Contract {
    /// Check every constraint, reporting all offending fields
    fn validate(&self) -> Result<(), ValidationError>;
}

/// A record the generation backend must produce
pub trait OutputContract: Contract {
    /// JSON Schema handed to the backend to bind its output
    fn json_schema() -> Value;
}

/// Parse and validate a raw input object
///
/// Returns the record unchanged in value on success.
pub fn validate_input<I>(raw: Value) -> Result<I, ValidationError>
where
    I: Contract + DeserializeOwned,
{
    debug!("validate_input: called");
    let input: I = serde_json::from_value(raw).map_err(|e| {
        let (field, message) = split_serde_error(&e, "input");
        ValidationError::field(field, message)
    })?;
    input.validate()?;
    Ok(input)
}

/// Parse and validate raw generation output
pub fn validate_output<O>(raw: Value) -> Result<O, SchemaError>
where
    O: OutputContract + DeserializeOwned,
{
    debug!("validate_output: called");
    let output: O = serde_json::from_value(raw).map_err(|e| {
        let (field, message) = split_serde_error(&e, "output");
        SchemaError::new(field, message)
    })?;
    output.validate()?;
    Ok(output)
}

static MISSING_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^missing field `([^`]+)`").expect("missing-field pattern is valid"));

/// Recover the offending field name from a serde error where serde reports one
fn split_serde_error(err: &serde_json::Error, fallback: &str) -> (String, String) {
    let text = err.to_string();
    match MISSING_FIELD.captures(&text) {
        Some(caps) => (caps[1].to_string(), "is required".to_string()),
        None => (fallback.to_string(), text),
    }
}

/// Accumulates field errors for one record
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require at least `min` characters after trimming
    pub fn min_chars(mut self, field: &str, value: &str, min: usize) -> Self {
        let len = value.trim().chars().count();
        if len < min {
            let message = if len == 0 {
                "is required".to_string()
            } else {
                format!("must be at least {} characters", min)
            };
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    /// Require a non-blank value
    pub fn required(self, field: &str, value: &str) -> Self {
        self.min_chars(field, value, 1)
    }

    pub fn max_chars(mut self, field: &str, value: &str, max: usize) -> Self {
        if value.chars().count() > max {
            self.errors
                .push(FieldError::new(field, format!("can be a maximum of {} characters", max)));
        }
        self
    }

    /// Require a finite value
    pub fn finite(mut self, field: &str, value: f64) -> Self {
        if !value.is_finite() {
            self.errors.push(FieldError::new(field, "must be a finite number"));
        }
        self
    }

    /// Require `min <= value <= max`
    pub fn range(mut self, field: &str, value: f64, min: f64, max: f64) -> Self {
        if !value.is_finite() || value < min || value > max {
            self.errors
                .push(FieldError::new(field, format!("must be between {} and {}", min, max)));
        }
        self
    }

    pub fn positive(mut self, field: &str, value: f64) -> Self {
        if !value.is_finite() || value <= 0.0 {
            self.errors.push(FieldError::new(field, "must be positive"));
        }
        self
    }

    /// Require a well-formed base64 data URI whose MIME type starts with `mime_prefix`
    pub fn data_uri(mut self, field: &str, value: &str, mime_prefix: &str) -> Self {
        match DataUri::parse(value) {
            Ok(uri) if uri.mime().starts_with(mime_prefix) => {}
            Ok(uri) => self.errors.push(FieldError::new(
                field,
                format!("must be a {}* data URI, got {}", mime_prefix, uri.mime()),
            )),
            Err(e) => self.errors.push(FieldError::new(
                field,
                format!("must be a data:<mime>;base64,<data> URI ({})", e),
            )),
        }
        self
    }

    /// Custom check
    pub fn check(mut self, field: &str, ok: bool, message: &str) -> Self {
        if !ok {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    /// Fold in the result of validating a nested record
    pub fn nested(mut self, prefix: &str, result: Result<(), ValidationError>) -> Self {
        if let Err(e) = result {
            self.errors.extend(e.prefixed(prefix).errors().iter().cloned());
        }
        self
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        match ValidationError::from_errors(self.errors) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Serde helpers for form-style input
pub(crate) mod coerce {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    /// Accept a JSON number or a numeric string
    pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match NumberOrText::deserialize(deserializer)? {
            NumberOrText::Number(n) => Ok(n),
            NumberOrText::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| D::Error::custom(format!("expected a number, got \"{}\"", s))),
        }
    }
}
