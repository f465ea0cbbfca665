//! Template errors

use std::path::PathBuf;
use thiserror::Error;

/// A template could not be turned into prompt text
///
/// Always a defect in the templates or the records feeding them, never
/// something the operator can fix by changing input.
#[derive(Debug, Error)]
pub enum ContractError {
    #[error("Prompt template not found: {0}")]
    TemplateNotFound(String),

    #[error("Failed to read prompt {}: {source}", path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render template {template}: {message}")]
    Render { template: String, message: String },
}

impl ContractError {
    pub fn template(&self) -> Option<&str> {
        match self {
            ContractError::TemplateNotFound(name) => Some(name),
            ContractError::Render { template, .. } => Some(template),
            ContractError::TemplateRead { .. } => None,
        }
    }
}
