//! Avatar generation records

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{Contract, OutputContract, ValidationError, Validator};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarInput {
    pub prompt_text: String,
}

impl AvatarInput {
    pub fn new(prompt_text: impl Into<String>) -> Self {
        Self {
            prompt_text: prompt_text.into(),
        }
    }
}

impl Default for AvatarInput {
    fn default() -> Self {
        Self::new("a farmer in a field, pixel art style")
    }
}

impl Contract for AvatarInput {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new().required("promptText", &self.prompt_text).finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarOutput {
    /// `data:image/...;base64,...`
    pub avatar_data_uri: String,
}

impl Contract for AvatarOutput {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .data_uri("avatarDataUri", &self.avatar_data_uri, "image/")
            .finish()
    }
}

impl OutputContract for AvatarOutput {
    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "avatarDataUri": {
                    "type": "string",
                    "description": "The generated avatar image as a data URI that must include a MIME type and use Base64 encoding. Expected format: 'data:<mimetype>;base64,<encoded_data>'."
                }
            },
            "required": ["avatarDataUri"]
        })
    }
}
