//! Crop Q&A records

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{Contract, OutputContract, ValidationError, Validator};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropQuestion {
    pub question: String,
}

impl CropQuestion {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
        }
    }
}

impl Contract for CropQuestion {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new().min_chars("question", &self.question, 5).finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropAnswer {
    pub answer: String,
}

impl Contract for CropAnswer {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

impl OutputContract for CropAnswer {
    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "answer": {
                    "type": "string",
                    "description": "The AI-driven answer to the farmer question."
                }
            },
            "required": ["answer"]
        })
    }
}
