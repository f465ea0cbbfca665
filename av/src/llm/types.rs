//! Generation request/response types
//!
//! One logical operation: a prompt (plus optional media) goes in, either a
//! structured JSON value or an image comes out. Provider clients translate these
//! to their own wire formats.

use serde_json::Value;
use tracing::debug;

use crate::schema::DataUri;

/// What the backend is asked to produce
#[derive(Debug, Clone, PartialEq)]
pub enum OutputSpec {
    /// A JSON object matching `schema`
    Json { name: String, schema: Value },

    /// A single generated image
    Image,
}

impl OutputSpec {
    pub fn json(name: impl Into<String>, schema: Value) -> Self {
        Self::Json {
            name: name.into(),
            schema,
        }
    }
}

/// Per-request model settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelConfig {
    /// Override the configured model
    pub model: Option<String>,

    /// Image aspect ratio, e.g. "1:1"
    pub aspect_ratio: Option<String>,

    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl ModelConfig {
    pub fn with_aspect_ratio(ratio: impl Into<String>) -> Self {
        Self {
            aspect_ratio: Some(ratio.into()),
            ..Default::default()
        }
    }
}

/// A generation request - everything needed for one backend call
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Rendered prompt text
    pub prompt: String,

    pub output: OutputSpec,

    /// Attached images, in prompt order
    pub media: Vec<DataUri>,

    pub config: ModelConfig,
}

impl GenerateRequest {
    /// Request a structured JSON result
    pub fn structured(prompt: impl Into<String>, name: impl Into<String>, schema: Value) -> Self {
        debug!("GenerateRequest::structured: called");
        Self {
            prompt: prompt.into(),
            output: OutputSpec::json(name, schema),
            media: vec![],
            config: ModelConfig::default(),
        }
    }

    /// Request a generated image
    pub fn image(prompt: impl Into<String>) -> Self {
        debug!("GenerateRequest::image: called");
        Self {
            prompt: prompt.into(),
            output: OutputSpec::Image,
            media: vec![],
            config: ModelConfig::default(),
        }
    }

    pub fn with_media(mut self, media: Vec<DataUri>) -> Self {
        self.media = media;
        self
    }

    pub fn with_config(mut self, config: ModelConfig) -> Self {
        self.config = config;
        self
    }
}

/// Response from a generation request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateResponse {
    /// Structured output (absent if the model produced none)
    pub output: Option<Value>,

    /// Free text the model emitted alongside or instead of the output
    pub text: Option<String>,

    /// Generated image
    pub media: Option<DataUri>,

    pub stop_reason: StopReason,
    pub usage: TokenUsage,
}

impl GenerateResponse {
    pub fn structured(output: Value) -> Self {
        Self {
            output: Some(output),
            ..Default::default()
        }
    }

    pub fn image(media: DataUri) -> Self {
        Self {
            media: Some(media),
            ..Default::default()
        }
    }

    /// A response carrying nothing usable
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Why the model stopped generating
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StopReason {
    #[default]
    EndTurn,
    ToolUse,
    MaxTokens,
    StopSequence,
    ContentFilter,
}

impl StopReason {
    /// Parse from Anthropic API stop_reason string
    pub fn from_anthropic(s: &str) -> Self {
        debug!(%s, "StopReason::from_anthropic: called");
        match s {
            "end_turn" => StopReason::EndTurn,
            "tool_use" => StopReason::ToolUse,
            "max_tokens" => StopReason::MaxTokens,
            "stop_sequence" => StopReason::StopSequence,
            "refusal" => StopReason::ContentFilter,
            _ => {
                debug!("StopReason::from_anthropic: unknown, defaulting to EndTurn");
                StopReason::EndTurn
            }
        }
    }

    /// Parse from OpenAI finish_reason string
    pub fn from_openai(s: &str) -> Self {
        debug!(%s, "StopReason::from_openai: called");
        match s {
            "stop" => StopReason::EndTurn,
            "tool_calls" | "function_call" => StopReason::ToolUse,
            "length" => StopReason::MaxTokens,
            "content_filter" => StopReason::ContentFilter,
            _ => StopReason::EndTurn,
        }
    }
}

/// Token usage reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}
