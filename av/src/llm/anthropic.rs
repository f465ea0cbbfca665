//! Anthropic Messages API client
//!
//! Structured output is obtained by forcing a single tool whose input schema is
//! the output schema; the tool input is the result. Image generation is not
//! offered by this API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

use super::{GenerateRequest, GenerateResponse, LlmClient, LlmError, OutputSpec, StopReason, TokenUsage};
use crate::config::LlmConfig;

/// Anthropic API client
pub struct AnthropicClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
}

impl AnthropicClient {
    /// Create a new client from configuration
    ///
    /// Reads the API key from the environment variable named in config.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, "from_config: called");
        let api_key = config.get_api_key()?;

        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url().to_string(),
            http,
            max_tokens: config.max_tokens,
        })
    }

    /// Build the request body for the Anthropic API
    fn build_request_body(&self, request: &GenerateRequest) -> Result<Value, LlmError> {
        debug!(%self.model, media = request.media.len(), "build_request_body: called");
        let OutputSpec::Json { name, schema } = &request.output else {
            debug!("build_request_body: image output requested");
            return Err(LlmError::Unsupported {
                provider: "anthropic",
                operation: "image generation",
            });
        };

        let mut content: Vec<Value> = request
            .media
            .iter()
            .map(|uri| {
                json!({
                    "type": "image",
                    "source": {
                        "type": "base64",
                        "media_type": uri.mime(),
                        "data": uri.base64(),
                    }
                })
            })
            .collect();
        content.push(json!({ "type": "text", "text": request.prompt }));

        let max_tokens = request
            .config
            .max_tokens
            .map_or(self.max_tokens, |m| m.min(self.max_tokens));

        let mut body = json!({
            "model": request.config.model.as_deref().unwrap_or(&self.model),
            "max_tokens": max_tokens,
            "messages": [{ "role": "user", "content": content }],
            "tools": [{
                "name": name,
                "description": format!("Record the {} result", name),
                "input_schema": schema,
            }],
            "tool_choice": { "type": "tool", "name": name },
        });

        if let Some(temperature) = request.config.temperature {
            body["temperature"] = json!(temperature);
        }

        Ok(body)
    }

    /// Parse the Anthropic API response
    fn parse_response(&self, api_response: AnthropicResponse, tool_name: &str) -> GenerateResponse {
        debug!(?api_response.stop_reason, "parse_response: called");
        let mut output = None;
        let mut text = None;

        for block in api_response.content {
            match block {
                AnthropicContentBlock::Text { text: t } => {
                    debug!("parse_response: Text block");
                    text = Some(t);
                }
                AnthropicContentBlock::ToolUse { name, input, .. } if name == tool_name => {
                    debug!(%name, "parse_response: ToolUse block");
                    output = Some(input);
                }
                AnthropicContentBlock::ToolUse { name, .. } => {
                    debug!(%name, "parse_response: ignoring unexpected tool");
                }
            }
        }

        GenerateResponse {
            output,
            text,
            media: None,
            stop_reason: StopReason::from_anthropic(&api_response.stop_reason),
            usage: TokenUsage {
                input_tokens: api_response.usage.input_tokens,
                output_tokens: api_response.usage.output_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    fn provider(&self) -> &str {
        "anthropic"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError> {
        debug!(%self.model, "generate: called");
        let body = self.build_request_body(&request)?;
        let tool_name = match &request.output {
            OutputSpec::Json { name, .. } => name.clone(),
            OutputSpec::Image => String::new(),
        };
        let url = format!("{}/v1/messages", self.base_url);

        let response = self
            .http
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();

        if status == 429 {
            debug!("generate: rate limited (429)");
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);

            return Err(LlmError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        if !response.status().is_success() {
            debug!(%status, "generate: API error");
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, message: text });
        }

        debug!("generate: success");
        let api_response: AnthropicResponse = response.json().await?;
        Ok(self.parse_response(api_response, &tool_name))
    }
}

// Anthropic API response types

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    stop_reason: String,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum AnthropicContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        #[allow(dead_code)]
        id: String,
        name: String,
        input: Value,
    },
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
}
