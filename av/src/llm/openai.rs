//! OpenAI API client
//!
//! Structured output goes through Chat Completions with a `json_schema`
//! response format. Images are produced by the Images API and returned as
//! base64 data URIs.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

use super::{GenerateRequest, GenerateResponse, LlmClient, LlmError, OutputSpec, StopReason, TokenUsage};
use crate::config::LlmConfig;
use crate::schema::DataUri;

/// OpenAI API client
pub struct OpenAIClient {
    model: String,
    image_model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
}

impl OpenAIClient {
    /// Create a new client from configuration
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, image_model = %config.image_model, "from_config: called");
        let api_key = config.get_api_key()?;

        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            image_model: config.image_model.clone(),
            api_key,
            base_url: config.base_url().to_string(),
            http,
            max_tokens: config.max_tokens,
        })
    }

    /// Build the Chat Completions body for a structured request
    fn build_chat_body(&self, request: &GenerateRequest, name: &str, schema: &Value) -> Value {
        let model = request.config.model.as_deref().unwrap_or(&self.model);
        debug!(%model, media = request.media.len(), "build_chat_body: called");

        let mut content = vec![json!({ "type": "text", "text": request.prompt })];
        content.extend(request.media.iter().map(|uri| {
            json!({
                "type": "image_url",
                "image_url": { "url": uri.to_string() }
            })
        }));

        let max_tokens = request
            .config
            .max_tokens
            .map_or(self.max_tokens, |m| m.min(self.max_tokens));

        // GPT-5.x and o1/o3 models use max_completion_tokens instead of max_tokens
        let uses_completion_tokens = model.starts_with("gpt-5") || model.starts_with("o1") || model.starts_with("o3");

        let mut body = json!({
            "model": model,
            "messages": [{ "role": "user", "content": content }],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": name,
                    "schema": schema,
                }
            },
        });

        if uses_completion_tokens {
            body["max_completion_tokens"] = json!(max_tokens);
        } else {
            body["max_tokens"] = json!(max_tokens);
        }

        if let Some(temperature) = request.config.temperature {
            body["temperature"] = json!(temperature);
        }

        body
    }

    /// Build the Images API body
    fn build_image_body(&self, request: &GenerateRequest) -> Value {
        let model = request.config.model.as_deref().unwrap_or(&self.image_model);
        debug!(%model, "build_image_body: called");

        let mut body = json!({
            "model": model,
            "prompt": request.prompt,
            "n": 1,
            "size": image_size(request.config.aspect_ratio.as_deref()),
        });

        // dall-e models return URLs unless asked otherwise
        if model.starts_with("dall-e") {
            body["response_format"] = json!("b64_json");
        }

        body
    }

    /// Parse the Chat Completions response
    fn parse_chat_response(&self, api_response: OpenAIResponse) -> GenerateResponse {
        debug!(choices = api_response.choices.len(), "parse_chat_response: called");
        let usage = TokenUsage {
            input_tokens: api_response.usage.prompt_tokens,
            output_tokens: api_response.usage.completion_tokens,
        };

        let Some(choice) = api_response.choices.into_iter().next() else {
            debug!("parse_chat_response: no choices");
            return GenerateResponse {
                usage,
                ..Default::default()
            };
        };

        let stop_reason = choice
            .finish_reason
            .as_deref()
            .map(StopReason::from_openai)
            .unwrap_or_default();

        // a refusal or malformed JSON leaves output empty; the caller decides
        let output = choice
            .message
            .content
            .as_deref()
            .and_then(|c| serde_json::from_str::<Value>(c).ok());

        GenerateResponse {
            output,
            text: choice.message.refusal.or(choice.message.content),
            media: None,
            stop_reason,
            usage,
        }
    }

    fn parse_image_response(&self, api_response: OpenAIImageResponse) -> Result<GenerateResponse, LlmError> {
        debug!(images = api_response.data.len(), "parse_image_response: called");
        let media = match api_response.data.into_iter().find_map(|d| d.b64_json) {
            Some(b64) => Some(DataUri::from_base64("image/png", b64).map_err(|e| LlmError::InvalidResponse(e.to_string()))?),
            None => None,
        };

        Ok(GenerateResponse {
            media,
            ..Default::default()
        })
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Response, LlmError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "post: called");

        let response = self
            .http
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();

        if status == 429 {
            debug!("post: rate limited (429)");
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
            debug!(%status, "post: API error");
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, message: text });
        }

        Ok(response)
    }
}

/// Map an aspect ratio onto a size the Images API accepts
fn image_size(aspect_ratio: Option<&str>) -> &'static str {
    match aspect_ratio {
        Some("16:9") | Some("3:2") | Some("4:3") => "1536x1024",
        Some("9:16") | Some("2:3") | Some("3:4") => "1024x1536",
        _ => "1024x1024",
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    fn provider(&self) -> &str {
        "openai"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError> {
        debug!(%self.model, "generate: called");
        match &request.output {
            OutputSpec::Json { name, schema } => {
                let body = self.build_chat_body(&request, name, schema);
                let response = self.post("/v1/chat/completions", &body).await?;
                debug!("generate: chat success");
                let api_response: OpenAIResponse = response.json().await?;
                Ok(self.parse_chat_response(api_response))
            }
            OutputSpec::Image => {
                let body = self.build_image_body(&request);
                let response = self.post("/v1/images/generations", &body).await?;
                debug!("generate: image success");
                let api_response: OpenAIImageResponse = response.json().await?;
                self.parse_image_response(api_response)
            }
        }
    }
}

// OpenAI API response types

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: OpenAIUsage,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct OpenAIImageResponse {
    data: Vec<OpenAIImageData>,
}

#[derive(Debug, Deserialize)]
struct OpenAIImageData {
    b64_json: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ModelConfig;

    fn client(model: &str, max_tokens: u32) -> OpenAIClient {
        OpenAIClient {
            model: model.to_string(),
            image_model: "gpt-image-1".to_string(),
            api_key: "test-key".to_string(),
            base_url: "https://api.openai.com".to_string(),
            http: Client::new(),
            max_tokens,
        }
    }

    #[test]
    fn test_build_chat_body_json_schema() {
        let schema = json!({ "type": "object", "properties": { "answer": { "type": "string" } } });
        let request = GenerateRequest::structured("When to sow wheat?", "crop-qa", schema.clone());

        let body = client("gpt-4o", 4096).build_chat_body(&request, "crop-qa", &schema);

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "crop-qa");
        assert_eq!(body["response_format"]["json_schema"]["schema"], schema);
        assert_eq!(body["messages"][0]["content"][0]["text"], "When to sow wheat?");
    }

    #[test]
    fn test_build_chat_body_with_image() {
        let uri = DataUri::from_bytes("image/jpeg", b"jpeg bytes");
        let request = GenerateRequest::structured("Analyze", "ndvi", json!({})).with_media(vec![uri.clone()]);

        let body = client("gpt-4o", 4096).build_chat_body(&request, "ndvi", &json!({}));

        let part = &body["messages"][0]["content"][1];
        assert_eq!(part["type"], "image_url");
        assert_eq!(part["image_url"]["url"], uri.to_string());
    }

    #[test]
    fn test_completion_tokens_for_newer_models() {
        let request = GenerateRequest::structured("Test", "t", json!({})).with_config(ModelConfig {
            max_tokens: Some(9000),
            ..Default::default()
        });

        let body = client("gpt-5", 2000).build_chat_body(&request, "t", &json!({}));

        assert_eq!(body["max_completion_tokens"], 2000);
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_build_image_body() {
        let request = GenerateRequest::image("a square user avatar, a tractor").with_config(ModelConfig::with_aspect_ratio("1:1"));

        let body = client("gpt-4o", 4096).build_image_body(&request);

        assert_eq!(body["model"], "gpt-image-1");
        assert_eq!(body["size"], "1024x1024");
        assert_eq!(body["n"], 1);
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_dalle_requests_b64() {
        let request = GenerateRequest::image("a farmer").with_config(ModelConfig {
            model: Some("dall-e-3".to_string()),
            ..Default::default()
        });

        let body = client("gpt-4o", 4096).build_image_body(&request);
        assert_eq!(body["response_format"], "b64_json");
    }

    #[test]
    fn test_image_size() {
        assert_eq!(image_size(Some("1:1")), "1024x1024");
        assert_eq!(image_size(Some("16:9")), "1536x1024");
        assert_eq!(image_size(Some("9:16")), "1024x1536");
        assert_eq!(image_size(None), "1024x1024");
    }

    #[test]
    fn test_parse_chat_response() {
        let raw = json!({
            "choices": [{
                "message": { "content": "{\"answer\":\"Sow in November.\"}" },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 5 }
        });
        let api_response: OpenAIResponse = serde_json::from_value(raw).unwrap();

        let resp = client("gpt-4o", 4096).parse_chat_response(api_response);

        assert_eq!(resp.output, Some(json!({ "answer": "Sow in November." })));
        assert_eq!(resp.stop_reason, StopReason::EndTurn);
        assert_eq!(resp.usage.input_tokens, 10);
    }

    #[test]
    fn test_parse_chat_response_not_json() {
        let raw = json!({
            "choices": [{ "message": { "content": "Sorry, no." }, "finish_reason": "stop" }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 5 }
        });
        let api_response: OpenAIResponse = serde_json::from_value(raw).unwrap();

        let resp = client("gpt-4o", 4096).parse_chat_response(api_response);
        assert!(resp.output.is_none());
        assert_eq!(resp.text.as_deref(), Some("Sorry, no."));
    }

    #[test]
    fn test_parse_image_response() {
        let raw = json!({ "data": [{ "b64_json": "aGVsbG8=" }] });
        let api_response: OpenAIImageResponse = serde_json::from_value(raw).unwrap();

        let resp = client("gpt-4o", 4096).parse_image_response(api_response).unwrap();
        let media = resp.media.unwrap();
        assert_eq!(media.mime(), "image/png");
        assert_eq!(media.to_string(), "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn test_parse_image_response_without_data() {
        let raw = json!({ "data": [{ "url": "https://example.com/a.png" }] });
        let api_response: OpenAIImageResponse = serde_json::from_value(raw).unwrap();

        let resp = client("gpt-4o", 4096).parse_image_response(api_response).unwrap();
        assert!(resp.media.is_none());
    }
}
