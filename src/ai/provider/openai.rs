//! OpenAI API Provider
//!
//! Chat Completions endpoint. The prompt is sent as a single user message;
//! reasoning models (o1 family) reject system messages and custom temperature,
//! so neither is sent unless temperature is configured explicitly.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::http::{build_client, normalize_base, resolve_api_key, send_json};
use super::{LlmProvider, LlmResponse, ProviderDescriptor, TokenUsage};
use crate::config::LlmConfig;
use crate::types::{ErrorCategory, LlmError};

const PROVIDER_NAME: &str = "openai";
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// OpenAI API Provider with secure API key handling
pub struct OpenAiProvider {
    /// API key stored securely - never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    model: String,
    token_limit: usize,
    temperature: Option<f32>,
    max_output_tokens: usize,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("token_limit", &self.token_limit)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(descriptor: &ProviderDescriptor, config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = resolve_api_key(config.api_keys.openai.as_deref(), API_KEY_ENV, PROVIDER_NAME)?;
        let api_base = normalize_base(config.api_base.openai.as_deref().unwrap_or(DEFAULT_API_BASE));

        Ok(Self {
            api_key,
            api_base,
            model: descriptor.model_name.clone(),
            token_limit: descriptor.token_limit,
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            client: build_client(PROVIDER_NAME)?,
        })
    }

    fn build_request(&self, prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.temperature,
            max_completion_tokens: Some(self.max_output_tokens),
        }
    }

    fn parse_response(body: ChatCompletionResponse) -> Result<LlmResponse, LlmError> {
        let usage = body
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens));

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                LlmError::with_provider(
                    ErrorCategory::ParseError,
                    "No content in OpenAI response",
                    PROVIDER_NAME,
                )
            })?;

        Ok(LlmResponse::new(content, usage))
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn token_limit(&self) -> usize {
        self.token_limit
    }

    async fn send(&self, prompt: &str) -> Result<LlmResponse, LlmError> {
        info!("Requesting analysis from OpenAI (model: {})", self.model);

        let request = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(self.api_key.expose_secret())
            .json(&self.build_request(prompt));

        let body: ChatCompletionResponse = send_json(request, PROVIDER_NAME).await?;
        debug!("Received response from OpenAI");
        Self::parse_response(body)
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn provider(temperature: Option<f32>) -> OpenAiProvider {
        let descriptor = ProviderDescriptor {
            provider_name: PROVIDER_NAME.to_string(),
            model_name: "o1-preview".to_string(),
            token_limit: 128_000,
            request_timeout: Duration::from_secs(300),
        };
        let mut config = LlmConfig::default();
        config.api_keys.openai = Some("sk-test".to_string());
        config.api_base.openai = Some("http://localhost:9999/v1/".to_string());
        config.temperature = temperature;
        OpenAiProvider::new(&descriptor, &config).unwrap()
    }

    #[test]
    fn test_request_shape() {
        let json = serde_json::to_value(provider(None).build_request("hi")).unwrap();
        assert_eq!(json["model"], "o1-preview");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");
        assert!(json.get("temperature").is_none());
        assert_eq!(json["max_completion_tokens"], 4096);
    }

    #[test]
    fn test_temperature_sent_when_configured() {
        let json = serde_json::to_value(provider(Some(0.2)).build_request("hi")).unwrap();
        assert!((json["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_api_base_normalized() {
        assert_eq!(provider(None).api_base, "http://localhost:9999/v1");
    }

    #[test]
    fn test_parse_response() {
        let body: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"1. [ ] ISSUE LOW"}}],
                "usage":{"prompt_tokens":1000,"completion_tokens":200,"total_tokens":1200}}"#,
        )
        .unwrap();
        let response = OpenAiProvider::parse_response(body).unwrap();
        assert_eq!(response.content, "1. [ ] ISSUE LOW");
        assert_eq!(response.usage.unwrap().total(), 1200);
    }

    #[test]
    fn test_parse_response_without_choices() {
        let body: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        let err = OpenAiProvider::parse_response(body).unwrap_err();
        assert_eq!(err.category, ErrorCategory::ParseError);
    }

    #[test]
    fn test_debug_redacts_key() {
        assert!(!format!("{:?}", provider(None)).contains("sk-test"));
    }
}
