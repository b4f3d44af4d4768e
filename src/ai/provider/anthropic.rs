//! Anthropic Messages API Provider

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::http::{build_client, normalize_base, resolve_api_key, send_json};
use super::{LlmProvider, LlmResponse, ProviderDescriptor, TokenUsage};
use crate::config::LlmConfig;
use crate::types::{ErrorCategory, LlmError};

const PROVIDER_NAME: &str = "anthropic";
const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    api_key: SecretString,
    api_base: String,
    model: String,
    token_limit: usize,
    temperature: Option<f32>,
    max_output_tokens: usize,
    client: reqwest::Client,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl AnthropicProvider {
    pub fn new(descriptor: &ProviderDescriptor, config: &LlmConfig) -> Result<Self, LlmError> {
        Ok(Self {
            api_key: resolve_api_key(
                config.api_keys.anthropic.as_deref(),
                API_KEY_ENV,
                PROVIDER_NAME,
            )?,
            api_base: normalize_base(
                config
                    .api_base
                    .anthropic
                    .as_deref()
                    .unwrap_or(DEFAULT_API_BASE),
            ),
            model: descriptor.model_name.clone(),
            token_limit: descriptor.token_limit,
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            client: build_client(PROVIDER_NAME)?,
        })
    }

    fn build_request(&self, prompt: &str) -> MessagesRequest {
        MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_output_tokens,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.temperature,
        }
    }

    /// Concatenate all text blocks; non-text blocks are ignored
    fn parse_response(body: MessagesResponse) -> Result<LlmResponse, LlmError> {
        let text: String = body
            .content
            .iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n");

        if text.is_empty() {
            return Err(LlmError::with_provider(
                ErrorCategory::ParseError,
                "No text content in Anthropic response",
                PROVIDER_NAME,
            ));
        }

        let usage = body
            .usage
            .map(|u| TokenUsage::new(u.input_tokens, u.output_tokens));
        Ok(LlmResponse::new(text, usage))
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
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
        info!("Requesting analysis from Anthropic (model: {})", self.model);

        let request = self
            .client
            .post(format!("{}/v1/messages", self.api_base))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .json(&self.build_request(prompt));

        let body: MessagesResponse = send_json(request, PROVIDER_NAME).await?;
        debug!("Received response from Anthropic");
        Self::parse_response(body)
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: usize,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn provider() -> AnthropicProvider {
        let descriptor = ProviderDescriptor {
            provider_name: PROVIDER_NAME.to_string(),
            model_name: "claude-3-opus-20240229".to_string(),
            token_limit: 200_000,
            request_timeout: Duration::from_secs(300),
        };
        let mut config = LlmConfig::default();
        config.api_keys.anthropic = Some("sk-ant-test".to_string());
        AnthropicProvider::new(&descriptor, &config).unwrap()
    }

    #[test]
    fn test_request_requires_max_tokens() {
        let json = serde_json::to_value(provider().build_request("review")).unwrap();
        assert_eq!(json["model"], "claude-3-opus-20240229");
        assert_eq!(json["max_tokens"], 4096);
        assert_eq!(json["messages"][0]["content"], "review");
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_parse_joins_text_blocks() {
        let body: MessagesResponse = serde_json::from_str(
            r#"{"content":[{"type":"text","text":"part one"},{"type":"tool_use","id":"x"},
                {"type":"text","text":"part two"}],
                "usage":{"input_tokens":900,"output_tokens":300}}"#,
        )
        .unwrap();
        let response = AnthropicProvider::parse_response(body).unwrap();
        assert_eq!(response.content, "part one\npart two");
        assert_eq!(response.usage.unwrap().total(), 1200);
    }

    #[test]
    fn test_parse_empty_content() {
        let body: MessagesResponse = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        assert!(AnthropicProvider::parse_response(body).is_err());
    }
}
