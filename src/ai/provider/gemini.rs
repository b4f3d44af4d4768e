//! Google Gemini Provider (generateContent)

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::http::{build_client, normalize_base, resolve_api_key, send_json};
use super::{LlmProvider, LlmResponse, ProviderDescriptor, TokenUsage};
use crate::config::LlmConfig;
use crate::types::{ErrorCategory, LlmError};

const PROVIDER_NAME: &str = "gemini";
const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
const API_KEY_ENV: &str = "GEMINI_API_KEY";

pub struct GeminiProvider {
    api_key: SecretString,
    api_base: String,
    model: String,
    token_limit: usize,
    temperature: Option<f32>,
    max_output_tokens: usize,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiProvider {
    pub fn new(descriptor: &ProviderDescriptor, config: &LlmConfig) -> Result<Self, LlmError> {
        Ok(Self {
            api_key: resolve_api_key(config.api_keys.gemini.as_deref(), API_KEY_ENV, PROVIDER_NAME)?,
            api_base: normalize_base(config.api_base.gemini.as_deref().unwrap_or(DEFAULT_API_BASE)),
            model: descriptor.model_name.clone(),
            token_limit: descriptor.token_limit,
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            client: build_client(PROVIDER_NAME)?,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        )
    }

    fn build_request(&self, prompt: &str) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.max_output_tokens,
                temperature: self.temperature,
            },
        }
    }

    fn parse_response(body: GenerateResponse) -> Result<LlmResponse, LlmError> {
        if let Some(reason) = body.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(LlmError::with_provider(
                ErrorCategory::BadRequest,
                format!("Prompt blocked by Gemini: {}", reason),
                PROVIDER_NAME,
            ));
        }

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(LlmError::with_provider(
                ErrorCategory::ParseError,
                "No candidates in Gemini response",
                PROVIDER_NAME,
            ));
        }

        let usage = body
            .usage_metadata
            .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count));
        Ok(LlmResponse::new(text, usage))
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
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
        info!("Requesting analysis from Gemini (model: {})", self.model);

        let request = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&self.build_request(prompt));

        let body: GenerateResponse = send_json(request, PROVIDER_NAME).await?;
        debug!("Received response from Gemini");
        Self::parse_response(body)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn provider() -> GeminiProvider {
        let descriptor = ProviderDescriptor {
            provider_name: PROVIDER_NAME.to_string(),
            model_name: "gemini-2.0-flash-exp".to_string(),
            token_limit: 1_048_576,
            request_timeout: Duration::from_secs(300),
        };
        let mut config = LlmConfig::default();
        config.api_keys.gemini = Some("g-test".to_string());
        GeminiProvider::new(&descriptor, &config).unwrap()
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(
            provider().endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash-exp:generateContent"
        );
    }

    #[test]
    fn test_request_shape() {
        let json = serde_json::to_value(provider().build_request("look")).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "look");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 4096);
    }

    #[test]
    fn test_parse_joins_parts() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"a"},{"text":"b"}]}}],
                "usageMetadata":{"promptTokenCount":10,"candidatesTokenCount":5,"totalTokenCount":15}}"#,
        )
        .unwrap();
        let response = GeminiProvider::parse_response(body).unwrap();
        assert_eq!(response.content, "ab");
        assert_eq!(response.usage.unwrap().total(), 15);
    }

    #[test]
    fn test_blocked_prompt_is_bad_request() {
        let body: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        let err = GeminiProvider::parse_response(body).unwrap_err();
        assert_eq!(err.category, ErrorCategory::BadRequest);
        assert!(!err.is_transient());
    }
}
