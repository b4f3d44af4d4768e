//! Ollama Local LLM Provider

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::http::{build_client, send_json};
use super::{LlmProvider, LlmResponse, ProviderDescriptor, TokenUsage};
use crate::config::LlmConfig;
use crate::types::{ErrorCategory, LlmError};

const PROVIDER_NAME: &str = "ollama";
const DEFAULT_API_BASE: &str = "http://localhost:11434";

/// Ollama Local LLM Provider
#[derive(Debug)]
pub struct OllamaProvider {
    api_base: String,
    model: String,
    token_limit: usize,
    temperature: Option<f32>,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(descriptor: &ProviderDescriptor, config: &LlmConfig) -> Result<Self, LlmError> {
        let api_base = Self::validate_endpoint(
            config.api_base.ollama.as_deref().unwrap_or(DEFAULT_API_BASE),
        )?;

        Ok(Self {
            api_base,
            model: descriptor.model_name.clone(),
            token_limit: descriptor.token_limit,
            temperature: config.temperature,
            client: build_client(PROVIDER_NAME)?,
        })
    }

    /// Only http/https endpoints are accepted; non-local hosts are allowed
    /// with a warning.
    fn validate_endpoint(endpoint: &str) -> Result<String, LlmError> {
        let invalid = |msg: String| LlmError::with_provider(ErrorCategory::BadRequest, msg, PROVIDER_NAME);

        let url = url::Url::parse(endpoint)
            .map_err(|e| invalid(format!("Invalid Ollama endpoint URL '{}': {}", endpoint, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!(
                "Ollama endpoint must use http or https scheme, got: {}",
                url.scheme()
            )));
        }

        if let Some(host) = url.host_str()
            && !matches!(host, "localhost" | "127.0.0.1" | "[::1]" | "::1")
        {
            warn!("Ollama endpoint is not localhost: {}", host);
        }

        Ok(url.as_str().trim_end_matches('/').to_string())
    }

    fn build_request(&self, prompt: &str) -> GenerateRequest {
        GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
                num_ctx: self.token_limit,
            },
        }
    }

    fn parse_response(body: GenerateResponse) -> Result<LlmResponse, LlmError> {
        if let Some(error) = body.error {
            return Err(LlmError::with_provider(ErrorCategory::Unknown, error, PROVIDER_NAME));
        }
        let usage = match (body.prompt_eval_count, body.eval_count) {
            (Some(input), Some(output)) => Some(TokenUsage::new(input, output)),
            _ => None,
        };
        Ok(LlmResponse::new(body.response.unwrap_or_default(), usage))
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
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
        info!("Requesting analysis from Ollama (model: {})", self.model);

        let request = self
            .client
            .post(format!("{}/api/generate", self.api_base))
            .json(&self.build_request(prompt));

        let body: GenerateResponse = send_json(request, PROVIDER_NAME).await?;
        debug!("Received response from Ollama");
        Self::parse_response(body)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    num_ctx: usize,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
    prompt_eval_count: Option<u32>,
    eval_count: Option<u32>,
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_endpoint() {
        assert_eq!(
            OllamaProvider::validate_endpoint("http://localhost:11434/").unwrap(),
            "http://localhost:11434"
        );
        assert!(OllamaProvider::validate_endpoint("file:///etc/passwd").is_err());
        assert!(OllamaProvider::validate_endpoint("not a url").is_err());
    }

    #[test]
    fn test_request_disables_streaming() {
        let descriptor = ProviderDescriptor {
            provider_name: PROVIDER_NAME.to_string(),
            model_name: "llama3".to_string(),
            token_limit: 8192,
            request_timeout: std::time::Duration::from_secs(60),
        };
        let provider = OllamaProvider::new(&descriptor, &LlmConfig::default()).unwrap();
        let json = serde_json::to_value(provider.build_request("hi")).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_ctx"], 8192);
    }

    #[test]
    fn test_parse_response() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{"model":"llama3","response":"done","done":true,"prompt_eval_count":40,"eval_count":2}"#,
        )
        .unwrap();
        let response = OllamaProvider::parse_response(body).unwrap();
        assert_eq!(response.content, "done");
        assert_eq!(response.usage.unwrap().total(), 42);
    }

    #[test]
    fn test_parse_error_body() {
        let body: GenerateResponse =
            serde_json::from_str(r#"{"error":"model 'llama9' not found"}"#).unwrap();
        assert!(OllamaProvider::parse_response(body).is_err());
    }
}
