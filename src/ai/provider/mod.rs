//! LLM Provider Abstraction
//!
//! Every backend implements [`LlmProvider`]: it sends one prompt and returns
//! text plus usage, or a classified [`LlmError`]. The provided
//! [`LlmProvider::submit`] wraps that call with the timeout and folds every
//! outcome into an [`AnalysisResult`], so no backend-specific error type
//! crosses this boundary.
//!
//! ## Modules
//!
//! - `registry`: model table, token-limit validation, backend factories
//! - `http`: shared reqwest plumbing and status classification
//! - `openai`, `anthropic`, `gemini`, `ollama`: backend adapters

mod anthropic;
mod gemini;
mod http;
mod ollama;
mod openai;
mod registry;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use registry::{
    BUILTIN_MODELS, BackendFamily, ModelInfo, ProviderDescriptor, ProviderFactory,
    ProviderRegistry, factory,
};

pub use crate::types::{ErrorCategory, ErrorClassifier, LlmError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::ai::prompt::AnalysisRequest;
use crate::ai::result::AnalysisResult;
use crate::ai::timeout::with_timeout_map;

// =============================================================================
// Response Types
// =============================================================================

/// Raw text reply from a backend
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    /// Token usage, when the backend reports it
    pub usage: Option<TokenUsage>,
}

impl LlmResponse {
    pub fn new(content: impl Into<String>, usage: Option<TokenUsage>) -> Self {
        Self {
            content: content.into(),
            usage,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// Shared provider handle; the executor moves a clone into the dispatch task
pub type SharedProvider = Arc<dyn LlmProvider>;

// =============================================================================
// LLM Provider Trait
// =============================================================================

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logging and artifact names
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;

    /// Maximum input size in provider tokens
    fn token_limit(&self) -> usize;

    /// One request/response round trip, no timeout applied
    async fn send(&self, prompt: &str) -> std::result::Result<LlmResponse, LlmError>;

    /// Send `request` under `timeout` and classify the outcome
    ///
    /// Expiry drops the in-flight `send` future, which cancels the HTTP
    /// request for reqwest-based backends.
    async fn submit(&self, request: &AnalysisRequest, timeout: Duration) -> AnalysisResult {
        let token_count = request.token_count();
        if token_count > self.token_limit() {
            warn!(
                "{} refused request of {} tokens (limit {})",
                self.name(),
                token_count,
                self.token_limit()
            );
            return AnalysisResult::token_exceeded(token_count, self.token_limit());
        }

        let started = Instant::now();
        let outcome = with_timeout_map(timeout, self.send(request.prompt()), "provider request").await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(Ok(response)) if response.content.trim().is_empty() => {
                let err = LlmError::with_provider(
                    ErrorCategory::ParseError,
                    "Provider returned an empty response",
                    self.name(),
                );
                AnalysisResult::provider_error(&err, elapsed)
            }
            Ok(Ok(response)) => {
                debug!(
                    "{} responded in {:.1}s ({} chars)",
                    self.name(),
                    elapsed.as_secs_f64(),
                    response.content.len()
                );
                AnalysisResult::success(
                    response.content,
                    elapsed,
                    response.usage.map(|u| u.total()),
                )
            }
            Ok(Err(err)) => {
                warn!("{} request failed: {}", self.name(), err);
                AnalysisResult::provider_error(&err, elapsed)
            }
            Err(_) => {
                warn!("{} did not respond within {:?}", self.name(), timeout);
                AnalysisResult::timeout(elapsed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::prompt::PromptTemplateId;
    use crate::ai::result::AnalysisStatus;
    use crate::ai::tokenizer::TokenEstimator;
    use crate::collector::{CollectedDocument, CollectedFile};
    use crate::types::FailureClass;

    struct StubProvider {
        delay: Duration,
        reply: std::result::Result<LlmResponse, LlmError>,
        limit: usize,
    }

    #[async_trait]
    impl LlmProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }
        fn model(&self) -> &str {
            "stub-model"
        }
        fn token_limit(&self) -> usize {
            self.limit
        }
        async fn send(&self, _prompt: &str) -> std::result::Result<LlmResponse, LlmError> {
            tokio::time::sleep(self.delay).await;
            self.reply.clone()
        }
    }

    fn request() -> AnalysisRequest {
        let doc = CollectedDocument::assemble(
            "Code Collection",
            vec![CollectedFile::new("a.py", "python", "pass\n".to_string())],
            Vec::new(),
            &TokenEstimator::new(),
        );
        let descriptor = ProviderDescriptor {
            provider_name: "stub".to_string(),
            model_name: "stub-model".to_string(),
            token_limit: 1000,
            request_timeout: Duration::from_secs(5),
        };
        AnalysisRequest::new(Arc::new(doc), descriptor, PromptTemplateId::Improve, None)
    }

    fn stub(delay_secs: u64, reply: std::result::Result<LlmResponse, LlmError>) -> StubProvider {
        StubProvider {
            delay: Duration::from_secs(delay_secs),
            reply,
            limit: 1000,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_success_reports_usage() {
        let provider = stub(2, Ok(LlmResponse::new("1. [ ] ISSUE LOW", Some(TokenUsage::new(1000, 200)))));
        let result = provider.submit(&request(), Duration::from_secs(5)).await;
        assert_eq!(result.status(), AnalysisStatus::Success);
        assert_eq!(result.tokens_used(), Some(1200));
        assert!((result.elapsed_seconds() - 2.0).abs() < 0.01);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_times_out() {
        let provider = stub(60, Ok(LlmResponse::new("late", None)));
        let result = provider.submit(&request(), Duration::from_secs(5)).await;
        assert_eq!(result.status(), AnalysisStatus::Timeout);
        assert!(result.raw_response().is_none());
        assert!(result.elapsed_seconds() < 5.5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_classifies_provider_error() {
        let err = LlmError::with_provider(ErrorCategory::RateLimit, "slow down", "stub");
        let result = stub(0, Err(err)).submit(&request(), Duration::from_secs(5)).await;
        assert_eq!(result.status(), AnalysisStatus::ProviderError);
        assert_eq!(result.failure_class(), Some(FailureClass::Transient));
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_empty_response_is_permanent_error() {
        let result = stub(0, Ok(LlmResponse::new("  \n", None)))
            .submit(&request(), Duration::from_secs(5))
            .await;
        assert_eq!(result.status(), AnalysisStatus::ProviderError);
        assert_eq!(result.failure_class(), Some(FailureClass::Permanent));
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_refuses_oversized_document() {
        let mut provider = stub(0, Ok(LlmResponse::new("ok", None)));
        provider.limit = 1;
        let result = provider.submit(&request(), Duration::from_secs(5)).await;
        assert_eq!(result.status(), AnalysisStatus::TokenExceeded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_limit_applies_to_prompt_not_document() {
        let req = request();
        let mut provider = stub(0, Ok(LlmResponse::new("1. [ ] ISSUE LOW", None)));
        provider.limit = req.document().token_count();
        assert!(req.token_count() > provider.limit);

        let result = provider.submit(&req, Duration::from_secs(5)).await;
        assert_eq!(result.status(), AnalysisStatus::TokenExceeded);

        provider.limit = req.token_count();
        let result = provider.submit(&req, Duration::from_secs(5)).await;
        assert_eq!(result.status(), AnalysisStatus::Success);
    }
}
