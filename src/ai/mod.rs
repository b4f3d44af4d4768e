//! AI Integration Layer
//!
//! Prompt assembly, token estimation, and the provider contract that turns a
//! collected document into an [`AnalysisResult`].

pub mod prompt;
pub mod provider;
pub mod result;
pub mod timeout;
pub mod tokenizer;

pub use prompt::{AnalysisRequest, ISSUE_MARKER, PromptTemplateId, normalize_response};
pub use provider::{
    BackendFamily, ErrorCategory, ErrorClassifier, LlmError, LlmProvider, LlmResponse, ModelInfo,
    ProviderDescriptor, ProviderFactory, ProviderRegistry, SharedProvider, TokenUsage,
};
pub use result::{AnalysisResult, AnalysisStatus};
pub use timeout::{with_timeout, with_timeout_map};
pub use tokenizer::TokenEstimator;
