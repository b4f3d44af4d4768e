//! Normalized analysis outcome
//!
//! Exactly one status holds, and `raw_response` is present iff the status is
//! `Success`. Fields are private so those invariants cannot be broken after
//! construction.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::ai::prompt::{PromptTemplateId, normalize_response};
use crate::types::{FailureClass, LlmError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Success,
    Timeout,
    ProviderError,
    TokenExceeded,
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Timeout => write!(f, "timeout"),
            Self::ProviderError => write!(f, "provider_error"),
            Self::TokenExceeded => write!(f, "token_exceeded"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    status: AnalysisStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_response: Option<String>,
    elapsed_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    tokens_used: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure_class: Option<FailureClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl AnalysisResult {
    pub fn success(raw_response: String, elapsed: Duration, tokens_used: Option<u32>) -> Self {
        Self {
            status: AnalysisStatus::Success,
            raw_response: Some(raw_response),
            elapsed_seconds: elapsed.as_secs_f64(),
            tokens_used,
            failure_class: None,
            detail: None,
        }
    }

    pub fn timeout(elapsed: Duration) -> Self {
        Self {
            status: AnalysisStatus::Timeout,
            raw_response: None,
            elapsed_seconds: elapsed.as_secs_f64(),
            tokens_used: None,
            failure_class: Some(FailureClass::Transient),
            detail: Some(format!(
                "No response after {:.1}s",
                elapsed.as_secs_f64()
            )),
        }
    }

    pub fn provider_error(err: &LlmError, elapsed: Duration) -> Self {
        Self {
            status: AnalysisStatus::ProviderError,
            raw_response: None,
            elapsed_seconds: elapsed.as_secs_f64(),
            tokens_used: None,
            failure_class: Some(err.failure_class()),
            detail: Some(err.to_string()),
        }
    }

    pub fn token_exceeded(actual: usize, limit: usize) -> Self {
        Self {
            status: AnalysisStatus::TokenExceeded,
            raw_response: None,
            elapsed_seconds: 0.0,
            tokens_used: None,
            failure_class: Some(FailureClass::Permanent),
            detail: Some(format!("{} tokens exceeds limit of {}", actual, limit)),
        }
    }

    pub fn status(&self) -> AnalysisStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == AnalysisStatus::Success
    }

    pub fn raw_response(&self) -> Option<&str> {
        self.raw_response.as_deref()
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    pub fn tokens_used(&self) -> Option<u32> {
        self.tokens_used
    }

    pub fn failure_class(&self) -> Option<FailureClass> {
        self.failure_class
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Apply template-specific normalization to a successful response
    pub fn normalized(mut self, template: PromptTemplateId) -> Self {
        if let Some(raw) = self.raw_response.take() {
            self.raw_response = Some(normalize_response(template, &raw));
        }
        self
    }
}
