//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//!
//! ## Error Families
//!
//! - **Collection**: missing paths, unreadable files, empty selections
//! - **Selection**: unknown model names
//! - **Validation**: documents that exceed a model's token limit
//! - **Provider**: classified backend failures (transient or permanent)
//! - **Timeout**: an operation that did not finish in time
//!
//! Collection, selection and validation errors are deterministic for the same
//! inputs and are reported to the caller immediately. Provider failures carry
//! a category so the caller can decide whether a retry makes sense; nothing in
//! this crate retries on its own.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Fine-grained provider failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate limited by the backend
    RateLimit,
    /// Context/token limit exceeded on the backend side
    TokenLimit,
    /// Authentication failed (bad or missing credentials)
    Auth,
    /// Network/connectivity issues
    Network,
    /// Provider unavailable (5xx, model not found)
    Unavailable,
    /// Invalid request
    BadRequest,
    /// Response could not be parsed
    ParseError,
    /// Temporary server issues
    Transient,
    /// Unknown error
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::TokenLimit => write!(f, "TOKEN_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::ParseError => write!(f, "PARSE_ERROR"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Coarse failure class surfaced across the provider contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureClass {
    /// May succeed if the caller tries again later
    Transient,
    /// Will fail again with the same request and credentials
    Permanent,
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transient => write!(f, "transient"),
            Self::Permanent => write!(f, "permanent"),
        }
    }
}

impl ErrorCategory {
    /// Map this category onto the two-class vocabulary of the provider contract
    pub fn failure_class(&self) -> FailureClass {
        match self {
            Self::RateLimit | Self::Network | Self::Unavailable | Self::Transient => {
                FailureClass::Transient
            }
            Self::TokenLimit
            | Self::Auth
            | Self::BadRequest
            | Self::ParseError
            | Self::Unknown => FailureClass::Permanent,
        }
    }

    /// Suggested wait before a caller-level retry
    pub fn recommended_delay(&self) -> Duration {
        match self {
            Self::RateLimit => Duration::from_secs(30),
            Self::Network | Self::Unavailable => Duration::from_secs(5),
            Self::Transient => Duration::from_secs(2),
            _ => Duration::from_millis(500),
        }
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// Classified provider error with category, context, and retry hints
#[derive(Debug, Clone)]
pub struct LlmError {
    /// Error category for routing decisions
    pub category: ErrorCategory,
    /// Detailed error message
    pub message: String,
    /// Provider that produced the error
    pub provider: Option<String>,
    /// Suggested wait time before retry (if the backend reported one)
    pub retry_after: Option<Duration>,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{}:{}] {}", provider, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            provider: None,
            retry_after: None,
        }
    }

    pub fn with_provider(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            provider: Some(provider.into()),
            retry_after: None,
        }
    }

    /// Add suggested retry delay
    pub fn retry_after(mut self, duration: Duration) -> Self {
        self.retry_after = Some(duration);
        self
    }

    pub fn failure_class(&self) -> FailureClass {
        self.category.failure_class()
    }

    pub fn is_transient(&self) -> bool {
        self.failure_class() == FailureClass::Transient
    }

    /// Get recommended retry delay
    pub fn recommended_delay(&self) -> Duration {
        self.retry_after
            .unwrap_or_else(|| self.category.recommended_delay())
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Turns raw backend failures into classified `LlmError`s
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an error message from any provider
    pub fn classify(message: &str, provider: &str) -> LlmError {
        let lower = message.to_lowercase();

        if lower.contains("rate limit")
            || lower.contains("429")
            || lower.contains("too many requests")
            || lower.contains("quota exceeded")
            || lower.contains("resource_exhausted")
        {
            return LlmError::with_provider(ErrorCategory::RateLimit, message, provider)
                .retry_after(Duration::from_secs(30));
        }

        if lower.contains("token")
            && (lower.contains("limit") || lower.contains("exceed") || lower.contains("maximum"))
            || lower.contains("context length")
            || lower.contains("context too long")
            || lower.contains("too large")
        {
            return LlmError::with_provider(ErrorCategory::TokenLimit, message, provider);
        }

        if lower.contains("auth")
            || lower.contains("401")
            || lower.contains("403")
            || lower.contains("api key")
            || lower.contains("invalid key")
            || lower.contains("unauthorized")
            || lower.contains("permission denied")
        {
            return LlmError::with_provider(ErrorCategory::Auth, message, provider);
        }

        if lower.contains("network")
            || lower.contains("connection")
            || lower.contains("dns")
            || lower.contains("timed out")
            || lower.contains("unreachable")
        {
            return LlmError::with_provider(ErrorCategory::Network, message, provider)
                .retry_after(Duration::from_secs(5));
        }

        if lower.contains("503")
            || lower.contains("502")
            || lower.contains("service unavailable")
            || lower.contains("server error")
            || lower.contains("500")
            || lower.contains("internal error")
            || lower.contains("not found")
        {
            return LlmError::with_provider(ErrorCategory::Unavailable, message, provider);
        }

        if lower.contains("400")
            || lower.contains("bad request")
            || lower.contains("invalid")
            || lower.contains("malformed")
        {
            return LlmError::with_provider(ErrorCategory::BadRequest, message, provider);
        }

        if lower.contains("parse")
            || lower.contains("json")
            || lower.contains("syntax")
            || lower.contains("unexpected token")
        {
            return LlmError::with_provider(ErrorCategory::ParseError, message, provider);
        }

        if lower.contains("retry") || lower.contains("temporary") || lower.contains("overloaded")
        {
            return LlmError::with_provider(ErrorCategory::Transient, message, provider)
                .retry_after(Duration::from_secs(2));
        }

        LlmError::with_provider(ErrorCategory::Unknown, message, provider)
    }

    /// Classify HTTP status code directly (more accurate than string matching)
    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> LlmError {
        match status {
            429 => LlmError::with_provider(ErrorCategory::RateLimit, message, provider)
                .retry_after(Duration::from_secs(30)),
            401 | 403 => LlmError::with_provider(ErrorCategory::Auth, message, provider),
            400 | 422 => {
                // Context overflows come back as 400 from most backends
                let classified = Self::classify(message, provider);
                if classified.category == ErrorCategory::TokenLimit {
                    classified
                } else {
                    LlmError::with_provider(ErrorCategory::BadRequest, message, provider)
                }
            }
            413 => LlmError::with_provider(ErrorCategory::TokenLimit, message, provider),
            404 => LlmError::with_provider(ErrorCategory::Unavailable, message, provider),
            408 | 500 | 502 | 503 | 504 | 529 => {
                LlmError::with_provider(ErrorCategory::Transient, message, provider)
                    .retry_after(Duration::from_secs(5))
            }
            _ => LlmError::with_provider(ErrorCategory::Unknown, message, provider),
        }
    }

    /// Classify a transport-level failure from the HTTP client
    pub fn classify_transport(err: &reqwest::Error, provider: &str) -> LlmError {
        let message = err.to_string();
        if err.is_connect() || err.is_timeout() {
            LlmError::with_provider(ErrorCategory::Network, message, provider)
                .retry_after(Duration::from_secs(5))
        } else if err.is_decode() {
            LlmError::with_provider(ErrorCategory::ParseError, message, provider)
        } else if err.is_builder() || err.is_request() {
            LlmError::with_provider(ErrorCategory::BadRequest, message, provider)
        } else {
            Self::classify(&message, provider)
        }
    }
}

// =============================================================================
// Collection Error
// =============================================================================

/// Why a collection pass failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionErrorKind {
    /// An input path does not exist
    NotFound,
    /// An input path or a retained file could not be read
    PermissionDenied,
    /// Every candidate file was filtered out
    EmptySelection,
}

impl std::fmt::Display for CollectionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "path not found"),
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::EmptySelection => write!(f, "no files left after filtering"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollectionError {
    pub kind: CollectionErrorKind,
    pub path: Option<PathBuf>,
}

impl CollectionError {
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: CollectionErrorKind::NotFound,
            path: Some(path.into()),
        }
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: CollectionErrorKind::PermissionDenied,
            path: Some(path.into()),
        }
    }

    pub fn empty_selection() -> Self {
        Self {
            kind: CollectionErrorKind::EmptySelection,
            path: None,
        }
    }
}

impl std::fmt::Display for CollectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}: {}", self.kind, path.display()),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for CollectionError {}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum NeuroError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Config error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Pipeline Errors
    // -------------------------------------------------------------------------
    #[error("Collection failed: {0}")]
    Collection(CollectionError),

    #[error("Unknown model '{model}'. Supported models: {}", known.join(", "))]
    UnknownModel { model: String, known: Vec<String> },

    #[error(
        "Content size ({actual} tokens) exceeds model {model} token limit ({limit}). \
         Select fewer files or use a model with a larger context window"
    )]
    TokenExceeded {
        actual: usize,
        limit: usize,
        model: String,
    },

    /// Classified provider failure
    #[error("LLM error: {0}")]
    Llm(LlmError),

    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<LlmError> for NeuroError {
    fn from(err: LlmError) -> Self {
        NeuroError::Llm(err)
    }
}

impl From<CollectionError> for NeuroError {
    fn from(err: CollectionError) -> Self {
        NeuroError::Collection(err)
    }
}

pub type Result<T> = std::result::Result<T, NeuroError>;

impl NeuroError {
    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Errors that will recur unchanged for the same inputs
    pub fn is_deterministic(&self) -> bool {
        matches!(
            self,
            Self::Collection(_) | Self::UnknownModel { .. } | Self::TokenExceeded { .. }
        )
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::RateLimit.to_string(), "RATE_LIMIT");
        assert_eq!(ErrorCategory::TokenLimit.to_string(), "TOKEN_LIMIT");
        assert_eq!(ErrorCategory::Auth.to_string(), "AUTH");
    }

    #[test]
    fn test_failure_class_mapping() {
        assert_eq!(
            ErrorCategory::RateLimit.failure_class(),
            FailureClass::Transient
        );
        assert_eq!(
            ErrorCategory::Network.failure_class(),
            FailureClass::Transient
        );
        assert_eq!(ErrorCategory::Auth.failure_class(), FailureClass::Permanent);
        assert_eq!(
            ErrorCategory::BadRequest.failure_class(),
            FailureClass::Permanent
        );
    }

    #[test]
    fn test_classify_rate_limit() {
        let err = ErrorClassifier::classify("Rate limit exceeded, please retry", "openai");
        assert_eq!(err.category, ErrorCategory::RateLimit);
        assert!(err.is_transient());
    }

    #[test]
    fn test_classify_token_limit() {
        let err = ErrorClassifier::classify("Token limit exceeded: 150000 > 128000", "anthropic");
        assert_eq!(err.category, ErrorCategory::TokenLimit);
        assert!(!err.is_transient());
    }

    #[test]
    fn test_classify_auth() {
        let err = ErrorClassifier::classify("Invalid API key provided", "openai");
        assert_eq!(err.category, ErrorCategory::Auth);
        assert_eq!(err.failure_class(), FailureClass::Permanent);
    }

    #[test]
    fn test_classify_unknown() {
        let err = ErrorClassifier::classify("Something weird happened", "test");
        assert_eq!(err.category, ErrorCategory::Unknown);
    }

    #[test]
    fn test_classify_http_status() {
        let rate_limit = ErrorClassifier::classify_http_status(429, "Rate limited", "test");
        assert_eq!(rate_limit.category, ErrorCategory::RateLimit);

        let auth = ErrorClassifier::classify_http_status(401, "Unauthorized", "test");
        assert_eq!(auth.category, ErrorCategory::Auth);

        let server_error = ErrorClassifier::classify_http_status(500, "Server error", "test");
        assert_eq!(server_error.category, ErrorCategory::Transient);

        let overflow = ErrorClassifier::classify_http_status(
            400,
            "This model's maximum context length is 128000 tokens",
            "openai",
        );
        assert_eq!(overflow.category, ErrorCategory::TokenLimit);

        let bad = ErrorClassifier::classify_http_status(400, "missing field", "openai");
        assert_eq!(bad.category, ErrorCategory::BadRequest);
    }

    #[test]
    fn test_recommended_delay() {
        let rate_limit = LlmError::new(ErrorCategory::RateLimit, "test");
        assert!(rate_limit.recommended_delay() >= Duration::from_secs(30));

        let custom =
            LlmError::new(ErrorCategory::Unknown, "test").retry_after(Duration::from_secs(100));
        assert_eq!(custom.recommended_delay(), Duration::from_secs(100));
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::with_provider(ErrorCategory::RateLimit, "Too many requests", "openai");
        assert_eq!(err.to_string(), "[openai:RATE_LIMIT] Too many requests");

        let err_no_provider = LlmError::new(ErrorCategory::Network, "Connection failed");
        assert_eq!(err_no_provider.to_string(), "[NETWORK] Connection failed");
    }

    #[test]
    fn test_token_exceeded_message_carries_both_numbers() {
        let err = NeuroError::TokenExceeded {
            actual: 500_000,
            limit: 128_000,
            model: "o1-preview".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("500000"));
        assert!(msg.contains("128000"));
        assert!(err.is_deterministic());
    }

    #[test]
    fn test_collection_error_display() {
        let err = CollectionError::not_found("src/missing.rs");
        assert_eq!(err.to_string(), "path not found: src/missing.rs");
        assert_eq!(
            CollectionError::empty_selection().to_string(),
            "no files left after filtering"
        );
    }
}
