//! Model Table and Backend Routing
//!
//! Routing is two static lookups: model name → [`BackendFamily`] (plus token
//! limit), then family → factory. Adding a model is one table entry; adding a
//! backend is one [`ProviderRegistry::register_backend`] call.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    AnthropicProvider, ErrorCategory, GeminiProvider, LlmError, LlmProvider, OllamaProvider,
    OpenAiProvider, SharedProvider,
};
use crate::ai::prompt::AnalysisRequest;
use crate::config::LlmConfig;
use crate::types::{NeuroError, Result};

// =============================================================================
// Backend Families
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendFamily {
    OpenAi,
    Anthropic,
    Gemini,
    Ollama,
}

impl BackendFamily {
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
        }
    }
}

impl fmt::Display for BackendFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Built-in models: (name, backend, input token limit)
pub const BUILTIN_MODELS: &[(&str, BackendFamily, usize)] = &[
    ("o1", BackendFamily::OpenAi, 200_000),
    ("o1-preview", BackendFamily::OpenAi, 128_000),
    ("o1-preview-2024-09-12", BackendFamily::OpenAi, 128_000),
    ("gpt-4o", BackendFamily::OpenAi, 128_000),
    ("gemini-2.0-flash-exp", BackendFamily::Gemini, 1_048_576),
    ("gemini-2.0-flash-thinking-exp-1219", BackendFamily::Gemini, 32_767),
    ("claude-3-opus-20240229", BackendFamily::Anthropic, 200_000),
    ("claude-3-sonnet-20240229", BackendFamily::Anthropic, 200_000),
    ("claude-3-haiku-20240307", BackendFamily::Anthropic, 200_000),
    ("llama3", BackendFamily::Ollama, 8_192),
];

// =============================================================================
// Descriptors
// =============================================================================

/// Static description of the model a run talks to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    pub provider_name: String,
    pub model_name: String,
    pub token_limit: usize,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub family: BackendFamily,
    pub token_limit: usize,
}

/// Builds a live provider for a descriptor
pub type ProviderFactory = Arc<
    dyn Fn(&ProviderDescriptor, &LlmConfig) -> std::result::Result<SharedProvider, LlmError>
        + Send
        + Sync,
>;

/// Wrap a concrete constructor as a [`ProviderFactory`]
pub fn factory<P, F>(build: F) -> ProviderFactory
where
    P: LlmProvider + 'static,
    F: Fn(&ProviderDescriptor, &LlmConfig) -> std::result::Result<P, LlmError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(
        move |descriptor: &ProviderDescriptor,
              config: &LlmConfig|
              -> std::result::Result<SharedProvider, LlmError> {
            Ok(Arc::new(build(descriptor, config)?))
        },
    )
}

// =============================================================================
// Registry
// =============================================================================

/// Read-only after construction; one per run
#[derive(Clone)]
pub struct ProviderRegistry {
    models: HashMap<String, ModelInfo>,
    backends: HashMap<BackendFamily, ProviderFactory>,
    request_timeout: Duration,
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut backends: Vec<_> = self.backends.keys().map(BackendFamily::name).collect();
        backends.sort_unstable();
        f.debug_struct("ProviderRegistry")
            .field("models", &self.models.len())
            .field("backends", &backends)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl ProviderRegistry {
    /// Empty registry: no models, no backends
    pub fn empty(request_timeout: Duration) -> Self {
        Self {
            models: HashMap::new(),
            backends: HashMap::new(),
            request_timeout,
        }
    }

    /// Built-in model table with the four HTTP backends
    pub fn builtin(request_timeout: Duration) -> Self {
        let mut registry = Self::empty(request_timeout);
        for (name, family, limit) in BUILTIN_MODELS {
            registry.register_model(*name, *family, *limit);
        }

        registry.register_backend(BackendFamily::OpenAi, factory(OpenAiProvider::new));
        registry.register_backend(BackendFamily::Anthropic, factory(AnthropicProvider::new));
        registry.register_backend(BackendFamily::Gemini, factory(GeminiProvider::new));
        registry.register_backend(BackendFamily::Ollama, factory(OllamaProvider::new));
        registry
    }

    /// Add or replace a model entry
    pub fn register_model(&mut self, name: impl Into<String>, family: BackendFamily, token_limit: usize) {
        let name = name.into();
        self.models.insert(
            name.clone(),
            ModelInfo {
                name,
                family,
                token_limit,
            },
        );
    }

    /// Add or replace the factory for a backend family
    pub fn register_backend(&mut self, family: BackendFamily, factory: ProviderFactory) {
        self.backends.insert(family, factory);
    }

    /// Resolve a model name
    ///
    /// No I/O happens here, so an unknown model fails before any collection.
    pub fn select(&self, model: &str) -> Result<ProviderDescriptor> {
        let info = self.models.get(model).ok_or_else(|| NeuroError::UnknownModel {
            model: model.to_string(),
            known: self.models().into_iter().map(|m| m.name).collect(),
        })?;

        debug!(
            "Selected model {} ({}, limit {} tokens)",
            info.name, info.family, info.token_limit
        );
        Ok(ProviderDescriptor {
            provider_name: info.family.name().to_string(),
            model_name: info.name.clone(),
            token_limit: info.token_limit,
            request_timeout: self.request_timeout,
        })
    }

    /// Pre-dispatch size check on the full prompt; `token_count == token_limit` passes
    pub fn validate(&self, request: &AnalysisRequest) -> Result<()> {
        check_token_limit(request.token_count(), request.descriptor())
    }

    /// Instantiate the backend for a selected descriptor
    pub fn create(
        &self,
        descriptor: &ProviderDescriptor,
        config: &LlmConfig,
    ) -> std::result::Result<SharedProvider, LlmError> {
        let family = self
            .models
            .get(&descriptor.model_name)
            .map(|info| info.family)
            .ok_or_else(|| {
                LlmError::with_provider(
                    ErrorCategory::BadRequest,
                    format!("Model {} is not registered", descriptor.model_name),
                    descriptor.provider_name.clone(),
                )
            })?;

        let factory = self.backends.get(&family).ok_or_else(|| {
            LlmError::with_provider(
                ErrorCategory::Unavailable,
                format!("No backend registered for {}", family),
                family.name(),
            )
        })?;
        factory(descriptor, config)
    }

    /// All registered models, sorted by name
    pub fn models(&self) -> Vec<ModelInfo> {
        let mut models: Vec<_> = self.models.values().cloned().collect();
        models.sort_by(|a, b| a.name.cmp(&b.name));
        models
    }
}

fn check_token_limit(token_count: usize, descriptor: &ProviderDescriptor) -> Result<()> {
    if token_count > descriptor.token_limit {
        return Err(NeuroError::TokenExceeded {
            actual: token_count,
            limit: descriptor.token_limit,
            model: descriptor.model_name.clone(),
        });
    }
    Ok(())
}
