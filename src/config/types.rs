//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/neurolora/) and project (.neurolora/) level configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{collection, network, progress};
use crate::types::{NeuroError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// File collection settings
    pub collection: CollectionConfig,

    /// LLM provider settings
    pub llm: LlmConfig,

    /// Progress estimation curve
    pub progress: ProgressConfig,

    /// Artifact output settings
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            collection: CollectionConfig::default(),
            llm: LlmConfig::default(),
            progress: ProgressConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<()> {
        if self.llm.timeout_secs == 0 {
            return Err(NeuroError::Config(
                "llm.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if let Some(temperature) = self.llm.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(NeuroError::Config(format!(
                "llm.temperature must be between 0.0 and 2.0, got {}",
                temperature
            )));
        }

        if self.collection.max_file_size == 0 {
            return Err(NeuroError::Config(
                "collection.max_file_size must be greater than 0".to_string(),
            ));
        }

        self.progress.validate()
    }
}

// =============================================================================
// Collection Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Project ignore-rule file, relative to the project root
    pub ignore_file: PathBuf,

    /// Additional ignore patterns appended after the project file
    pub extra_ignore: Vec<String>,

    /// Maximum file size in bytes; larger files are skipped
    pub max_file_size: u64,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            ignore_file: PathBuf::from(collection::IGNORE_FILE_NAME),
            extra_ignore: Vec::new(),
            max_file_size: collection::MAX_FILE_SIZE,
        }
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model name, resolved through the provider registry
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Sampling temperature; left unset for models that reject it
    pub temperature: Option<f32>,

    /// Cap on generated tokens for backends that require one
    pub max_output_tokens: usize,

    /// API keys (never serialized; env vars are used when absent)
    #[serde(default, skip_serializing)]
    pub api_keys: ApiKeys,

    /// Endpoint overrides for custom or proxied deployments
    pub api_base: ApiBases,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "o1-preview-2024-09-12".to_string(),
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            temperature: None,
            max_output_tokens: network::DEFAULT_MAX_OUTPUT_TOKENS,
            api_keys: ApiKeys::default(),
            api_base: ApiBases::default(),
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub openai: Option<String>,
    pub anthropic: Option<String>,
    pub gemini: Option<String>,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("ApiKeys")
            .field("openai", &redact(&self.openai))
            .field("anthropic", &redact(&self.anthropic))
            .field("gemini", &redact(&self.gemini))
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiBases {
    pub openai: Option<String>,
    pub anthropic: Option<String>,
    pub gemini: Option<String>,
    pub ollama: Option<String>,
}

// =============================================================================
// Progress Configuration
// =============================================================================

/// Tunable parameters of the ETA curve
///
/// The estimated duration grows with the natural log of content size:
/// `base_secs + scale_secs * ln(1 + chars / chars_per_unit)`.
/// Reported progress is linear up to `linear_until` of that estimate, then
/// bends toward `ceiling` without ever reaching it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    pub tick_ms: u64,
    pub base_secs: f64,
    pub scale_secs: f64,
    pub chars_per_unit: f64,
    pub linear_until: f64,
    pub ceiling: f64,
    pub acceleration: f64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            tick_ms: progress::TICK_MS,
            base_secs: progress::BASE_SECS,
            scale_secs: progress::SCALE_SECS,
            chars_per_unit: progress::CHARS_PER_UNIT,
            linear_until: progress::LINEAR_UNTIL,
            ceiling: progress::CEILING,
            acceleration: progress::ACCELERATION,
        }
    }
}

impl ProgressConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_ms == 0 {
            return Err(NeuroError::Config(
                "progress.tick_ms must be greater than 0".to_string(),
            ));
        }
        if self.base_secs <= 0.0 || self.scale_secs < 0.0 || self.chars_per_unit <= 0.0 {
            return Err(NeuroError::Config(
                "progress.base_secs and progress.chars_per_unit must be positive".to_string(),
            ));
        }
        if !(0.0 < self.linear_until && self.linear_until < self.ceiling && self.ceiling < 1.0) {
            return Err(NeuroError::Config(format!(
                "progress curve requires 0 < linear_until < ceiling < 1, got {} / {}",
                self.linear_until, self.ceiling
            )));
        }
        if self.acceleration <= 0.0 {
            return Err(NeuroError::Config(
                "progress.acceleration must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Output Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Artifact destination root (relative paths resolve against the project root)
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(collection::OUTPUT_DIR_NAME),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.llm.model, "o1-preview-2024-09-12");
        assert_eq!(config.llm.timeout(), Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.llm.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(NeuroError::Config(_))));
    }

    #[test]
    fn test_invalid_curve_rejected() {
        let mut config = Config::default();
        config.progress.ceiling = 1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.progress.linear_until = 0.995;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_keys_redacted_and_not_serialized() {
        let mut config = LlmConfig::default();
        config.api_keys.openai = Some("sk-secret".to_string());

        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
    }
}
