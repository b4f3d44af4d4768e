//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (platform config dir, e.g. ~/.config/neurolora/config.toml)
//! 3. Project config (<project>/.neurolora/config.toml)
//! 4. Environment variables (NEUROLORA_* prefix, `__` separates sections)
//! 5. Legacy `AI_MODEL` variable (highest priority for the model name)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::constants::collection;
use crate::types::{NeuroError, Result};

const CONFIG_FILE_NAME: &str = "config.toml";
const ENV_PREFIX: &str = "NEUROLORA_";
const LEGACY_MODEL_VAR: &str = "AI_MODEL";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a project rooted at `project_root`:
    /// defaults → global → project → env vars
    pub fn load(project_root: &Path) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path(project_root);
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        Self::finish(figment)
    }

    /// Load configuration from a specific file, still honoring env overrides
    pub fn load_from_file(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(NeuroError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path));
        Self::finish(figment)
    }

    fn finish(figment: Figment) -> Result<Config> {
        // NEUROLORA_LLM__TIMEOUT_SECS -> llm.timeout_secs
        let mut figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__").lowercase(true));

        if let Ok(model) = std::env::var(LEGACY_MODEL_VAR)
            && !model.trim().is_empty()
        {
            debug!("Model overridden by {}: {}", LEGACY_MODEL_VAR, model);
            figment = figment.merge(Serialized::default("llm.model", model.trim()));
        }

        let config: Config = figment
            .extract()
            .map_err(|e| NeuroError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Platform-specific global config directory
    pub fn global_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "neurolora").map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
    }

    pub fn project_dir(project_root: &Path) -> PathBuf {
        project_root.join(collection::OUTPUT_DIR_NAME)
    }

    pub fn project_config_path(project_root: &Path) -> PathBuf {
        Self::project_dir(project_root).join(CONFIG_FILE_NAME)
    }

    /// Render the effective configuration as `toml` (default), `json` or `yaml`
    pub fn show_config(config: &Config, format: &str) -> Result<String> {
        match format {
            "json" => Ok(serde_json::to_string_pretty(config)?),
            "yaml" => Ok(serde_yaml::to_string(config)?),
            _ => toml::to_string_pretty(config).map_err(|e| NeuroError::Config(e.to_string())),
        }
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Write the default global config file
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            NeuroError::Config("Cannot determine global config directory".to_string())
        })?;
        fs::create_dir_all(&global_dir)?;

        let config_path = global_dir.join(CONFIG_FILE_NAME);
        Self::write_default(&config_path, Self::default_global_config(), force)?;
        Ok(config_path)
    }

    /// Create `.neurolora/` with a config file and an empty ignore file
    pub fn init_project(project_root: &Path, force: bool) -> Result<PathBuf> {
        let project_dir = Self::project_dir(project_root);
        fs::create_dir_all(&project_dir)?;

        let config_path = project_dir.join(CONFIG_FILE_NAME);
        Self::write_default(&config_path, Self::default_project_config(), force)?;

        let ignore_path = project_root.join(collection::IGNORE_FILE_NAME);
        if !ignore_path.exists() {
            fs::write(&ignore_path, Self::default_ignore_file())?;
            info!("Created ignore file: {}", ignore_path.display());
        }

        Ok(project_dir)
    }

    pub fn is_project_initialized(project_root: &Path) -> bool {
        Self::project_config_path(project_root).exists()
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn write_default(path: &Path, content: &str, force: bool) -> Result<()> {
        if !path.exists() || force {
            fs::write(path, content)?;
            info!("Created config: {}", path.display());
        } else {
            info!("Config exists: {}", path.display());
        }
        Ok(())
    }

    fn default_global_config() -> &'static str {
        r#"# Neurolora Global Configuration
# User-wide defaults. Project settings in .neurolora/config.toml override these.

version = "1.0"

[llm]
model = "o1-preview-2024-09-12"
timeout_secs = 300

# Keys may also come from OPENAI_API_KEY, ANTHROPIC_API_KEY, GEMINI_API_KEY.
# [llm.api_keys]
# openai = "sk-..."
"#
    }

    fn default_project_config() -> &'static str {
        r#"# Neurolora Project Configuration
# Project-specific settings that override global defaults.

version = "1.0"

[collection]
ignore_file = ".neuroloraignore"
extra_ignore = []
max_file_size = 1048576

[output]
dir = ".neurolora"
"#
    }

    fn default_ignore_file() -> &'static str {
        "# Patterns listed here are excluded from code collection.\n\
         # Syntax follows .gitignore; later lines override earlier ones.\n\
         \n\
         *.log\n\
         *.lock\n\
         coverage/\n"
    }
}
