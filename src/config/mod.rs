//! Configuration Management
//!
//! Hierarchical resolution:
//! 1. Built-in defaults
//! 2. Global config (platform config dir)
//! 3. Project config (.neurolora/config.toml)
//! 4. Environment variables (NEUROLORA_*, plus legacy AI_MODEL)
//! 5. CLI arguments (highest priority, applied by the command layer)

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::*;
