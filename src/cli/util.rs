//! CLI Common Utilities
//!
//! Global flags shared by every command and the run context they resolve to.

use std::path::PathBuf;

use tracing::debug;

use crate::context::RunContext;
use crate::types::Result;

/// Flags accepted before any subcommand
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Project root; defaults to the current directory
    pub project: Option<PathBuf>,
    /// Model override (beats config, env and `AI_MODEL`)
    pub model: Option<String>,
    /// Request timeout override in seconds
    pub timeout_secs: Option<u64>,
    pub quiet: bool,
}

impl CommandOptions {
    pub fn project_root(&self) -> Result<PathBuf> {
        match &self.project {
            Some(path) => Ok(path.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }

    /// Load layered configuration and apply the CLI overrides on top
    pub fn load_context(&self) -> Result<RunContext> {
        let root = self.project_root()?;
        let mut ctx = RunContext::load(&root)?;

        if let Some(model) = &self.model {
            debug!("Model overridden on the command line: {}", model);
            ctx.config.llm.model = model.clone();
        }
        if let Some(secs) = self.timeout_secs {
            ctx.config.llm.timeout_secs = secs;
        }
        ctx.config.validate()?;
        Ok(ctx)
    }
}

/// Inputs to collect; the project root itself when none were given
pub fn inputs_or_root(inputs: Vec<PathBuf>) -> Vec<PathBuf> {
    if inputs.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        inputs
    }
}
