//! Run-scoped context
//!
//! Built once per invocation and passed explicitly to the collector, the
//! provider registry and the executor.

use std::path::{Path, PathBuf};

use crate::config::{Config, ConfigLoader};
use crate::types::{CollectionError, Result};

#[derive(Debug, Clone)]
pub struct RunContext {
    pub project_root: PathBuf,
    pub config: Config,
}

impl RunContext {
    pub fn new(project_root: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            project_root: project_root.into(),
            config,
        }
    }

    /// Resolve configuration for `project_root` through the full loader chain
    pub fn load(project_root: &Path) -> Result<Self> {
        if !project_root.is_dir() {
            return Err(CollectionError::not_found(project_root).into());
        }
        let config = ConfigLoader::load(project_root)?;
        Ok(Self::new(project_root, config))
    }

    /// Artifact destination, resolved against the project root when relative
    pub fn output_dir(&self) -> PathBuf {
        if self.config.output.dir.is_absolute() {
            self.config.output.dir.clone()
        } else {
            self.project_root.join(&self.config.output.dir)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_dir_relative_to_root() {
        let ctx = RunContext::new("/work/project", Config::default());
        assert_eq!(ctx.output_dir(), PathBuf::from("/work/project/.neurolora"));
    }

    #[test]
    fn test_output_dir_absolute_kept() {
        let mut config = Config::default();
        config.output.dir = PathBuf::from("/tmp/artifacts");
        let ctx = RunContext::new("/work/project", config);
        assert_eq!(ctx.output_dir(), PathBuf::from("/tmp/artifacts"));
    }

    #[test]
    fn test_missing_root_rejected() {
        assert!(RunContext::load(Path::new("/definitely/not/here")).is_err());
    }
}
