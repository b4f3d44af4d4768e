//! Init Command
//!
//! Creates `.neurolora/config.toml` and a starter `.neuroloraignore` in the
//! project root.

use crate::cli::ui::Output;
use crate::cli::util::CommandOptions;
use crate::config::ConfigLoader;
use crate::constants::collection;
use crate::types::{NeuroError, Result};

pub fn run(opts: &CommandOptions, force: bool) -> Result<()> {
    let out = Output::new(opts.quiet);
    let root = opts.project_root()?;

    if ConfigLoader::is_project_initialized(&root) && !force {
        return Err(NeuroError::Config(
            "Already initialized. Use --force to overwrite.".to_string(),
        ));
    }

    let dir = ConfigLoader::init_project(&root, force)?;

    out.success(&format!("Initialized neurolora in {}", dir.display()));
    out.field("Ignore file", root.join(collection::IGNORE_FILE_NAME).display());
    out.info("Next: run 'neurolora improve <paths>' to analyze code");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn opts(dir: &TempDir) -> CommandOptions {
        CommandOptions {
            project: Some(dir.path().to_path_buf()),
            quiet: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_init_creates_files_and_refuses_twice() {
        let dir = TempDir::new().unwrap();
        run(&opts(&dir), false).unwrap();

        assert!(ConfigLoader::project_config_path(dir.path()).exists());
        assert!(dir.path().join(collection::IGNORE_FILE_NAME).exists());

        let again = run(&opts(&dir), false);
        assert!(matches!(again, Err(NeuroError::Config(_))));
        assert!(run(&opts(&dir), true).is_ok());
    }
}
