//! Config Command
//!
//! Usage:
//!   neurolora config show [-f toml|json|yaml]
//!   neurolora config path
//!   neurolora config init [-g] [--force]

use crate::cli::ui::Output;
use crate::cli::util::CommandOptions;
use crate::config::ConfigLoader;
use crate::types::Result;

/// Print the effective configuration (all layers plus CLI overrides)
pub fn show(opts: &CommandOptions, format: &str) -> Result<()> {
    let ctx = opts.load_context()?;
    Output::new(opts.quiet).plain(&ConfigLoader::show_config(&ctx.config, format)?);
    Ok(())
}

pub fn path(opts: &CommandOptions) -> Result<()> {
    let out = Output::new(opts.quiet);
    let root = opts.project_root()?;
    let global = ConfigLoader::global_config_path();
    let project = ConfigLoader::project_config_path(&root);

    out.section("Configuration files");
    match global {
        Some(path) => out.field("Global", exists_label(&path)),
        None => out.field("Global", "(no config directory on this platform)"),
    }
    out.field("Project", exists_label(&project));
    Ok(())
}

pub fn init(opts: &CommandOptions, global: bool, force: bool) -> Result<()> {
    let out = Output::new(opts.quiet);
    if global {
        let path = ConfigLoader::init_global(force)?;
        out.success("Initialized global configuration");
        out.artifact(&path);
    } else {
        let dir = ConfigLoader::init_project(&opts.project_root()?, force)?;
        out.success("Initialized project configuration");
        out.artifact(&dir);
    }
    Ok(())
}

fn exists_label(path: &std::path::Path) -> String {
    if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found)", path.display())
    }
}
