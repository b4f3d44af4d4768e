//! Models Command
//!
//! Lists the models the registry can dispatch to.

use crate::ai::ProviderRegistry;
use crate::cli::ui::Output;
use crate::cli::util::CommandOptions;
use crate::types::Result;

pub fn run(opts: &CommandOptions, format: &str) -> Result<()> {
    let out = Output::new(opts.quiet);
    let ctx = opts.load_context()?;
    let registry = ProviderRegistry::builtin(ctx.config.llm.timeout());
    let models = registry.models();

    if format == "json" {
        out.plain(&serde_json::to_string_pretty(&models)?);
        return Ok(());
    }

    out.section("Available models");
    for model in &models {
        let marker = if model.name == ctx.config.llm.model { "*" } else { " " };
        out.plain(&format!(
            "{} {:<36} {:<10} {:>9} tokens",
            marker, model.name, model.family.name(), model.token_limit
        ));
    }
    out.info(&format!("Current model: {}", ctx.config.llm.model));
    Ok(())
}
