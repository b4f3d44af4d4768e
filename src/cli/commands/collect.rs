//! Collect Command
//!
//! Writes the collected code document without contacting any provider.
//!
//! Usage:
//!   neurolora collect [PATHS]...

use std::path::PathBuf;

use crate::cli::progress::format_size;
use crate::cli::ui::Output;
use crate::cli::util::{CommandOptions, inputs_or_root};
use crate::pipeline::PipelineExecutor;
use crate::types::Result;

pub fn run(opts: &CommandOptions, inputs: Vec<PathBuf>) -> Result<()> {
    let out = Output::new(opts.quiet);
    let ctx = opts.load_context()?;
    let executor = PipelineExecutor::from_context(ctx);

    let report = executor.collect_only(&inputs_or_root(inputs))?;
    let document = &report.document;

    out.success(&format!(
        "Collected {} files (~{} tokens, {}, {} bytes on disk)",
        document.files().len(),
        document.token_count(),
        format_size(document.char_count()),
        document.total_bytes()
    ));
    for skipped in document.skipped() {
        out.warning(&format!("Skipped {} ({})", skipped.relative_path, skipped.reason));
    }
    for path in &report.artifacts {
        out.artifact(path);
    }
    Ok(())
}
