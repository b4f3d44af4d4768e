//! Report Command
//!
//! Writes the project structure report (file tree with size, line and token
//! metrics) without contacting any provider.
//!
//! Usage:
//!   neurolora report [PATH]
//!   neurolora showtree

use std::path::PathBuf;

use crate::cli::ui::Output;
use crate::cli::util::CommandOptions;
use crate::collector::{StructureReporter, format_bytes};
use crate::storage::FsResultWriter;
use crate::types::Result;

pub fn run(opts: &CommandOptions, path: Option<PathBuf>, format: &str) -> Result<PathBuf> {
    let out = Output::new(opts.quiet);
    let ctx = opts.load_context()?;
    let start = path.unwrap_or_else(|| PathBuf::from("."));

    let report = StructureReporter::from_context(&ctx)?.analyze(&start)?;
    let written = FsResultWriter::new(ctx.output_dir()).write_tree_report(&report)?;

    if format == "json" {
        out.plain(&serde_json::to_string_pretty(&report)?);
        return Ok(written);
    }

    out.success(&format!("Reported {} files", report.files.len()));
    out.field("Size", format_bytes(report.total_bytes()));
    out.field("Lines", report.total_lines());
    out.field("Tokens", format!("~{}", report.total_tokens()));
    out.field("Large", report.large_files());
    for file in report.complex_files() {
        out.warning(&format!(
            "{} has {} lines, consider {} modules",
            file.path,
            file.lines,
            file.suggested_modules()
        ));
    }
    out.artifact(&written);
    Ok(written)
}
