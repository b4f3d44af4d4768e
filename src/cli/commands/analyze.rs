//! Analyze Commands
//!
//! `improve` and `request` share one flow: collect, validate, dispatch to the
//! selected model and persist every artifact the run produced.
//!
//! Usage:
//!   neurolora improve [PATHS]...
//!   neurolora request <TEXT> [PATHS]...

use std::path::PathBuf;

use crate::ai::PromptTemplateId;
use crate::cli::progress::{ConsoleRenderer, format_size};
use crate::cli::ui::Output;
use crate::cli::util::{CommandOptions, inputs_or_root};
use crate::pipeline::{
    PipelineExecutor, PipelineReport, PipelineRequest, PipelineState, progress_channel,
};
use crate::types::Result;

pub struct AnalyzeArgs {
    pub inputs: Vec<PathBuf>,
    pub template: PromptTemplateId,
    pub request_text: Option<String>,
}

/// Run the pipeline and print its outcome; the caller maps the terminal
/// state to an exit code
pub async fn run(opts: &CommandOptions, args: AnalyzeArgs) -> Result<PipelineReport> {
    let out = Output::new(opts.quiet);
    let ctx = opts.load_context()?;
    let model = ctx.config.llm.model.clone();

    let mut request = PipelineRequest::new(inputs_or_root(args.inputs), model.clone(), args.template);
    if let Some(text) = args.request_text {
        request = request.with_request_text(text);
    }

    let executor = PipelineExecutor::from_context(ctx);
    let (progress, rx) = progress_channel();
    let renderer = (!opts.quiet).then(|| tokio::spawn(ConsoleRenderer::new(model).follow(rx)));

    let report = executor.run_with_progress(request, &progress).await;
    // closes the progress channel so the renderer always stops
    drop(progress);
    if let Some(handle) = renderer {
        let _ = handle.await;
    }

    print_report(&out, &report);
    Ok(report)
}

fn print_report(out: &Output, report: &PipelineReport) {
    match report.state() {
        PipelineState::Succeeded => out.success(&report.summary()),
        PipelineState::TimedOut => out.warning(&report.summary()),
        _ => out.error(&report.summary()),
    }

    if let Some(document) = report.document() {
        out.section("Run");
        out.field("Run ID", report.run_id().short());
        out.field("Model", report.model());
        out.field("Files", document.files().len());
        let tokens = report.request().map_or(document.token_count(), |r| r.token_count());
        out.field("Tokens", format!("~{}", tokens));
        out.field("Content", format_size(document.char_count()));
        for skipped in document.skipped() {
            out.warning(&format!("Skipped {} ({})", skipped.relative_path, skipped.reason));
        }
    }

    if let Some(e) = report.storage_error() {
        out.error(&e.to_string());
    }
    if !report.artifacts().is_empty() {
        out.section("Artifacts");
        for path in report.artifacts() {
            out.artifact(path);
        }
    }

    if report.is_success()
        && let Some(response) = report.result().and_then(|r| r.raw_response())
    {
        out.section("Analysis");
        out.plain(response);
    }
}
