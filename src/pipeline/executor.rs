//! Pipeline Executor
//!
//! Drives one run through the state machine and always ends by handing the
//! artifacts produced so far to the [`ResultWriter`].
//!
//! Dispatch runs the provider call as its own task and races it against the
//! progress tracker and a backstop deadline of `timeout + tick`. The
//! provider's `submit` enforces the timeout itself; the backstop only covers
//! a provider that ignores it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::PipelineState;
use super::progress::{ProgressSender, ProgressTracker, progress_channel};
use crate::ai::{
    AnalysisRequest, AnalysisResult, AnalysisStatus, ErrorCategory, LlmError, PromptTemplateId,
    ProviderRegistry, SharedProvider,
};
use crate::collector::{CollectedDocument, Collector};
use crate::context::RunContext;
use crate::storage::{FsResultWriter, ResultWriter, RunArtifacts};
use crate::types::{NeuroError, Result, RunId};

// =============================================================================
// Request / Report
// =============================================================================

#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub inputs: Vec<PathBuf>,
    pub model: String,
    pub template: PromptTemplateId,
    /// Feature request text for [`PromptTemplateId::Request`]
    pub request_text: Option<String>,
    /// Overrides the configured request timeout
    pub timeout: Option<Duration>,
}

impl PipelineRequest {
    pub fn new(inputs: Vec<PathBuf>, model: impl Into<String>, template: PromptTemplateId) -> Self {
        Self {
            inputs,
            model: model.into(),
            template,
            request_text: None,
            timeout: None,
        }
    }

    pub fn with_request_text(mut self, text: impl Into<String>) -> Self {
        self.request_text = Some(text.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn input_labels(&self) -> Vec<String> {
        self.inputs.iter().map(|p| p.display().to_string()).collect()
    }
}

/// Outcome of one run, including everything produced before it ended
#[derive(Debug)]
pub struct PipelineReport {
    run_id: RunId,
    model: String,
    transitions: Vec<PipelineState>,
    document: Option<Arc<CollectedDocument>>,
    request: Option<Arc<AnalysisRequest>>,
    result: Option<AnalysisResult>,
    error: Option<NeuroError>,
    artifacts: Vec<PathBuf>,
    storage_error: Option<NeuroError>,
}

impl PipelineReport {
    fn new(run_id: RunId, model: String) -> Self {
        Self {
            run_id,
            model,
            transitions: vec![PipelineState::Idle],
            document: None,
            request: None,
            result: None,
            error: None,
            artifacts: Vec::new(),
            storage_error: None,
        }
    }

    fn enter(&mut self, next: PipelineState) {
        let current = self.state();
        debug_assert!(
            current.can_transition_to(next),
            "illegal transition {} -> {}",
            current,
            next
        );
        debug!("Run {}: {} -> {}", self.run_id.short(), current, next);
        self.transitions.push(next);
    }

    fn fail(&mut self, error: NeuroError) {
        self.error = Some(error);
        self.enter(PipelineState::Failed);
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Current (after `run`, terminal) state
    pub fn state(&self) -> PipelineState {
        self.transitions
            .last()
            .copied()
            .unwrap_or(PipelineState::Idle)
    }

    /// Every state visited, starting with `Idle`
    pub fn transitions(&self) -> &[PipelineState] {
        &self.transitions
    }

    pub fn is_success(&self) -> bool {
        self.state() == PipelineState::Succeeded
    }

    pub fn document(&self) -> Option<&Arc<CollectedDocument>> {
        self.document.as_ref()
    }

    pub fn request(&self) -> Option<&AnalysisRequest> {
        self.request.as_deref()
    }

    /// Prompt text as sent (or as it would have been sent)
    pub fn prompt(&self) -> Option<&str> {
        self.request.as_deref().map(AnalysisRequest::prompt)
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    /// Deterministic failure that stopped the run, if any
    pub fn error(&self) -> Option<&NeuroError> {
        self.error.as_ref()
    }

    pub fn artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }

    pub fn storage_error(&self) -> Option<&NeuroError> {
        self.storage_error.as_ref()
    }

    /// One human-readable line for the terminal state
    pub fn summary(&self) -> String {
        match (self.state(), &self.error, &self.result) {
            (PipelineState::Succeeded, _, Some(result)) => {
                let tokens = result
                    .tokens_used()
                    .map(|t| format!(", {} tokens", t))
                    .unwrap_or_default();
                format!(
                    "Analysis by {} completed in {:.1}s{}",
                    self.model,
                    result.elapsed_seconds(),
                    tokens
                )
            }
            (PipelineState::TimedOut, _, result) => format!(
                "{} did not respond in time ({:.1}s); collected code and prompt were kept",
                self.model,
                result
                    .as_ref()
                    .map(AnalysisResult::elapsed_seconds)
                    .unwrap_or_default()
            ),
            (_, Some(error), _) => error.to_string(),
            (_, None, Some(result)) => format!(
                "Analysis failed ({}): {}",
                result.status(),
                result.detail().unwrap_or("no detail")
            ),
            (state, None, None) => format!("Run ended in state {}", state),
        }
    }
}

/// Outcome of a collect-only run
#[derive(Debug)]
pub struct CollectReport {
    pub run_id: RunId,
    pub document: Arc<CollectedDocument>,
    pub artifacts: Vec<PathBuf>,
}

// =============================================================================
// Executor
// =============================================================================

pub struct PipelineExecutor {
    ctx: RunContext,
    registry: ProviderRegistry,
    writer: Arc<dyn ResultWriter>,
}

impl PipelineExecutor {
    pub fn new(ctx: RunContext, registry: ProviderRegistry, writer: Arc<dyn ResultWriter>) -> Self {
        Self {
            ctx,
            registry,
            writer,
        }
    }

    /// Built-in providers, artifacts under the configured output directory
    pub fn from_context(ctx: RunContext) -> Self {
        let registry = ProviderRegistry::builtin(ctx.config.llm.timeout());
        let writer = Arc::new(FsResultWriter::new(ctx.output_dir()));
        Self::new(ctx, registry, writer)
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Collect and persist the code document without contacting a provider
    pub fn collect_only<P: AsRef<Path>>(&self, inputs: &[P]) -> Result<CollectReport> {
        let run_id = RunId::new();
        let timestamp = Local::now();
        let labels: Vec<String> = inputs
            .iter()
            .map(|p| p.as_ref().display().to_string())
            .collect();
        info!("Run {}: collecting {} input(s)", run_id.short(), labels.len());

        let document = Arc::new(Collector::from_context(&self.ctx)?.collect(inputs)?);
        let artifacts = self.writer.write(&RunArtifacts {
            run_id: &run_id,
            timestamp,
            inputs: &labels,
            document: Some(&document),
            request: None,
            result: None,
        })?;

        Ok(CollectReport {
            run_id,
            document,
            artifacts,
        })
    }

    /// Run the full pipeline; never returns early without a terminal state
    pub async fn run(&self, request: PipelineRequest) -> PipelineReport {
        let (progress, _) = progress_channel();
        self.run_with_progress(request, &progress).await
    }

    /// [`run`](Self::run), publishing snapshots on a channel owned by this run
    ///
    /// The value is `None` outside of dispatch and is reset to `None` when the
    /// call resolves. Concurrent runs each pass their own sender.
    pub async fn run_with_progress(
        &self,
        request: PipelineRequest,
        progress: &ProgressSender,
    ) -> PipelineReport {
        let run_id = RunId::new();
        let timestamp = Local::now();
        let labels = request.input_labels();
        let mut report = PipelineReport::new(run_id, request.model.clone());
        info!(
            "Run {} started: {} on {} input(s), template {}",
            report.run_id,
            request.model,
            labels.len(),
            request.template
        );

        self.advance(&mut report, &request, progress).await;
        self.finish(report, &labels, timestamp)
    }

    async fn advance(
        &self,
        report: &mut PipelineReport,
        request: &PipelineRequest,
        progress: &ProgressSender,
    ) {
        let mut descriptor = match self.registry.select(&request.model) {
            Ok(descriptor) => descriptor,
            Err(e) => return report.fail(e),
        };
        if let Some(timeout) = request.timeout {
            descriptor.request_timeout = timeout;
        }

        report.enter(PipelineState::Collecting);
        let collected = Collector::from_context(&self.ctx).and_then(|c| c.collect(&request.inputs));
        let document = match collected {
            Ok(document) => Arc::new(document),
            Err(e) => return report.fail(e),
        };
        report.document = Some(Arc::clone(&document));

        report.enter(PipelineState::Estimating);
        let analysis = Arc::new(AnalysisRequest::new(
            Arc::clone(&document),
            descriptor.clone(),
            request.template,
            request.request_text.as_deref(),
        ));
        debug!(
            "{} files, {} chars, ~{} document tokens, ~{} prompt tokens",
            document.files().len(),
            document.char_count(),
            document.token_count(),
            analysis.token_count()
        );
        report.request = Some(Arc::clone(&analysis));

        report.enter(PipelineState::Validating);
        if let Err(e) = self.registry.validate(&analysis) {
            report.result = Some(AnalysisResult::token_exceeded(
                analysis.token_count(),
                descriptor.token_limit,
            ));
            return report.fail(e);
        }

        report.enter(PipelineState::Dispatching);
        let provider = match self.registry.create(&descriptor, &self.ctx.config.llm) {
            Ok(provider) => provider,
            Err(e) => {
                report.result = Some(AnalysisResult::provider_error(&e, Duration::ZERO));
                return report.fail(NeuroError::Llm(e));
            }
        };

        let result = self.dispatch(provider, Arc::clone(&analysis), progress).await;
        let next = match result.status() {
            AnalysisStatus::Success => PipelineState::Succeeded,
            AnalysisStatus::Timeout => PipelineState::TimedOut,
            AnalysisStatus::ProviderError | AnalysisStatus::TokenExceeded => PipelineState::Failed,
        };
        report.result = Some(result.normalized(request.template));
        report.enter(next);
    }

    async fn dispatch(
        &self,
        provider: SharedProvider,
        request: Arc<AnalysisRequest>,
        sender: &ProgressSender,
    ) -> AnalysisResult {
        let timeout = request.descriptor().request_timeout;
        let provider_name = provider.name().to_string();
        let tracker = ProgressTracker::new(request.prompt().chars().count(), &self.ctx.config.progress);
        info!(
            "Dispatching to {} (timeout {}s, estimated {:.0}s)",
            request.descriptor().model_name,
            timeout.as_secs(),
            tracker.estimated_total_seconds()
        );

        let started = Instant::now();
        let mut call = tokio::spawn({
            let request = Arc::clone(&request);
            async move { provider.submit(&request, timeout).await }
        });

        let backstop = tokio::time::sleep(timeout + tracker.tick());
        tokio::pin!(backstop);
        let progress = tracker.run(sender);
        tokio::pin!(progress);
        let mut tracking = true;

        let result = loop {
            tokio::select! {
                joined = &mut call => break match joined {
                    Ok(result) => result,
                    Err(e) => {
                        let err = LlmError::with_provider(
                            ErrorCategory::Unknown,
                            format!("Provider task failed: {}", e),
                            provider_name.as_str(),
                        );
                        AnalysisResult::provider_error(&err, started.elapsed())
                    }
                },
                _ = &mut backstop => {
                    // Stop waiting; a blocking backend may still finish in the background
                    call.abort();
                    warn!("{} ignored its {}s timeout, abandoning call", provider_name, timeout.as_secs());
                    break AnalysisResult::timeout(started.elapsed());
                }
                _ = &mut progress, if tracking => tracking = false,
            }
        };

        sender.send_replace(None);
        result
    }

    fn finish(
        &self,
        mut report: PipelineReport,
        labels: &[String],
        timestamp: DateTime<Local>,
    ) -> PipelineReport {
        let written = self.writer.write(&RunArtifacts {
            run_id: &report.run_id,
            timestamp,
            inputs: labels,
            document: report.document.as_deref(),
            request: report.request.as_deref(),
            result: report.result.as_ref(),
        });
        match written {
            Ok(paths) => report.artifacts = paths,
            Err(e) => {
                error!("Run {}: failed to persist artifacts: {}", report.run_id.short(), e);
                report.storage_error = Some(e);
            }
        }

        match report.state() {
            PipelineState::Succeeded => info!("Run {}: {}", report.run_id.short(), report.summary()),
            _ => warn!("Run {}: {}", report.run_id.short(), report.summary()),
        }
        report
    }
}
