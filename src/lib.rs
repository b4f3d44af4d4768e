//! Neurolora - Code Collection and LLM Analysis
//!
//! Collects source files into one annotated markdown document and sends it,
//! wrapped in a prompt template, to a large language model for review.
//!
//! ## Core Features
//!
//! - **Collection**: gitignore-style filtering, binary detection, ordered output
//! - **Token Guard**: conservative estimate checked against the model's context window
//! - **Providers**: OpenAI, Anthropic, Gemini and local Ollama behind one contract
//! - **Progress**: estimated completion while waiting on the model
//! - **Artifacts**: code, prompt and result files for every run
//! - **Structure Report**: per-file size, line and token metrics for the project tree
//!
//! ## Quick Start
//!
//! ```ignore
//! use neurolora::{PipelineExecutor, PipelineRequest, PromptTemplateId, RunContext};
//!
//! let ctx = RunContext::load(&project_root)?;
//! let executor = PipelineExecutor::from_context(ctx);
//! let report = executor
//!     .run(PipelineRequest::new(vec!["src".into()], "gpt-4o", PromptTemplateId::Improve))
//!     .await;
//! println!("{}", report.summary());
//! ```
//!
//! ## Modules
//!
//! - [`collector`]: input traversal, ignore rules, document assembly, structure report
//! - [`ai`]: prompts, token estimation, provider contract and registry
//! - [`pipeline`]: run state machine and progress estimation
//! - [`storage`]: artifact naming and persistence
//! - [`config`]: layered configuration

pub mod ai;
pub mod cli;
pub mod collector;
pub mod config;
pub mod constants;
pub mod context;
pub mod pipeline;
pub mod storage;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

pub use config::{Config, ConfigLoader};
pub use context::RunContext;
pub use types::{CollectionError, CollectionErrorKind, FailureClass, NeuroError, Result, RunId};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use collector::{CollectedDocument, Collector, IgnoreMatcher};
pub use pipeline::{
    CollectReport, PipelineExecutor, PipelineReport, PipelineRequest, PipelineState,
    ProgressSnapshot, ProgressTracker,
};
pub use storage::{FsResultWriter, ResultWriter};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    AnalysisRequest, AnalysisResult, AnalysisStatus, LlmError, LlmProvider, PromptTemplateId,
    ProviderDescriptor, ProviderRegistry, TokenEstimator,
};
