//! Source Collection
//!
//! Turns a set of input paths into one ordered, annotated markdown document:
//! - `ignore`: gitignore-style rule evaluation (defaults + project rules)
//! - `scanner`: traversal with directory pruning and content reading
//! - `language`: extension → fence language
//! - `document`: rendering, token estimate and fingerprint
//! - `report`: per-file size, line and token metrics for the whole tree

pub mod document;
pub mod ignore;
pub mod language;
pub mod report;
pub mod scanner;

pub use document::{CollectedDocument, CollectedFile, SkipReason, SkippedFile, make_anchor};
pub use ignore::{DEFAULT_RULES, IgnoreMatcher, IgnoreRule, RuleOrigin};
pub use language::language_tag;
pub use report::{FileStats, FileStatus, StructureReport, StructureReporter, format_bytes};
pub use scanner::Collector;
