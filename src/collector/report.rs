//! Project Structure Report
//!
//! Walks the project with the same ignore rules as collection and records
//! size, non-empty lines and estimated tokens per file. Files over the size
//! cap are flagged as large and never read; files over
//! [`COMPLEX_FILE_LINES`] are flagged as complex and listed with a split
//! suggestion.

use chrono::{DateTime, Local};
use ignore::WalkBuilder;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::document::SkipReason;
use super::ignore::IgnoreMatcher;
use super::scanner::{canonical, dir_first, looks_binary, relative_to, to_forward_slashes, walk_error_path};
use crate::ai::tokenizer::TokenEstimator;
use crate::constants::collection::{COMPLEX_FILE_LINES, MAX_FILE_SIZE};
use crate::context::RunContext;
use crate::types::{CollectionError, NeuroError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "reason")]
pub enum FileStatus {
    Counted,
    Skipped(SkipReason),
    Unreadable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStats {
    /// Forward-slash path relative to the project root
    pub path: String,
    pub size_bytes: u64,
    /// Non-empty lines
    pub lines: usize,
    pub tokens: usize,
    pub status: FileStatus,
}

impl FileStats {
    pub fn is_large(&self) -> bool {
        self.status == FileStatus::Skipped(SkipReason::TooLarge)
    }

    pub fn is_complex(&self) -> bool {
        self.lines > COMPLEX_FILE_LINES
    }

    /// Modules of at most [`COMPLEX_FILE_LINES`] lines this file would split into
    pub fn suggested_modules(&self) -> usize {
        self.lines.div_ceil(COMPLEX_FILE_LINES).max(1)
    }

    fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StructureReport {
    pub generated_at: DateTime<Local>,
    /// Files above this many bytes were not read
    pub large_file_size: u64,
    /// Directory-first, then alphabetical
    pub files: Vec<FileStats>,
}

impl StructureReport {
    /// Size of every file, large ones included
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size_bytes).sum()
    }

    pub fn total_lines(&self) -> usize {
        self.files.iter().map(|f| f.lines).sum()
    }

    pub fn total_tokens(&self) -> usize {
        self.files.iter().map(|f| f.tokens).sum()
    }

    pub fn large_files(&self) -> usize {
        self.files.iter().filter(|f| f.is_large()).count()
    }

    pub fn unreadable_files(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.status == FileStatus::Unreadable)
            .count()
    }

    /// Complex files, longest first
    pub fn complex_files(&self) -> Vec<&FileStats> {
        let mut complex: Vec<_> = self.files.iter().filter(|f| f.is_complex()).collect();
        complex.sort_by(|a, b| b.lines.cmp(&a.lines).then_with(|| a.path.cmp(&b.path)));
        complex
    }

    /// Markdown: tree, summary table, notes, split recommendations
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("# Project Structure Report\n\n");
        out.push_str("Description: Project structure analysis with metrics and recommendations\n");
        let _ = writeln!(out, "Generated: {}\n", self.generated_at.format("%Y-%m-%d %H:%M:%S"));

        out.push_str("## Project Tree\n\n");
        render_tree(&mut out, &self.files);

        out.push_str("\n## Summary\n\n");
        out.push_str("| Metric | Value |\n|--------|-------|\n");
        let _ = writeln!(out, "| Files | {} |", self.files.len());
        let _ = writeln!(out, "| Total Size | {:.1}KB |", self.total_bytes() as f64 / 1024.0);
        let _ = writeln!(out, "| Total Lines | {} |", self.total_lines());
        let _ = writeln!(out, "| Total Tokens | ~{} |", self.total_tokens());
        let _ = writeln!(out, "| Large Files | {} |", self.large_files());
        if self.unreadable_files() > 0 {
            let _ = writeln!(out, "| Files with Errors | {} |", self.unreadable_files());
        }

        out.push_str("\n## Notes\n\n");
        let _ = writeln!(
            out,
            "- Files larger than {} are marked as large and not counted",
            format_bytes(self.large_file_size)
        );
        let _ = writeln!(out, "- 🔴 marks files with more than {} non-empty lines", COMPLEX_FILE_LINES);
        out.push_str("- Token counts are estimates\n");
        out.push_str("- Binary and non-UTF-8 files are listed but not counted\n");
        out.push_str("- Files matching ignore rules are excluded\n\n");

        out.push_str("## Recommendations\n\n");
        let complex = self.complex_files();
        if complex.is_empty() {
            let _ = writeln!(
                out,
                "No files currently exceed the recommended size limit ({} lines).",
                COMPLEX_FILE_LINES
            );
        } else {
            out.push_str("The following files might benefit from being split into smaller modules:\n\n");
            for file in complex {
                let modules = file.suggested_modules();
                let _ = writeln!(
                    out,
                    "- {} ({} lines) 🔴\n  - Consider splitting into {} modules of ~{} lines each",
                    file.path,
                    file.lines,
                    modules,
                    file.lines / modules
                );
            }
        }
        out
    }
}

/// Nested `├──` listing; a directory line is emitted the first time a file
/// under it appears
fn render_tree(out: &mut String, files: &[FileStats]) {
    let mut open: Vec<&str> = Vec::new();
    for file in files {
        let parts: Vec<&str> = file.path.split('/').collect();
        let dirs = &parts[..parts.len() - 1];

        let shared = open
            .iter()
            .zip(dirs)
            .take_while(|(a, b)| a == b)
            .count();
        open.truncate(shared);

        for dir in &dirs[shared..] {
            let _ = writeln!(out, "{}├── {}/", "│   ".repeat(open.len()), dir);
            open.push(*dir);
        }
        let _ = writeln!(out, "{}├── {}", "│   ".repeat(open.len()), format_entry(file));
    }
}

fn format_entry(file: &FileStats) -> String {
    let size = format_bytes(file.size_bytes);
    match file.status {
        FileStatus::Unreadable => format!("{} (⚠️ Error accessing file)", file.name()),
        FileStatus::Skipped(SkipReason::TooLarge) => format!("{} ({}) ⚠️ Large file", file.name(), size),
        FileStatus::Skipped(reason) => format!("{} ({}, {})", file.name(), size, reason),
        FileStatus::Counted => {
            let marker = if file.is_complex() { " 🔴" } else { "" };
            format!(
                "{} ({}, ~{} tokens, {} lines){}",
                file.name(),
                size,
                file.tokens,
                file.lines,
                marker
            )
        }
    }
}

/// KB with one decimal from 1 KB up, bytes below
pub fn format_bytes(bytes: u64) -> String {
    if bytes >= 1024 {
        format!("{:.1}KB", bytes as f64 / 1024.0)
    } else {
        format!("{}B", bytes)
    }
}

// =============================================================================
// Reporter
// =============================================================================

pub struct StructureReporter {
    root: PathBuf,
    matcher: Arc<IgnoreMatcher>,
    large_file_size: u64,
    estimator: TokenEstimator,
}

impl StructureReporter {
    pub fn new<P: AsRef<Path>>(root: P, matcher: IgnoreMatcher) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            matcher: Arc::new(matcher),
            large_file_size: MAX_FILE_SIZE,
            estimator: TokenEstimator::default(),
        }
    }

    /// Same root, ignore rules and size cap as a collection run
    pub fn from_context(ctx: &RunContext) -> Result<Self> {
        let matcher = IgnoreMatcher::for_project(&ctx.project_root, &ctx.config.collection)?;
        Ok(Self::new(&ctx.project_root, matcher).with_large_file_size(ctx.config.collection.max_file_size))
    }

    pub fn with_large_file_size(mut self, size: u64) -> Self {
        self.large_file_size = size;
        self
    }

    /// Report on `start`, a directory inside the project (relative paths
    /// resolve against the root). An ignored start yields an empty report.
    pub fn analyze(&self, start: &Path) -> Result<StructureReport> {
        let root = canonical(&self.root)?;
        let start = canonical(&root.join(start))?;
        let relative = start.strip_prefix(&root).map_err(|_| {
            NeuroError::Config(format!(
                "{} is outside the project root {}",
                start.display(),
                root.display()
            ))
        })?;

        let mut files = Vec::new();
        if !relative.as_os_str().is_empty() && self.matcher.should_ignore(relative) {
            warn!("{} is ignored, nothing to report", relative.display());
        } else if start.is_dir() {
            for path in self.walk(&root, &start)? {
                files.push(self.measure(&root, &path));
            }
        } else {
            files.push(self.measure(&root, &start));
        }

        files.sort_by(|a, b| dir_first(Path::new(&a.path), Path::new(&b.path)));
        info!(
            "Reported {} files ({} large, {} complex)",
            files.len(),
            files.iter().filter(|f| f.is_large()).count(),
            files.iter().filter(|f| f.is_complex()).count()
        );
        Ok(StructureReport {
            generated_at: Local::now(),
            large_file_size: self.large_file_size,
            files,
        })
    }

    fn walk(&self, root: &Path, dir: &Path) -> Result<Vec<PathBuf>> {
        let matcher = Arc::clone(&self.matcher);
        let filter_root = root.to_path_buf();

        let walker = WalkBuilder::new(dir)
            .standard_filters(false)
            .follow_links(false)
            .filter_entry(move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                !matcher.is_ignored(&relative_to(&filter_root, entry.path()), is_dir)
            })
            .build();

        let mut paths = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    if err.io_error().map(io::Error::kind) == Some(ErrorKind::PermissionDenied) {
                        let path = walk_error_path(&err).unwrap_or(dir);
                        return Err(CollectionError::permission_denied(path).into());
                    }
                    warn!("Skipping unreadable entry: {}", err);
                    continue;
                }
            };
            if entry.file_type().is_some_and(|t| t.is_file()) {
                paths.push(entry.into_path());
            }
        }
        Ok(paths)
    }

    fn measure(&self, root: &Path, absolute: &Path) -> FileStats {
        let path = to_forward_slashes(&relative_to(root, absolute));
        let mut stats = FileStats {
            path,
            size_bytes: 0,
            lines: 0,
            tokens: 0,
            status: FileStatus::Counted,
        };

        let size = match fs::metadata(absolute) {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                warn!("Cannot stat {}: {}", stats.path, e);
                stats.status = FileStatus::Unreadable;
                return stats;
            }
        };
        stats.size_bytes = size;
        if size > self.large_file_size {
            stats.status = FileStatus::Skipped(SkipReason::TooLarge);
            return stats;
        }

        let bytes = match fs::read(absolute) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Cannot read {}: {}", stats.path, e);
                stats.status = FileStatus::Unreadable;
                return stats;
            }
        };
        if looks_binary(&bytes) {
            stats.status = FileStatus::Skipped(SkipReason::Binary);
            return stats;
        }
        match String::from_utf8(bytes) {
            Ok(content) => {
                stats.lines = content.lines().filter(|l| !l.trim().is_empty()).count();
                stats.tokens = self.estimator.estimate(&content);
            }
            Err(_) => stats.status = FileStatus::Skipped(SkipReason::NotUtf8),
        }
        debug!("Measured {} ({} lines)", stats.path, stats.lines);
        stats
    }
}
