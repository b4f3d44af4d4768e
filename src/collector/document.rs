//! Collected Document
//!
//! Immutable result of one collection pass. The markdown rendering and its
//! token estimate are computed once at assembly time.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

use crate::ai::tokenizer::TokenEstimator;

pub const DEFAULT_TITLE: &str = "Code Collection";

/// One retained source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectedFile {
    /// Forward-slash path relative to the project root
    pub relative_path: String,
    pub language_tag: String,
    pub content: String,
    pub size_bytes: u64,
    pub line_count: usize,
}

impl CollectedFile {
    pub fn new(
        relative_path: impl Into<String>,
        language_tag: impl Into<String>,
        content: String,
    ) -> Self {
        Self {
            relative_path: relative_path.into(),
            language_tag: language_tag.into(),
            size_bytes: content.len() as u64,
            line_count: content.lines().count(),
            content,
        }
    }

    pub fn anchor(&self) -> String {
        make_anchor(&self.relative_path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Binary,
    NotUtf8,
    TooLarge,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Binary => write!(f, "binary content"),
            Self::NotUtf8 => write!(f, "not valid UTF-8"),
            Self::TooLarge => write!(f, "exceeds size limit"),
        }
    }
}

/// A file that was found but excluded from the document (warning, not error)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub relative_path: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone)]
pub struct CollectedDocument {
    title: String,
    files: Vec<CollectedFile>,
    skipped: Vec<SkippedFile>,
    rendered: String,
    token_count: usize,
}

impl CollectedDocument {
    /// Render `files` in the given order and cache the token estimate
    pub fn assemble(
        title: impl Into<String>,
        files: Vec<CollectedFile>,
        skipped: Vec<SkippedFile>,
        estimator: &TokenEstimator,
    ) -> Self {
        let title = title.into();
        let rendered = render(&title, &files);
        let token_count = estimator.estimate(&rendered);
        Self {
            title,
            files,
            skipped,
            rendered,
            token_count,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn files(&self) -> &[CollectedFile] {
        &self.files
    }

    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }

    /// Relative paths in document order
    pub fn table_of_contents(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.relative_path.as_str())
    }

    pub fn text(&self) -> &str {
        &self.rendered
    }

    pub fn token_count(&self) -> usize {
        self.token_count
    }

    pub fn char_count(&self) -> usize {
        self.rendered.chars().count()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size_bytes).sum()
    }

    /// Hex SHA-256 of the rendered text
    pub fn fingerprint(&self) -> String {
        format!("{:x}", Sha256::digest(self.rendered.as_bytes()))
    }
}

/// Markdown anchor for a relative path: lowercase, `/`, `.` and spaces → `-`
pub fn make_anchor(relative_path: &str) -> String {
    relative_path
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '/' | '.' | ' ' => '-',
            other => other,
        })
        .collect()
}

fn render(title: &str, files: &[CollectedFile]) -> String {
    let body_len: usize = files.iter().map(|f| f.content.len() + 128).sum();
    let mut out = String::with_capacity(body_len + 256);

    // Writing into a String cannot fail
    let _ = write!(
        out,
        "# {}\n\nThis file contains code from the specified paths, organized by file path.\n\n",
        title
    );

    out.push_str("## Table of Contents\n\n");
    for file in files {
        let _ = writeln!(out, "- [{}](#{})", file.relative_path, file.anchor());
    }

    out.push_str("\n## Files\n\n");
    for file in files {
        let fence = fence_for(&file.content);
        let _ = write!(
            out,
            "### {} ({}) {{#{}}}\n\n_{} bytes, {} lines_\n\n{}{}\n{}",
            file.relative_path,
            file.language_tag,
            file.anchor(),
            file.size_bytes,
            file.line_count,
            fence,
            file.language_tag,
            file.content,
        );
        if !file.content.is_empty() && !file.content.ends_with('\n') {
            out.push('\n');
        }
        let _ = write!(out, "{}\n\n", fence);
    }

    out
}

/// Backtick fence longer than any backtick run inside `content`
fn fence_for(content: &str) -> String {
    let mut longest = 0;
    let mut current = 0;
    for c in content.chars() {
        if c == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    "`".repeat(longest.max(2) + 1)
}
