//! Ignore Rules
//!
//! Gitignore-style matching over paths relative to the project root. Built-in
//! defaults come first, then the project's `.neuroloraignore`, then any extra
//! patterns from config. Later rules override earlier ones, so a project can
//! re-include a default-ignored path with `!pattern`.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::CollectionConfig;
use crate::types::{CollectionError, NeuroError, Result};

/// Rules applied before any project rule
pub const DEFAULT_RULES: &[&str] = &[
    // VCS
    ".git/",
    ".hg/",
    ".svn/",
    // Dependencies and build output
    "node_modules/",
    "target/",
    "dist/",
    "build/",
    ".venv/",
    "venv/",
    // Caches
    "__pycache__/",
    ".pytest_cache/",
    ".mypy_cache/",
    ".ruff_cache/",
    "*.pyc",
    ".DS_Store",
    // Our own state and generated artifacts
    ".neurolora/",
    ".neuroloraignore",
    "FULL_CODE_*.md",
    "FULL_TREE_PROJECT_FILES.md",
    "CODE_[0-9][0-9][0-9][0-9][0-9][0-9][0-9][0-9]_*.md",
    "CODE_*_[0-9][0-9][0-9][0-9][0-9][0-9][0-9][0-9]_*.md",
    "IMPROVE_PROMPT_*.md",
    "IMPROVE_RESULT_*.md",
    "REQUEST_PROMPT_*.md",
    "REQUEST_RESULT_*.md",
];

/// Where a rule came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOrigin {
    Default,
    Project,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreRule {
    pub pattern: String,
    pub origin: RuleOrigin,
}

/// Precompiled ignore-rule set
#[derive(Debug)]
pub struct IgnoreMatcher {
    root: PathBuf,
    rules: Vec<IgnoreRule>,
    compiled: Gitignore,
}

impl IgnoreMatcher {
    /// Compile defaults followed by `project_rules`, in order
    ///
    /// An invalid project pattern is a configuration error, never skipped.
    pub fn new<I, S>(root: impl Into<PathBuf>, project_rules: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let root = root.into();
        let rules: Vec<IgnoreRule> = DEFAULT_RULES
            .iter()
            .map(|p| IgnoreRule {
                pattern: (*p).to_string(),
                origin: RuleOrigin::Default,
            })
            .chain(project_rules.into_iter().map(|p| IgnoreRule {
                pattern: p.into(),
                origin: RuleOrigin::Project,
            }))
            .collect();

        let mut builder = GitignoreBuilder::new(&root);
        for rule in &rules {
            builder.add_line(None, &rule.pattern).map_err(|e| {
                NeuroError::Config(format!("Invalid ignore pattern '{}': {}", rule.pattern, e))
            })?;
        }
        let compiled = builder
            .build()
            .map_err(|e| NeuroError::Config(format!("Failed to compile ignore rules: {}", e)))?;

        debug!(
            "Compiled {} ignore rules ({} from project)",
            rules.len(),
            rules
                .iter()
                .filter(|r| r.origin == RuleOrigin::Project)
                .count()
        );

        Ok(Self {
            root,
            rules,
            compiled,
        })
    }

    /// Load project rules from the configured ignore file plus `extra_ignore`
    ///
    /// A missing ignore file just means no project rules.
    pub fn for_project(root: &Path, config: &CollectionConfig) -> Result<Self> {
        let path = root.join(&config.ignore_file);
        let mut patterns = match fs::read_to_string(&path) {
            Ok(text) => parse_rules(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No ignore file at {}", path.display());
                Vec::new()
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                return Err(CollectionError::permission_denied(path).into());
            }
            Err(e) => return Err(e.into()),
        };
        patterns.extend(config.extra_ignore.iter().cloned());
        Self::new(root, patterns)
    }

    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    /// Whether `path` (relative to the root) is excluded
    pub fn should_ignore(&self, path: &Path) -> bool {
        let is_dir = self.root.join(path).is_dir();
        self.is_ignored(path, is_dir)
    }

    /// Same as [`should_ignore`](Self::should_ignore) when the caller already
    /// knows the entry type. A path under an ignored directory is ignored too.
    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        if path.as_os_str().is_empty() || path.is_absolute() {
            return false;
        }
        self.compiled
            .matched_path_or_any_parents(path, is_dir)
            .is_ignore()
    }
}

/// Parse ignore-file text: one pattern per line, `#` comments and blanks skipped
pub fn parse_rules(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}
