//! Artifact File Naming
//!
//! `{KIND}[_{PROVIDER}]_{YYYYMMDD_HHMMSS}[_{slug}].md`. The default ignore
//! rules match every name this module produces, so artifacts never end up
//! inside a later collection.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, TimeZone};
use regex::Regex;

use crate::ai::PromptTemplateId;

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("static slug pattern"));
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-\s]+").expect("static slug pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Code,
    ImprovePrompt,
    ImproveResult,
    RequestPrompt,
    RequestResult,
}

impl ArtifactKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Code => "CODE",
            Self::ImprovePrompt => "IMPROVE_PROMPT",
            Self::ImproveResult => "IMPROVE_RESULT",
            Self::RequestPrompt => "REQUEST_PROMPT",
            Self::RequestResult => "REQUEST_RESULT",
        }
    }

    pub fn prompt_for(template: PromptTemplateId) -> Self {
        match template {
            PromptTemplateId::Improve => Self::ImprovePrompt,
            PromptTemplateId::Request => Self::RequestPrompt,
        }
    }

    pub fn result_for(template: PromptTemplateId) -> Self {
        match template {
            PromptTemplateId::Improve => Self::ImproveResult,
            PromptTemplateId::Request => Self::RequestResult,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Lowercase, drop punctuation, collapse whitespace and dashes to one dash
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    let cleaned = NON_WORD.replace_all(&lower, "");
    SEPARATORS
        .replace_all(&cleaned, "-")
        .trim_matches('-')
        .to_string()
}

pub fn artifact_file_name<Tz>(
    kind: ArtifactKind,
    provider: Option<&str>,
    timestamp: &DateTime<Tz>,
    title: Option<&str>,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut name = kind.prefix().to_string();
    if let Some(provider) = provider.filter(|p| !p.is_empty()) {
        name.push('_');
        name.push_str(&provider.to_uppercase());
    }
    name.push('_');
    name.push_str(&timestamp.format(TIMESTAMP_FORMAT).to_string());

    if let Some(slug) = title.map(slugify).filter(|s| !s.is_empty()) {
        name.push('_');
        name.push_str(&slug);
    }
    name.push_str(".md");
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::IgnoreMatcher;
    use crate::constants::collection::TREE_REPORT_FILE;
    use chrono::{Local, Utc};
    use std::path::Path;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, 20, 14, 5, 9).unwrap()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Improve"), "improve");
        assert_eq!(slugify("  Add a --json flag!  "), "add-a-json-flag");
        assert_eq!(slugify("src/main.rs"), "srcmainrs");
        assert_eq!(slugify("under_score kept"), "under_score-kept");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_analysis_names() {
        assert_eq!(
            artifact_file_name(ArtifactKind::ImprovePrompt, Some("openai"), &ts(), Some("improve")),
            "IMPROVE_PROMPT_OPENAI_20241220_140509_improve.md"
        );
        assert_eq!(
            artifact_file_name(ArtifactKind::Code, Some("gemini"), &ts(), Some("request")),
            "CODE_GEMINI_20241220_140509_request.md"
        );
    }

    #[test]
    fn test_collect_only_name() {
        assert_eq!(
            artifact_file_name(ArtifactKind::Code, None, &ts(), None),
            "CODE_20241220_140509.md"
        );
        assert_eq!(
            artifact_file_name(ArtifactKind::Code, None, &ts(), Some("***")),
            "CODE_20241220_140509.md"
        );
    }

    #[test]
    fn test_every_artifact_is_ignored_by_default() {
        let matcher = IgnoreMatcher::new("/project", Vec::<String>::new()).unwrap();
        let now = Local::now();
        let names = [
            artifact_file_name(ArtifactKind::Code, None, &now, None),
            artifact_file_name(ArtifactKind::Code, Some("anthropic"), &now, Some("improve")),
            artifact_file_name(ArtifactKind::ImprovePrompt, Some("openai"), &now, Some("improve")),
            artifact_file_name(ArtifactKind::ImproveResult, Some("openai"), &now, Some("improve")),
            artifact_file_name(ArtifactKind::RequestPrompt, Some("ollama"), &now, Some("request")),
            artifact_file_name(ArtifactKind::RequestResult, Some("ollama"), &now, Some("request")),
            TREE_REPORT_FILE.to_string(),
        ];
        for name in names {
            assert!(matcher.is_ignored(Path::new(&name), false), "{} not ignored", name);
        }
    }
}
