//! Prompt Assembly
//!
//! A prompt is `template + "\n\n" + extra + "\n\n" + collected document`,
//! where `extra` depends on the template (a lead-in line for improvements,
//! the user's request text for feature requests).

mod templates;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::ai::provider::ProviderDescriptor;
use crate::ai::tokenizer::TokenEstimator;
use crate::collector::CollectedDocument;

/// Marker line an improvement response is expected to contain
pub const ISSUE_MARKER: &str = "1. [ ] ISSUE";

const FALLBACK_ISSUE_HEADER: &str = "1. [ ] ISSUE IMPROVE\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptTemplateId {
    Improve,
    Request,
}

impl PromptTemplateId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Improve => "improve",
            Self::Request => "request",
        }
    }

    pub fn template(&self) -> &'static str {
        match self {
            Self::Improve => templates::IMPROVE,
            Self::Request => templates::REQUEST,
        }
    }

    /// Heading used for the result artifact
    pub fn title(&self) -> &'static str {
        match self {
            Self::Improve => "Code Improvement Suggestions",
            Self::Request => "Code Request Analysis",
        }
    }

    /// Text placed between the template and the code
    pub fn extra_content(&self, request_text: Option<&str>) -> String {
        match self {
            Self::Improve => "Code to improve:".to_string(),
            Self::Request => format!(
                "FEATURE REQUEST:\n{}\n\nCODE:",
                request_text.unwrap_or_default().trim()
            ),
        }
    }
}

impl fmt::Display for PromptTemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value object handed to a provider: what to send and to whom
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    document: Arc<CollectedDocument>,
    descriptor: ProviderDescriptor,
    template: PromptTemplateId,
    extra_content: String,
    prompt: String,
    /// Estimate for `prompt`, the text the token limit applies to
    token_count: usize,
}

impl AnalysisRequest {
    pub fn new(
        document: Arc<CollectedDocument>,
        descriptor: ProviderDescriptor,
        template: PromptTemplateId,
        request_text: Option<&str>,
    ) -> Self {
        let extra_content = template.extra_content(request_text);
        let prompt = format!(
            "{}\n\n{}\n\n{}",
            template.template(),
            extra_content,
            document.text()
        );
        let token_count = TokenEstimator::new().estimate(&prompt);
        Self {
            document,
            descriptor,
            template,
            extra_content,
            prompt,
            token_count,
        }
    }

    pub fn document(&self) -> &Arc<CollectedDocument> {
        &self.document
    }

    pub fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    pub fn template(&self) -> PromptTemplateId {
        self.template
    }

    pub fn extra_content(&self) -> &str {
        &self.extra_content
    }

    /// Full text sent to the provider
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Estimated tokens of the full prompt, never less than the document's
    pub fn token_count(&self) -> usize {
        self.token_count
    }
}

/// Bring a raw response into the shape the template asked for
///
/// Improvement responses without an issue checklist get a generic header so
/// downstream tooling can still parse them. Request responses pass through.
pub fn normalize_response(template: PromptTemplateId, response: &str) -> String {
    match template {
        PromptTemplateId::Improve => {
            let has_marker = response
                .lines()
                .any(|line| line.trim_start().starts_with(ISSUE_MARKER));
            if has_marker {
                response.to_string()
            } else {
                warn!("Response has no issue checklist, prepending default header");
                format!("{}{}", FALLBACK_ISSUE_HEADER, response)
            }
        }
        PromptTemplateId::Request => response.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::CollectedFile;
    use std::time::Duration;

    fn request(template: PromptTemplateId, text: Option<&str>) -> AnalysisRequest {
        let doc = CollectedDocument::assemble(
            "Code Collection",
            vec![CollectedFile::new("a.py", "python", "pass\n".to_string())],
            Vec::new(),
            &TokenEstimator::new(),
        );
        let descriptor = ProviderDescriptor {
            provider_name: "openai".to_string(),
            model_name: "gpt-4o".to_string(),
            token_limit: 128_000,
            request_timeout: Duration::from_secs(300),
        };
        AnalysisRequest::new(Arc::new(doc), descriptor, template, text)
    }

    #[test]
    fn test_improve_prompt_layout() {
        let req = request(PromptTemplateId::Improve, None);
        let expected_prefix = format!("{}\n\nCode to improve:\n\n# Code Collection", templates::IMPROVE);
        assert!(req.prompt().starts_with(&expected_prefix));
        assert!(req.prompt().ends_with(req.document().text()));
    }

    #[test]
    fn test_request_prompt_includes_feature_text() {
        let req = request(PromptTemplateId::Request, Some("  Add a --json flag \n"));
        assert_eq!(req.extra_content(), "FEATURE REQUEST:\nAdd a --json flag\n\nCODE:");
        assert!(req.prompt().contains("FEATURE REQUEST:\nAdd a --json flag\n\nCODE:\n\n# Code Collection"));
    }

    #[test]
    fn test_token_count_covers_whole_prompt() {
        let text = "y".repeat(3_000);
        let req = request(PromptTemplateId::Request, Some(&text));
        assert_eq!(req.token_count(), TokenEstimator::new().estimate(req.prompt()));
        assert!(req.token_count() >= req.document().token_count() + 1_000);
    }

    #[test]
    fn test_normalize_keeps_checklist() {
        let body = "Intro\n 1. [ ] ISSUE HIGH\n   fix it";
        assert_eq!(normalize_response(PromptTemplateId::Improve, body), body);
    }

    #[test]
    fn test_normalize_prepends_header() {
        let out = normalize_response(PromptTemplateId::Improve, "Looks fine overall.");
        assert_eq!(out, "1. [ ] ISSUE IMPROVE\n\nLooks fine overall.");
    }

    #[test]
    fn test_request_response_untouched() {
        assert_eq!(normalize_response(PromptTemplateId::Request, "Plan"), "Plan");
    }
}
