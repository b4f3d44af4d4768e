//! Result Writer
//!
//! Persists whatever a run produced: the collected document, the prompt, and
//! the result. Called on every terminal state, so any subset may be present.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use tracing::{debug, info};

use super::naming::{ArtifactKind, artifact_file_name};
use crate::ai::{AnalysisRequest, AnalysisResult};
use crate::collector::{CollectedDocument, StructureReport};
use crate::constants::collection::TREE_REPORT_FILE;
use crate::types::{NeuroError, Result, RunId};

/// Everything a run can hand to storage
#[derive(Debug)]
pub struct RunArtifacts<'a> {
    pub run_id: &'a RunId,
    /// Shared by every file of the run
    pub timestamp: DateTime<Local>,
    /// Inputs as the caller named them
    pub inputs: &'a [String],
    pub document: Option<&'a CollectedDocument>,
    pub request: Option<&'a AnalysisRequest>,
    pub result: Option<&'a AnalysisResult>,
}

impl RunArtifacts<'_> {
    fn provider(&self) -> Option<&str> {
        self.request.map(|r| r.descriptor().provider_name.as_str())
    }

    fn slug(&self) -> Option<&'static str> {
        self.request.map(|r| r.template().as_str())
    }

    fn file_name(&self, kind: ArtifactKind) -> String {
        artifact_file_name(kind, self.provider(), &self.timestamp, self.slug())
    }
}

pub trait ResultWriter: Send + Sync {
    /// Write the available artifacts; returns the paths written, in order
    fn write(&self, artifacts: &RunArtifacts<'_>) -> Result<Vec<PathBuf>>;
}

/// Writes markdown files under a destination root
#[derive(Debug, Clone)]
pub struct FsResultWriter {
    root: PathBuf,
}

impl FsResultWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write the structure report under its fixed name, replacing the last one
    pub fn write_tree_report(&self, report: &StructureReport) -> Result<PathBuf> {
        self.ensure_root()?;
        let path = self.put(TREE_REPORT_FILE.to_string(), &report.render())?;
        info!("Wrote structure report for {} files to {}", report.files.len(), path.display());
        Ok(path)
    }

    fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| {
            NeuroError::Storage(format!("Failed to create {}: {}", self.root.display(), e))
        })
    }

    fn put(&self, name: String, content: &str) -> Result<PathBuf> {
        let path = self.root.join(name);
        fs::write(&path, content).map_err(|e| {
            NeuroError::Storage(format!("Failed to write {}: {}", path.display(), e))
        })?;
        debug!("Wrote {} ({} bytes)", path.display(), content.len());
        Ok(path)
    }
}

impl ResultWriter for FsResultWriter {
    fn write(&self, artifacts: &RunArtifacts<'_>) -> Result<Vec<PathBuf>> {
        if artifacts.document.is_none() && artifacts.request.is_none() {
            return Ok(Vec::new());
        }

        self.ensure_root()?;

        let mut written = Vec::new();

        if let Some(document) = artifacts.document {
            written.push(self.put(artifacts.file_name(ArtifactKind::Code), document.text())?);
        }

        if let Some(request) = artifacts.request {
            let template = request.template();
            written.push(self.put(
                artifacts.file_name(ArtifactKind::prompt_for(template)),
                request.prompt(),
            )?);

            if let Some(result) = artifacts.result {
                written.push(self.put(
                    artifacts.file_name(ArtifactKind::result_for(template)),
                    &render_result(request, result, artifacts.inputs),
                )?);
            }
        }

        info!(
            "Run {}: wrote {} artifact(s) to {}",
            artifacts.run_id.short(),
            written.len(),
            self.root.display()
        );
        Ok(written)
    }
}

/// Result file body
pub fn render_result(request: &AnalysisRequest, result: &AnalysisResult, inputs: &[String]) -> String {
    let mut out = format!("# {}\n\n", request.template().title());
    out.push_str(request.extra_content());
    out.push_str("\n\n");
    out.push_str(&format!("Analysis of code from: {}\n", inputs.join(", ")));
    out.push_str(&format!("Model: {}\n", request.descriptor().model_name));
    out.push_str(&format!("Status: {}\n", result.status()));
    if let Some(tokens) = result.tokens_used() {
        out.push_str(&format!("Tokens used: {}\n", tokens));
    }
    out.push('\n');

    match result.raw_response() {
        Some(response) => out.push_str(response),
        None => {
            out.push_str("_No analysis produced");
            if let Some(detail) = result.detail() {
                out.push_str(": ");
                out.push_str(detail);
            }
            out.push('_');
        }
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{PromptTemplateId, ProviderDescriptor, TokenEstimator};
    use crate::collector::{CollectedFile, IgnoreMatcher, StructureReporter};
    use chrono::TimeZone;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn document() -> Arc<CollectedDocument> {
        Arc::new(CollectedDocument::assemble(
            "Code Collection",
            vec![CollectedFile::new("a.py", "python", "print(1)\n".to_string())],
            Vec::new(),
            &TokenEstimator::new(),
        ))
    }

    fn request(template: PromptTemplateId) -> AnalysisRequest {
        let descriptor = ProviderDescriptor {
            provider_name: "openai".to_string(),
            model_name: "o1-preview".to_string(),
            token_limit: 128_000,
            request_timeout: Duration::from_secs(300),
        };
        AnalysisRequest::new(document(), descriptor, template, Some("Add logging"))
    }

    fn timestamp() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 12, 20, 9, 30, 0).unwrap()
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_collect_only_writes_code_file() {
        let dir = TempDir::new().unwrap();
        let writer = FsResultWriter::new(dir.path().join("out"));
        let doc = document();
        let run_id = RunId::new();

        let written = writer
            .write(&RunArtifacts {
                run_id: &run_id,
                timestamp: timestamp(),
                inputs: &["src".to_string()],
                document: Some(&doc),
                request: None,
                result: None,
            })
            .unwrap();

        assert_eq!(names(&written), vec!["CODE_20241220_093000.md"]);
        assert_eq!(fs::read_to_string(&written[0]).unwrap(), doc.text());
    }

    #[test]
    fn test_full_run_writes_three_files() {
        let dir = TempDir::new().unwrap();
        let writer = FsResultWriter::new(dir.path());
        let req = request(PromptTemplateId::Improve);
        let result = AnalysisResult::success(
            "1. [ ] ISSUE LOW\nRename x".to_string(),
            Duration::from_secs(12),
            Some(1200),
        );
        let run_id = RunId::new();

        let written = writer
            .write(&RunArtifacts {
                run_id: &run_id,
                timestamp: timestamp(),
                inputs: &["a.py".to_string()],
                document: Some(req.document()),
                request: Some(&req),
                result: Some(&result),
            })
            .unwrap();

        assert_eq!(
            names(&written),
            vec![
                "CODE_OPENAI_20241220_093000_improve.md",
                "IMPROVE_PROMPT_OPENAI_20241220_093000_improve.md",
                "IMPROVE_RESULT_OPENAI_20241220_093000_improve.md",
            ]
        );
        assert_eq!(fs::read_to_string(&written[1]).unwrap(), req.prompt());

        let body = fs::read_to_string(&written[2]).unwrap();
        assert!(body.starts_with("# Code Improvement Suggestions\n\nCode to improve:\n\n"));
        assert!(body.contains("Analysis of code from: a.py\nModel: o1-preview\nStatus: success\n"));
        assert!(body.contains("Tokens used: 1200"));
        assert!(body.ends_with("1. [ ] ISSUE LOW\nRename x\n"));
    }

    #[test]
    fn test_failed_result_keeps_detail() {
        let req = request(PromptTemplateId::Request);
        let result = AnalysisResult::timeout(Duration::from_secs(5));
        let body = render_result(&req, &result, &["src".to_string()]);
        assert!(body.starts_with("# Code Request Analysis\n\nFEATURE REQUEST:\nAdd logging\n\nCODE:\n\n"));
        assert!(body.contains("Status: timeout"));
        assert!(body.contains("_No analysis produced: No response after 5.0s_"));
    }

    #[test]
    fn test_nothing_to_write() {
        let dir = TempDir::new().unwrap();
        let writer = FsResultWriter::new(dir.path().join("never"));
        let run_id = RunId::new();
        let written = writer
            .write(&RunArtifacts {
                run_id: &run_id,
                timestamp: timestamp(),
                inputs: &[],
                document: None,
                request: None,
                result: None,
            })
            .unwrap();
        assert!(written.is_empty());
        assert!(!dir.path().join("never").exists());
    }

    #[test]
    fn test_tree_report_replaces_previous() {
        let project = TempDir::new().unwrap();
        fs::write(project.path().join("a.py"), "a = 1\n").unwrap();
        let reporter = StructureReporter::new(
            project.path(),
            IgnoreMatcher::new(project.path(), Vec::<String>::new()).unwrap(),
        );
        let writer = FsResultWriter::new(project.path().join(".neurolora"));

        let first = writer.write_tree_report(&reporter.analyze(Path::new(".")).unwrap()).unwrap();
        fs::write(project.path().join("b.py"), "b = 2\n").unwrap();
        // the report file itself sits under an ignored directory
        let second = writer.write_tree_report(&reporter.analyze(Path::new(".")).unwrap()).unwrap();

        assert_eq!(first, second);
        assert_eq!(names(&[second.clone()]), vec![TREE_REPORT_FILE.to_string()]);
        let body = fs::read_to_string(&second).unwrap();
        assert!(body.contains("├── b.py ("));
        assert!(body.contains("| Files | 2 |"));
    }
}
