use ignore::WalkBuilder;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::document::{CollectedDocument, CollectedFile, DEFAULT_TITLE, SkipReason, SkippedFile};
use super::ignore::IgnoreMatcher;
use super::language::language_tag;
use crate::ai::tokenizer::TokenEstimator;
use crate::constants::collection::{BINARY_SNIFF_LEN, MAX_FILE_SIZE};
use crate::context::RunContext;
use crate::types::{CollectionError, NeuroError, Result};

/// Walks input paths and assembles a [`CollectedDocument`]
pub struct Collector {
    root: PathBuf,
    matcher: Arc<IgnoreMatcher>,
    max_file_size: u64,
    estimator: TokenEstimator,
}

/// A file chosen by traversal, before its content is read
#[derive(Debug)]
struct Candidate {
    absolute: PathBuf,
    relative: PathBuf,
    external: bool,
}

impl Collector {
    pub fn new<P: AsRef<Path>>(root: P, matcher: IgnoreMatcher) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            matcher: Arc::new(matcher),
            max_file_size: MAX_FILE_SIZE,
            estimator: TokenEstimator::default(),
        }
    }

    /// Collector configured from the run's project root and collection settings
    pub fn from_context(ctx: &RunContext) -> Result<Self> {
        let matcher = IgnoreMatcher::for_project(&ctx.project_root, &ctx.config.collection)?;
        Ok(Self::new(&ctx.project_root, matcher).with_max_file_size(ctx.config.collection.max_file_size))
    }

    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Collect every retained file under `inputs` into one document
    ///
    /// Relative inputs resolve against the project root. Files appear
    /// directory-first, then alphabetically, regardless of input order.
    pub fn collect<P: AsRef<Path>>(&self, inputs: &[P]) -> Result<CollectedDocument> {
        let root = canonical(&self.root)?;

        let mut resolved = Vec::with_capacity(inputs.len());
        for input in inputs {
            let input = input.as_ref();
            let absolute = if input.is_absolute() {
                input.to_path_buf()
            } else {
                root.join(input)
            };
            let absolute = canonical(&absolute).map_err(|e| match e {
                NeuroError::Collection(mut err) => {
                    err.path = Some(input.to_path_buf());
                    NeuroError::Collection(err)
                }
                other => other,
            })?;
            resolved.push(absolute);
        }
        let external_base = external_base(&root, &resolved);

        let mut candidates = Vec::new();
        for absolute in resolved {
            let external = !absolute.starts_with(&root);
            let base = if external { &external_base } else { &root };

            if absolute.is_dir() {
                self.walk_dir(base, &absolute, external, &mut candidates)?;
            } else {
                let relative = relative_to(base, &absolute);
                if self.matcher.is_ignored(&relative, false) {
                    debug!("Ignoring explicit input {}", relative.display());
                    continue;
                }
                candidates.push(Candidate {
                    absolute,
                    relative,
                    external,
                });
            }
        }

        candidates.sort_by(|a, b| dir_first(&a.relative, &b.relative));
        candidates.dedup_by(|a, b| a.absolute == b.absolute);
        if disambiguate(&mut candidates) {
            candidates.sort_by(|a, b| dir_first(&a.relative, &b.relative));
        }

        let mut files = Vec::with_capacity(candidates.len());
        let mut skipped = Vec::new();
        for candidate in candidates {
            match self.read_candidate(&candidate)? {
                Ok(file) => files.push(file),
                Err(skip) => skipped.push(skip),
            }
        }

        if files.is_empty() {
            return Err(CollectionError::empty_selection().into());
        }

        info!(
            "Collected {} files ({} skipped)",
            files.len(),
            skipped.len()
        );
        Ok(CollectedDocument::assemble(
            DEFAULT_TITLE,
            files,
            skipped,
            &self.estimator,
        ))
    }

    fn walk_dir(&self, base: &Path, dir: &Path, external: bool, out: &mut Vec<Candidate>) -> Result<()> {
        let matcher = Arc::clone(&self.matcher);
        let filter_base = base.to_path_buf();

        let walker = WalkBuilder::new(dir)
            .standard_filters(false)
            .follow_links(false)
            .filter_entry(move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                let relative = relative_to(&filter_base, entry.path());
                // Pruned directories are never descended into
                !matcher.is_ignored(&relative, is_dir)
            })
            .build();

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

            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let absolute = entry.into_path();
            let relative = relative_to(base, &absolute);
            out.push(Candidate {
                absolute,
                relative,
                external,
            });
        }

        Ok(())
    }

    /// Outer error is fatal; inner error is a skip diagnostic
    fn read_candidate(&self, candidate: &Candidate) -> Result<std::result::Result<CollectedFile, SkippedFile>> {
        let display_path = to_forward_slashes(&candidate.relative);
        let skip = |reason: SkipReason| {
            warn!("Skipping {}: {}", display_path, reason);
            Ok(Err(SkippedFile {
                relative_path: display_path.clone(),
                reason,
            }))
        };

        let metadata = fs::metadata(&candidate.absolute).map_err(|e| io_to_collection(e, &candidate.relative))?;
        if metadata.len() > self.max_file_size {
            return skip(SkipReason::TooLarge);
        }

        let bytes = fs::read(&candidate.absolute).map_err(|e| io_to_collection(e, &candidate.relative))?;
        if looks_binary(&bytes) {
            return skip(SkipReason::Binary);
        }
        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(_) => return skip(SkipReason::NotUtf8),
        };

        let tag = language_tag(&candidate.relative);
        debug!("Collected {} ({})", display_path, tag);
        Ok(Ok(CollectedFile::new(display_path.clone(), tag, content)))
    }
}

// =============================================================================
// Path helpers
// =============================================================================

pub(super) fn canonical(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).map_err(|e| io_to_collection(e, path))
}

fn io_to_collection(err: io::Error, path: &Path) -> NeuroError {
    match err.kind() {
        ErrorKind::NotFound => CollectionError::not_found(path).into(),
        ErrorKind::PermissionDenied => CollectionError::permission_denied(path).into(),
        _ => NeuroError::Io(err),
    }
}

/// Base for inputs outside the project: the deepest directory holding all of
/// them, so an input directory keeps its own name in the relative path
fn external_base(root: &Path, resolved: &[PathBuf]) -> PathBuf {
    resolved
        .iter()
        .filter(|p| !p.starts_with(root))
        .map(|p| p.parent().unwrap_or(p).to_path_buf())
        .reduce(|acc, parent| common_ancestor(&acc, &parent))
        .unwrap_or_else(|| root.to_path_buf())
}

fn common_ancestor(a: &Path, b: &Path) -> PathBuf {
    a.components()
        .zip(b.components())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x)
        .collect()
}

/// An outside file whose relative path collides with a project file is
/// labelled by its full path instead. Returns whether anything was renamed.
fn disambiguate(candidates: &mut [Candidate]) -> bool {
    let mut counts: HashMap<PathBuf, usize> = HashMap::new();
    for candidate in candidates.iter() {
        *counts.entry(candidate.relative.clone()).or_default() += 1;
    }

    let mut renamed = false;
    for candidate in candidates.iter_mut() {
        if candidate.external && counts.get(&candidate.relative).is_some_and(|n| *n > 1) {
            candidate.relative = candidate
                .absolute
                .components()
                .filter(|c| matches!(c, Component::Normal(_)))
                .collect();
            renamed = true;
        }
    }
    renamed
}

pub(super) fn relative_to(base: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(base)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

pub(super) fn to_forward_slashes(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

pub(super) fn walk_error_path(err: &ignore::Error) -> Option<&Path> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            walk_error_path(err)
        }
        _ => None,
    }
}

/// NUL byte within the first [`BINARY_SNIFF_LEN`] bytes
pub(super) fn looks_binary(bytes: &[u8]) -> bool {
    bytes[..bytes.len().min(BINARY_SNIFF_LEN)].contains(&0)
}

/// Directory-first, then lexicographic, compared component by component
pub(super) fn dir_first(a: &Path, b: &Path) -> Ordering {
    let a_parts: Vec<_> = a.components().collect();
    let b_parts: Vec<_> = b.components().collect();
    // (is_file, name): directories sort before files at the same level
    fn key<'a>(parts: &[Component<'a>], i: usize) -> (bool, &'a std::ffi::OsStr) {
        (i + 1 == parts.len(), parts[i].as_os_str())
    }

    for i in 0..a_parts.len().min(b_parts.len()) {
        let ord = key(&a_parts, i).cmp(&key(&b_parts, i));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a_parts.len().cmp(&b_parts.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, rel: &str, content: &[u8]) {
        let path = dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn collector(dir: &TempDir, rules: &[&str]) -> Collector {
        let matcher = IgnoreMatcher::new(dir.path(), rules.iter().copied()).unwrap();
        Collector::new(dir.path(), matcher)
    }

    fn paths(doc: &CollectedDocument) -> Vec<&str> {
        doc.table_of_contents().collect()
    }

    #[test]
    fn test_ignored_explicit_file_is_dropped() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.py", b"print('a')\n");
        write(&dir, "b.md", b"# B\n");

        let doc = collector(&dir, &["*.md"]).collect(&["a.py", "b.md"]).unwrap();
        assert_eq!(paths(&doc), vec!["a.py"]);
        assert!(!doc.text().contains("b.md"));
    }

    #[test]
    fn test_directory_first_alphabetical_order() {
        let dir = TempDir::new().unwrap();
        write(&dir, "z.rs", b"z");
        write(&dir, "a.rs", b"a");
        write(&dir, "src/b.rs", b"b");
        write(&dir, "src/util/c.rs", b"c");
        write(&dir, "lib/d.rs", b"d");

        let doc = collector(&dir, &[]).collect(&["."]).unwrap();
        assert_eq!(
            paths(&doc),
            vec!["lib/d.rs", "src/util/c.rs", "src/b.rs", "a.rs", "z.rs"]
        );
    }

    #[test]
    fn test_order_independent_of_input_order_and_duplicates() {
        let dir = TempDir::new().unwrap();
        write(&dir, "src/a.rs", b"a");
        write(&dir, "main.rs", b"m");

        let c = collector(&dir, &[]);
        let one = c.collect(&["main.rs", "src"]).unwrap();
        let two = c.collect(&["src", "main.rs", "src/a.rs"]).unwrap();
        assert_eq!(paths(&one), vec!["src/a.rs", "main.rs"]);
        assert_eq!(one.text(), two.text());
    }

    #[test]
    fn test_recollection_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        write(&dir, "pkg/mod.py", b"import os\n");
        write(&dir, "setup.py", b"setup()\n");

        let c = collector(&dir, &[]);
        let first = c.collect(&["."]).unwrap();
        let second = c.collect(&["."]).unwrap();
        assert_eq!(first.text(), second.text());
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn test_ignored_directory_is_pruned() {
        let dir = TempDir::new().unwrap();
        write(&dir, "keep.rs", b"k");
        write(&dir, "generated/out.rs", b"g");
        write(&dir, "generated/deep/more.rs", b"g");
        write(&dir, "node_modules/x/index.js", b"x");

        let doc = collector(&dir, &["generated/"]).collect(&["."]).unwrap();
        assert_eq!(paths(&doc), vec!["keep.rs"]);
    }

    #[test]
    fn test_negation_reincludes_file() {
        let dir = TempDir::new().unwrap();
        write(&dir, "notes.md", b"n");
        write(&dir, "README.md", b"r");

        let doc = collector(&dir, &["*.md", "!README.md"]).collect(&["."]).unwrap();
        assert_eq!(paths(&doc), vec!["README.md"]);
    }

    #[test]
    fn test_binary_and_oversize_files_skipped_with_diagnostic() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.rs", b"fn a() {}\n");
        write(&dir, "logo.png", &[0x89, b'P', b'N', b'G', 0, 0, 1]);
        write(&dir, "latin1.txt", &[b'c', b'a', b'f', 0xE9]);
        write(&dir, "big.txt", &vec![b'x'; 64]);

        let doc = collector(&dir, &[]).with_max_file_size(32).collect(&["."]).unwrap();
        assert_eq!(paths(&doc), vec!["a.rs"]);

        let mut reasons: Vec<_> = doc
            .skipped()
            .iter()
            .map(|s| (s.relative_path.as_str(), s.reason))
            .collect();
        reasons.sort();
        assert_eq!(
            reasons,
            vec![
                ("big.txt", SkipReason::TooLarge),
                ("latin1.txt", SkipReason::NotUtf8),
                ("logo.png", SkipReason::Binary),
            ]
        );
    }

    #[test]
    fn test_missing_input_is_not_found() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.rs", b"a");

        let err = collector(&dir, &[]).collect(&["a.rs", "missing.rs"]).unwrap_err();
        match err {
            NeuroError::Collection(e) => {
                assert_eq!(e.kind, crate::types::CollectionErrorKind::NotFound);
                assert_eq!(e.path.as_deref(), Some(Path::new("missing.rs")));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_everything_filtered_is_empty_selection() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.md", b"a");

        let err = collector(&dir, &["*.md"]).collect(&["."]).unwrap_err();
        assert!(matches!(
            err,
            NeuroError::Collection(ref e) if e.kind == crate::types::CollectionErrorKind::EmptySelection
        ));
    }

    #[test]
    fn test_language_and_annotations_rendered() {
        let dir = TempDir::new().unwrap();
        write(&dir, "src/lib.rs", b"pub fn f() {}\n");
        write(&dir, "data.unknownext", b"?\n");

        let doc = collector(&dir, &[]).collect(&["."]).unwrap();
        assert!(doc.text().contains("### src/lib.rs (rust) {#src-lib-rs}"));
        assert!(doc.text().contains("### data.unknownext (text)"));
        assert_eq!(doc.files()[0].line_count, 1);
    }

    #[test]
    fn test_outside_inputs_keep_distinct_paths() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.rs", b"a");
        let outside = TempDir::new().unwrap();
        write(&outside, "x/main.py", b"x = 1\n");
        write(&outside, "y/main.py", b"y = 2\n");

        let doc = collector(&dir, &[])
            .collect(&[outside.path().join("x/main.py"), outside.path().join("y/main.py")])
            .unwrap();
        assert_eq!(paths(&doc), vec!["x/main.py", "y/main.py"]);
        assert!(doc.text().contains("{#x-main-py}"));
        assert!(doc.text().contains("{#y-main-py}"));
    }

    #[test]
    fn test_outside_file_colliding_with_project_file_uses_full_path() {
        let dir = TempDir::new().unwrap();
        write(&dir, "main.py", b"inside = 1\n");
        let outside = TempDir::new().unwrap();
        write(&outside, "main.py", b"outside = 1\n");
        let external = fs::canonicalize(outside.path().join("main.py")).unwrap();

        let doc = collector(&dir, &[]).collect(&[PathBuf::from("main.py"), external.clone()]).unwrap();
        let toc = paths(&doc);
        assert_eq!(toc.len(), 2);
        assert!(toc.contains(&"main.py"));
        assert!(toc.contains(&to_forward_slashes(&external).as_str()));
    }

    #[test]
    fn test_dir_first_comparator() {
        let mut items = vec!["b.rs", "a/z.rs", "a.rs", "a/b/c.rs"];
        items.sort_by(|a, b| dir_first(Path::new(a), Path::new(b)));
        assert_eq!(items, vec!["a/b/c.rs", "a/z.rs", "a.rs", "b.rs"]);
    }

    proptest! {
        #[test]
        fn prop_dir_first_is_a_total_order(
            paths in proptest::collection::vec("[ab]{1,2}(/[ab]{1,2}){0,2}", 1..12),
        ) {
            let mut sorted = paths.clone();
            sorted.sort_by(|a, b| dir_first(Path::new(a), Path::new(b)));
            let mut again = sorted.clone();
            again.reverse();
            again.sort_by(|a, b| dir_first(Path::new(a), Path::new(b)));
            prop_assert_eq!(sorted, again);
        }
    }
}
