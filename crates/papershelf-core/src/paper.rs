//! Papers: a bibliographic record plus the local document and personal metadata.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::bib::Bib;
use crate::category::{join_labels, normalize_labels};
use crate::{PaperId, MAX_RATING};

/// Outcome of [`Paper::check_state`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperState {
    /// Ready to be stored
    Ok,
    /// No valid document path
    MissingPath,
    /// Title, authors or year missing
    MissingBibField,
}

/// Where documents live and which files count as documents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathPolicy {
    root: PathBuf,
    extensions: Vec<String>,
}

impl PathPolicy {
    /// `extensions` are matched case-insensitively against the end of the file name,
    /// e.g. `.pdf`.
    pub fn new(root: impl Into<PathBuf>, extensions: &[String]) -> Self {
        Self {
            root: root.into(),
            extensions: extensions.iter().map(|ext| ext.to_lowercase()).collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Whether a file name carries an accepted extension
    pub fn accepts(&self, file_name: &str) -> bool {
        let name = file_name.to_lowercase();
        self.extensions.iter().any(|ext| name.ends_with(ext.as_str()))
    }

    /// Normalize `raw` relative to the root and check it names an existing document.
    ///
    /// Absolute paths inside the root are made relative. Returns `None` for anything that
    /// is not an existing file with an accepted extension.
    pub fn resolve(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let mut normalized = lexical_normalize(Path::new(raw));
        if let Ok(inside) = normalized.strip_prefix(&self.root) {
            normalized = inside.to_path_buf();
        }

        let name = normalized.file_name()?.to_str()?;
        if !self.accepts(name) || !self.root.join(&normalized).is_file() {
            return None;
        }
        normalized.to_str().map(str::to_string)
    }

    /// Absolute location of a stored relative path
    pub fn absolute(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

/// Resolve `.` and `..` without touching the filesystem.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// A stored reference: bibliographic record, document path and personal metadata.
///
/// Fields that are normalized on write (path, labels, rating) are set through their
/// setters; `comment` and the flags take any value and are public.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    pub(crate) id: Option<PaperId>,
    pub bib: Bib,
    pub(crate) path: String,
    pub(crate) tags: Vec<String>,
    pub(crate) projects: Vec<String>,
    pub(crate) datasets: Vec<String>,
    pub comment: String,
    pub has_read: bool,
    pub has_github: bool,
    pub(crate) rating: u8,
    /// Imported or flagged by a rescan and not yet confirmed by the user
    pub needs_revision: bool,
}

impl Paper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id assigned by the library, `None` until the paper is added
    pub fn id(&self) -> Option<PaperId> {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: PaperId) {
        self.id = Some(id);
    }

    /// Document path relative to the library root; empty when unset or invalid
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Validate and store a document path; invalid input leaves the path empty.
    pub fn set_path(&mut self, raw: &str, policy: &PathPolicy) {
        self.path = policy.resolve(raw).unwrap_or_default();
    }

    /// File name part of the path
    pub fn file_name(&self) -> Option<&str> {
        Path::new(&self.path).file_name()?.to_str()
    }

    pub fn full_path(&self, policy: &PathPolicy) -> Option<PathBuf> {
        if self.path.is_empty() {
            None
        } else {
            Some(policy.absolute(&self.path))
        }
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn set_tags<S: AsRef<str>>(&mut self, labels: impl IntoIterator<Item = S>) {
        self.tags = normalize_labels(labels);
    }

    pub fn projects(&self) -> &[String] {
        &self.projects
    }

    pub fn set_projects<S: AsRef<str>>(&mut self, labels: impl IntoIterator<Item = S>) {
        self.projects = normalize_labels(labels);
    }

    pub fn datasets(&self) -> &[String] {
        &self.datasets
    }

    pub fn set_datasets<S: AsRef<str>>(&mut self, labels: impl IntoIterator<Item = S>) {
        self.datasets = normalize_labels(labels);
    }

    pub fn tags_text(&self) -> String {
        join_labels(&self.tags)
    }

    pub fn projects_text(&self) -> String {
        join_labels(&self.projects)
    }

    pub fn datasets_text(&self) -> String {
        join_labels(&self.datasets)
    }

    pub fn rating(&self) -> u8 {
        self.rating
    }

    /// Ratings outside `0..=MAX_RATING` reset to 0.
    pub fn set_rating(&mut self, rating: i64) {
        self.rating = match u8::try_from(rating) {
            Ok(value) if value <= MAX_RATING => value,
            _ => 0,
        };
    }

    pub fn set_rating_text(&mut self, raw: &str) {
        self.set_rating(raw.trim().parse().unwrap_or(0));
    }

    /// Whether the paper is complete enough to store.
    pub fn check_state(&self) -> PaperState {
        if self.path.is_empty() {
            PaperState::MissingPath
        } else if self.bib.title().is_empty()
            || self.bib.authors().is_empty()
            || !self.bib.has_year()
        {
            PaperState::MissingBibField
        } else {
            PaperState::Ok
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::author::Author;
    use std::fs;
    use tempfile::TempDir;

    fn policy(dir: &TempDir) -> PathPolicy {
        PathPolicy::new(dir.path(), &[".pdf".to_string(), ".txt".to_string()])
    }

    #[test]
    fn test_set_path_accepts_existing_document() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("cv")).unwrap();
        fs::write(dir.path().join("cv/resnet.PDF"), b"%PDF").unwrap();
        let policy = policy(&dir);

        let mut paper = Paper::new();
        paper.set_path("./cv/../cv/resnet.PDF", &policy);
        assert_eq!(paper.path(), Path::new("cv").join("resnet.PDF").to_str().unwrap());
        assert_eq!(paper.file_name(), Some("resnet.PDF"));

        let absolute = dir.path().join("cv/resnet.PDF");
        paper.set_path(absolute.to_str().unwrap(), &policy);
        assert_eq!(paper.full_path(&policy), Some(dir.path().join("cv").join("resnet.PDF")));
    }

    #[test]
    fn test_set_path_rejects_bad_input() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.md"), b"#").unwrap();
        let policy = policy(&dir);

        let mut paper = Paper::new();
        for raw in ["notes.md", "missing.pdf", "", "   "] {
            paper.set_path(raw, &policy);
            assert_eq!(paper.path(), "", "{raw:?} should be rejected");
        }
        assert_eq!(paper.full_path(&policy), None);
    }

    #[test]
    fn test_rating_range() {
        let mut paper = Paper::new();
        paper.set_rating(4);
        assert_eq!(paper.rating(), 4);
        paper.set_rating(6);
        assert_eq!(paper.rating(), 0);
        paper.set_rating(-1);
        assert_eq!(paper.rating(), 0);
        paper.set_rating_text("5");
        assert_eq!(paper.rating(), 5);
        paper.set_rating_text("five");
        assert_eq!(paper.rating(), 0);
    }

    #[test]
    fn test_label_setters_normalize() {
        let mut paper = Paper::new();
        paper.set_tags(["Vision", " vision ", "", "NLP"]);
        assert_eq!(paper.tags(), ["vision".to_string(), "nlp".to_string()]);
        assert_eq!(paper.tags_text(), "vision; nlp");
    }

    #[test]
    fn test_check_state() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.pdf"), b"%PDF").unwrap();
        let policy = policy(&dir);

        let mut paper = Paper::new();
        paper.bib.set_title("A");
        assert_eq!(paper.check_state(), PaperState::MissingPath);

        paper.set_path("a.pdf", &policy);
        assert_eq!(paper.check_state(), PaperState::MissingBibField);

        paper.bib.set_authors(vec![Author::new("doe", "")]);
        paper.bib.set_year(2020);
        assert_eq!(paper.check_state(), PaperState::Ok);
    }
}
