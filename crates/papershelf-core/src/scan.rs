//! Keeping the library in step with the documents on disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::library::Library;
use crate::paper::{Paper, PathPolicy};
use crate::PaperId;

/// What [`rescan`] found
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RescanReport {
    /// Documents no paper refers to, relative to the root
    pub new_files: Vec<PathBuf>,
    /// Papers whose document was found elsewhere and whose path was corrected
    pub relocated: Vec<PaperId>,
    /// Papers whose document is gone; flagged for revision
    pub missing: Vec<PaperId>,
    /// `(duplicate, first seen)` pairs of documents sharing a file name
    pub clashes: Vec<(PathBuf, PathBuf)>,
    /// Papers whose record changed when their BibTeX was parsed again
    pub rebuilt: usize,
}

impl RescanReport {
    /// Whether the library was modified
    pub fn changed(&self) -> bool {
        !self.relocated.is_empty() || !self.missing.is_empty() || self.rebuilt > 0
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Every accepted document under the root, relative to it and sorted. Hidden files and
/// directories are skipped; unreadable directories are logged and skipped.
pub fn discover_documents(policy: &PathPolicy) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![PathBuf::new()];

    while let Some(relative) = pending.pop() {
        let dir = policy.root().join(&relative);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "skipping unreadable directory");
                continue;
            }
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if is_hidden(name) {
                continue;
            }
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                pending.push(relative.join(name));
            } else if policy.accepts(name) && entry.path().is_file() {
                found.push(relative.join(name));
            }
        }
    }

    found.sort();
    found
}

/// Title guess for an imported document: its file name without the document extension
fn title_from_file_name(name: &str, policy: &PathPolicy) -> String {
    let lower = name.to_lowercase();
    policy
        .extensions()
        .iter()
        .find(|ext| lower.ends_with(ext.as_str()))
        .and_then(|ext| name.get(..name.len().checked_sub(ext.len())?))
        .unwrap_or(name)
        .to_string()
}

/// Add a paper for each document, flagged for revision. Paths that are not accepted
/// documents under the root, and documents that duplicate a stored paper, are skipped.
pub fn import_files<P: AsRef<Path>>(
    library: &mut Library,
    policy: &PathPolicy,
    paths: &[P],
) -> Vec<PaperId> {
    let mut added = Vec::new();

    for raw in paths {
        let raw = raw.as_ref();
        let mut paper = Paper::new();
        paper.set_path(&raw.to_string_lossy(), policy);
        let Some(name) = paper.file_name() else {
            warn!(path = %raw.display(), "not a document under the library root");
            continue;
        };
        let title = title_from_file_name(name, policy);
        paper.bib.set_title(&title);
        paper.needs_revision = true;

        if let Some(existing) = library.search_duplicate(&paper) {
            debug!(path = %raw.display(), existing, "skipping duplicate document");
            continue;
        }
        added.push(library.add_paper(paper));
    }

    info!(count = added.len(), "imported documents");
    added
}

/// Compare the library with the documents under the root.
///
/// When two documents, or two stored papers, share a file name nothing is changed and the
/// clashes are reported.
/// Otherwise moved documents get their paths corrected, papers without a document are
/// flagged for revision, and stored BibTeX is parsed again with the current venue aliases.
pub fn rescan(library: &mut Library, policy: &PathPolicy) -> RescanReport {
    let mut report = RescanReport::default();

    let mut stored: BTreeMap<String, (PaperId, PathBuf)> = BTreeMap::new();
    for paper in library.papers() {
        let (Some(name), Some(id)) = (paper.file_name(), paper.id()) else {
            continue;
        };
        match stored.get(name) {
            Some((_, first)) => report
                .clashes
                .push((PathBuf::from(paper.path()), first.clone())),
            None => {
                stored.insert(name.to_string(), (id, PathBuf::from(paper.path())));
            }
        }
    }

    let mut on_disk: BTreeMap<String, PathBuf> = BTreeMap::new();
    for path in discover_documents(policy) {
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        match on_disk.get(&name) {
            Some(first) => report.clashes.push((path.clone(), first.clone())),
            None => {
                if !stored.contains_key(&name) {
                    report.new_files.push(path.clone());
                }
                on_disk.insert(name, path);
            }
        }
    }

    if !report.clashes.is_empty() {
        warn!(count = report.clashes.len(), "documents share file names, library left unchanged");
        return report;
    }

    for (name, (id, _)) in &stored {
        match on_disk.get(name) {
            Some(found) => {
                let found = found.to_string_lossy();
                if library.relocate(*id, &found).unwrap_or(false) {
                    report.relocated.push(*id);
                }
            }
            None => {
                if library.set_needs_revision(*id, true).is_ok() {
                    report.missing.push(*id);
                }
            }
        }
    }

    let sources: Vec<(PaperId, String)> = library
        .papers()
        .filter(|paper| !paper.bib.source().is_empty())
        .filter_map(|paper| Some((paper.id()?, paper.bib.source().to_string())))
        .collect();
    for (id, source) in sources {
        match library.parse_bib(&source) {
            Ok(bib) => {
                if library.revise_bib(id, &bib).unwrap_or(false) {
                    report.rebuilt += 1;
                }
            }
            Err(err) => warn!(id, error = %err, "stored BibTeX no longer parses"),
        }
    }

    info!(
        new = report.new_files.len(),
        relocated = report.relocated.len(),
        missing = report.missing.len(),
        rebuilt = report.rebuilt,
        "rescanned library"
    );
    report
}

/// Delete documents from disk, skipping anything that is not a file. Returns how many
/// were deleted.
pub fn remove_documents<P: AsRef<Path>>(paths: &[P]) -> usize {
    let mut deleted = 0;
    for path in paths {
        let path = path.as_ref();
        if !path.is_file() {
            continue;
        }
        match fs::remove_file(path) {
            Ok(()) => {
                debug!(path = %path.display(), "deleted document");
                deleted += 1;
            }
            Err(err) => warn!(path = %path.display(), error = %err, "could not delete document"),
        }
    }
    deleted
}
