//! Whole-library snapshots as versioned JSON.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::SnapshotError;
use crate::library::Library;

/// Snapshot format written by this build
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotOut<'a> {
    version: u32,
    saved_at: DateTime<Utc>,
    library: &'a Library,
}

#[derive(Deserialize)]
struct SnapshotIn {
    version: u32,
    library: Library,
}

/// Load a library; a missing file yields an empty library.
pub fn load_snapshot(path: &Path) -> Result<Library, SnapshotError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "no snapshot yet, starting empty");
            return Ok(Library::new());
        }
        Err(err) => return Err(err.into()),
    };

    let snapshot: SnapshotIn = serde_json::from_str(&text)?;
    if snapshot.version > SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion(snapshot.version));
    }

    let mut library = snapshot.library;
    library.after_load();
    info!(path = %path.display(), papers = library.len(), "loaded snapshot");
    Ok(library)
}

/// Write the whole library, replacing `path` atomically.
pub fn save_snapshot(path: &Path, library: &Library) -> Result<(), SnapshotError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let snapshot = SnapshotOut {
        version: SNAPSHOT_VERSION,
        saved_at: Utc::now(),
        library,
    };
    let data = serde_json::to_vec_pretty(&snapshot)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&data)?;
    tmp.persist(path)?;
    info!(path = %path.display(), papers = library.len(), "saved snapshot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::author::parse_author_list;
    use crate::paper::Paper;
    use tempfile::TempDir;

    fn sample_library() -> Library {
        let mut library = Library::new();
        library.register_venue_aliases([("nips", "neurips")]);
        let mut paper = Paper::new();
        paper.bib.set_title("Attention Is All You Need");
        paper.bib.set_authors(parse_author_list("Vaswani, Ashish"));
        paper.bib.set_venue("nips");
        paper.bib.set_year(2017);
        paper.set_tags(["nlp"]);
        paper.set_rating(5);
        let id = library.add_paper(paper);
        let other = library.add_paper(Paper::new());
        library.remove_paper(other);
        assert_eq!(id, 0);
        library
    }

    #[test]
    fn test_missing_file_loads_empty_library() {
        let dir = TempDir::new().unwrap();
        let library = load_snapshot(&dir.path().join("absent.json")).unwrap();
        assert!(library.is_empty());
        assert!(library.venues().get(crate::OTHERS_VENUE).is_some());
    }

    #[test]
    fn test_save_then_load_preserves_library() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("library.json");
        let library = sample_library();

        save_snapshot(&path, &library).unwrap();
        let loaded = load_snapshot(&path).unwrap();

        assert_eq!(loaded, library);
        assert!(loaded.audit().is_empty());
        assert_eq!(loaded.id_allocator().pooled().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("library.json");
        let library = serde_json::to_value(Library::new()).unwrap();
        let text = serde_json::json!({ "version": SNAPSHOT_VERSION + 1, "library": library });
        fs::write(&path, text.to_string()).unwrap();

        assert!(matches!(
            load_snapshot(&path),
            Err(SnapshotError::UnsupportedVersion(v)) if v == SNAPSHOT_VERSION + 1
        ));
    }

    #[test]
    fn test_garbage_is_a_format_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("library.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_snapshot(&path), Err(SnapshotError::Format(_))));
    }
}
