//! Test fixture loading utilities

use std::fs;
use std::path::{Path, PathBuf};

use papershelf_core::{Library, Paper, PathPolicy};
use tempfile::TempDir;

/// Get the path to a fixture file
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_fixtures")
        .join(name)
}

/// A library with the fixture venue aliases registered
pub fn library_with_venues() -> Library {
    let pairs = papershelf_core::venue::load_alias_file(&fixture_path("conference.dat"))
        .unwrap_or_else(|e| panic!("Failed to load conference.dat: {e}"));
    let mut library = Library::new();
    library.register_venue_aliases(pairs);
    library
}

/// A temporary library root accepting `.pdf` documents
pub struct Shelf {
    pub dir: TempDir,
    pub policy: PathPolicy,
}

impl Shelf {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let policy = PathPolicy::new(dir.path(), &[".pdf".to_string()]);
        Self { dir, policy }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Create an empty document and return its relative path
    pub fn touch(&self, relative: &str) -> String {
        let path = self.dir.path().join(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
        fs::write(&path, b"%PDF-1.4").expect("write document");
        relative.to_string()
    }

    /// A complete paper backed by a fresh document
    pub fn paper(&self, library: &Library, file: &str, title: &str, authors: &str, year: i32) -> Paper {
        let mut paper = Paper::new();
        paper.set_path(&self.touch(file), &self.policy);
        paper.bib.set_title(title);
        paper.bib.set_authors(library.parse_authors(authors));
        paper.bib.set_year(year);
        paper
    }
}
