//! Error types for papershelf-core

use thiserror::Error;

use crate::PaperId;

/// Result type alias for papershelf operations
pub type Result<T> = std::result::Result<T, ShelfError>;

/// Main error type for papershelf operations
#[derive(Error, Debug)]
pub enum ShelfError {
    /// Index misuse
    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    /// Configuration loading or validation
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Snapshot persistence
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// BibTeX text could not be read
    #[error("BibTeX error: {0}")]
    Bibtex(#[from] papershelf_bibtex::ParseError),

    /// Filesystem access outside snapshot/config handling
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Caller bugs against the index. Bad user input never ends up here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LibraryError {
    #[error("Paper {0} is not in the library")]
    UnknownPaper(PaperId),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not encode TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Snapshot persistence errors
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed snapshot: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Could not replace snapshot: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Snapshot version {0} is newer than this build understands")]
    UnsupportedVersion(u32),
}
