//! Configuration for papershelf
//!
//! A library lives in a root directory holding the documents, the snapshot and the venue
//! alias table. Settings come from `<root>/papershelf.toml` when present, otherwise from
//! the user's config directory, otherwise from the defaults below.
//!
//! ```toml
//! [library]
//! root = "/home/me/papers"
//! snapshot_file = "library.json"
//! venue_file = "conference.dat"
//! extensions = [".pdf", ".djvu"]
//! delete_removed_files = false
//!
//! [query]
//! fuzzy = true
//! year_window = 1
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::paper::PathPolicy;
use crate::query::QueryOptions;

/// Name of the per-library config file inside the root
pub const LIBRARY_CONFIG_FILE: &str = "papershelf.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShelfConfig {
    pub library: LibraryConfig,
    pub query: QueryConfig,
}

/// Where the library lives and which files it manages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Directory holding the documents; stored paths are relative to it
    pub root: PathBuf,
    /// Snapshot file name, relative to the root
    pub snapshot_file: String,
    /// Venue alias table file name, relative to the root
    pub venue_file: String,
    /// File name suffixes that count as documents
    pub extensions: Vec<String>,
    /// Delete the documents of removed papers when saving
    pub delete_removed_files: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            snapshot_file: "library.json".to_string(),
            venue_file: "conference.dat".to_string(),
            extensions: vec![".pdf".to_string()],
            delete_removed_files: false,
        }
    }
}

/// Defaults for queries issued from the command line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub fuzzy: bool,
    pub year_window: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            fuzzy: true,
            year_window: 0,
        }
    }
}

/// `~/Documents/papers`, or `~/papers` without a documents directory
fn default_root() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_default()
        .join("papers")
}

/// Per-user config file, e.g. `~/.config/papershelf/config.toml`
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("papershelf").join("config.toml"))
}

impl ShelfConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Read and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config = Self::from_toml(&text)?;
        config.validate()?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Find the configuration for a library.
    ///
    /// With `root_override`, its `papershelf.toml` is consulted first and the root is
    /// pinned to the override whatever the file says.
    pub fn discover(root_override: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(root) = root_override {
            let local = root.join(LIBRARY_CONFIG_FILE);
            let mut config = if local.is_file() {
                Self::load(&local)?
            } else {
                Self::from_user_file()?
            };
            config.library.root = root.to_path_buf();
            return Ok(config);
        }

        let config = Self::from_user_file()?;
        let local = config.library.root.join(LIBRARY_CONFIG_FILE);
        if local.is_file() {
            let mut local_config = Self::load(&local)?;
            local_config.library.root = config.library.root;
            return Ok(local_config);
        }
        Ok(config)
    }

    fn from_user_file() -> Result<Self, ConfigError> {
        match user_config_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Write the config as `<root>/papershelf.toml`
    pub fn save_to_root(&self) -> Result<PathBuf, ConfigError> {
        fs::create_dir_all(&self.library.root)?;
        let path = self.library.root.join(LIBRARY_CONFIG_FILE);
        fs::write(&path, self.to_toml()?)?;
        info!(path = %path.display(), "wrote config");
        Ok(path)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.library.snapshot_file.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "snapshot_file must not be empty".to_string(),
            ));
        }

        if self.library.venue_file.trim().is_empty() {
            return Err(ConfigError::Invalid("venue_file must not be empty".to_string()));
        }

        if self.library.extensions.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one document extension is required".to_string(),
            ));
        }

        if let Some(bad) = self
            .library
            .extensions
            .iter()
            .find(|ext| !ext.starts_with('.') || ext.len() < 2)
        {
            return Err(ConfigError::Invalid(format!(
                "extension {bad:?} must look like \".pdf\""
            )));
        }

        Ok(())
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.library.root.join(&self.library.snapshot_file)
    }

    pub fn venue_path(&self) -> PathBuf {
        self.library.root.join(&self.library.venue_file)
    }

    pub fn path_policy(&self) -> PathPolicy {
        PathPolicy::new(&self.library.root, &self.library.extensions)
    }

    /// Query options carrying the configured defaults
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions::new()
            .fuzzy(self.query.fuzzy)
            .with_year_window(self.query.year_window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = ShelfConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.library.extensions, vec![".pdf".to_string()]);
        assert!(config.library.root.ends_with("papers"));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = ShelfConfig::from_toml(
            r#"
            [library]
            root = "/srv/papers"

            [query]
            year_window = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.library.root, PathBuf::from("/srv/papers"));
        assert_eq!(config.library.snapshot_file, "library.json");
        assert_eq!(config.query.year_window, 2);
        assert!(config.query.fuzzy);
        assert_eq!(config.snapshot_path(), PathBuf::from("/srv/papers/library.json"));
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = ShelfConfig::new();
        config.library.extensions.push(".djvu".to_string());
        config.library.delete_removed_files = true;
        let parsed = ShelfConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validate_rejects_bad_extensions() {
        let mut config = ShelfConfig::new();
        config.library.extensions = vec!["pdf".to_string()];
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.library.extensions.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_toml_is_a_parse_error() {
        let err = ShelfConfig::from_toml("[library\nroot = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_discover_pins_root_override() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(LIBRARY_CONFIG_FILE),
            "[library]\nroot = \"/elsewhere\"\nsnapshot_file = \"shelf.json\"\n",
        )
        .unwrap();

        let config = ShelfConfig::discover(Some(dir.path())).unwrap();
        assert_eq!(config.library.root, dir.path());
        assert_eq!(config.snapshot_path(), dir.path().join("shelf.json"));
    }

    #[test]
    fn test_save_to_root_writes_loadable_file() {
        let dir = TempDir::new().unwrap();
        let mut config = ShelfConfig::new();
        config.library.root = dir.path().to_path_buf();
        config.query.fuzzy = false;

        let path = config.save_to_root().unwrap();
        assert_eq!(ShelfConfig::load(&path).unwrap(), config);
    }
}
