//! papershelf-core: in-memory bibliographic index for a personal paper library
//!
//! The [`Library`] owns every [`Paper`] together with the indexes that make it searchable:
//! authors, venues, tags, projects, datasets, years and ratings. Each index holds id sets,
//! kept bidirectionally consistent with the papers by the library's mutation methods.
//!
//! # Example
//!
//! ```
//! use papershelf_core::{Library, Paper, QueryOptions};
//!
//! let mut library = Library::new();
//! library.register_venue_aliases([("nips", "neurips")]);
//!
//! let mut paper = Paper::new();
//! paper.bib.set_title("Attention Is All You Need");
//! paper.bib.set_authors(library.parse_authors("Vaswani, Ashish"));
//! paper.bib.set_venue("nips");
//! paper.bib.set_year(2017);
//! let id = library.add_paper(paper);
//!
//! let mut query = Paper::new();
//! query.bib.set_venue("neurips");
//! assert!(library.find_paper(&query, &QueryOptions::new()).contains(&id));
//! ```

pub mod author;
pub mod bib;
pub mod category;
pub mod config;
pub mod error;
pub mod ids;
pub mod library;
pub mod opener;
pub mod paper;
pub mod query;
pub mod scan;
pub mod snapshot;
pub mod venue;

/// Identifier of a stored paper
pub type PaperId = u32;

/// Sentinel year meaning "no year recorded"
pub const DEFAULT_YEAR: i32 = 1900;

/// Highest rating; 0 means unrated
pub const MAX_RATING: u8 = 5;

/// Catch-all venue every library carries
pub const OTHERS_VENUE: &str = "others";

pub use author::Author;
pub use bib::Bib;
pub use category::{Catalog, Category};
pub use config::{LibraryConfig, QueryConfig, ShelfConfig};
pub use error::{ConfigError, LibraryError, Result, ShelfError, SnapshotError};
pub use ids::IdAllocator;
pub use library::{Library, RevisionOutcome, Submission};
pub use opener::open_document;
pub use paper::{Paper, PaperState, PathPolicy};
pub use query::QueryOptions;
pub use scan::{discover_documents, import_files, remove_documents, rescan, RescanReport};
pub use snapshot::{load_snapshot, save_snapshot};
pub use venue::{Venue, VenueTable};
