//! BibTeX parsing and formatting for papershelf
//!
//! Features:
//! - Nom-based parser that recovers from malformed entries
//! - `@string` macro expansion and `#` concatenation
//! - Citation extraction (title, authors, venue, year, kind) for the library index
//! - Formatting of entries back to BibTeX text

mod citation;
mod entry;
mod formatter;
pub mod parser;

pub use citation::{extract_citation, Citation, CitationKind};
pub use entry::{Entry, EntryType, Field};
pub use formatter::format_entry;
pub use parser::{parse_bibliography, parse_entry, Bibliography, ParseError, ParseIssue};
