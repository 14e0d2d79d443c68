//! The raw bibliographic fields a library record is built from.

use serde::{Deserialize, Serialize};

use crate::entry::{Entry, EntryType};
use crate::formatter::format_entry;
use crate::parser::{parse_entry, ParseError};

/// Whether a record appeared in proceedings or in a journal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationKind {
    #[default]
    Conference,
    Journal,
}

impl CitationKind {
    fn entry_type(self) -> EntryType {
        match self {
            Self::Conference => EntryType::InProceedings,
            Self::Journal => EntryType::Article,
        }
    }

    fn venue_field(self) -> &'static str {
        match self {
            Self::Conference => "booktitle",
            Self::Journal => "journal",
        }
    }
}

impl From<EntryType> for CitationKind {
    fn from(entry_type: EntryType) -> Self {
        if entry_type.is_proceedings() {
            Self::Conference
        } else {
            Self::Journal
        }
    }
}

/// Unnormalized title / author list / venue / year strings of one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Citation {
    pub title: String,
    pub authors: String,
    pub venue: String,
    pub year: String,
    pub kind: CitationKind,
}

impl Citation {
    /// Pull the citation fields out of a parsed entry. Braces are dropped and whitespace
    /// collapsed; missing fields come back empty.
    pub fn from_entry(entry: &Entry) -> Self {
        let field = |value: Option<&str>| value.map(clean_value).unwrap_or_default();
        Self {
            title: field(entry.title()),
            authors: field(entry.author()),
            venue: field(entry.venue()),
            year: field(entry.year()),
            kind: CitationKind::from(entry.entry_type),
        }
    }

    /// Render as a BibTeX entry under `cite_key`
    pub fn to_bibtex(&self, cite_key: &str) -> String {
        let entry = Entry::new(cite_key, self.kind.entry_type())
            .with_field("title", self.title.as_str())
            .with_field("author", self.authors.as_str())
            .with_field(self.kind.venue_field(), self.venue.as_str())
            .with_field("year", self.year.as_str());
        format_entry(&entry)
    }
}

/// Extract the citation fields of the first entry in `text`.
pub fn extract_citation(text: &str) -> Result<Citation, ParseError> {
    let entry = parse_entry(text)?;
    Ok(Citation::from_entry(&entry))
}

fn clean_value(value: &str) -> String {
    value
        .replace(['{', '}'], "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
