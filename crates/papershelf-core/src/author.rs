//! Author representation and author-list parsing

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// Separator between names in a BibTeX-style author list
    static ref AND_SEPARATOR: Regex = Regex::new(r"(?i)\s+and\s+").unwrap();
    /// Separator between the parts of one name
    static ref NAME_SEPARATOR: Regex = Regex::new(r"[,\s]+").unwrap();
}

/// An author of a paper. Authors are identified by [`Author::label`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Author {
    pub last_name: String,
    pub first_name: String,
}

impl Author {
    pub fn new(last_name: impl Into<String>, first_name: impl Into<String>) -> Self {
        Self {
            last_name: last_name.into(),
            first_name: first_name.into(),
        }
    }

    /// Parse one name written "Last, First" or "Last First".
    ///
    /// The name is lowercased and split on commas and whitespace; the first piece is the
    /// last name and the remaining pieces form the first name. Returns `None` for blank input.
    pub fn parse(name: &str) -> Option<Self> {
        let lowered = name.to_lowercase();
        let mut pieces = NAME_SEPARATOR
            .split(lowered.trim())
            .filter(|piece| !piece.is_empty());
        let last_name = pieces.next()?.to_string();
        let first_name = pieces.collect::<Vec<_>>().join(" ");
        Some(Self::new(last_name, first_name))
    }

    /// Canonical label: "last, first", or just "last"
    pub fn label(&self) -> String {
        if self.first_name.is_empty() {
            self.last_name.clone()
        } else {
            format!("{}, {}", self.last_name, self.first_name)
        }
    }
}

/// Split an author list into individual names.
///
/// A list containing `;` is split on `;`; otherwise a list containing ` and ` is split on
/// it; anything else is a single name.
pub fn split_author_list(text: &str) -> Vec<String> {
    let text = text.trim();
    let names: Vec<&str> = if text.contains(';') {
        text.split(';').collect()
    } else if AND_SEPARATOR.is_match(text) {
        AND_SEPARATOR.split(text).collect()
    } else {
        vec![text]
    };

    names
        .into_iter()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse an author list into authors, dropping repeated labels.
pub fn parse_author_list(text: &str) -> Vec<Author> {
    dedup_authors(split_author_list(text).iter().filter_map(|name| Author::parse(name)))
}

/// Keep the first author for each label, in order.
pub fn dedup_authors(authors: impl IntoIterator<Item = Author>) -> Vec<Author> {
    let mut out: Vec<Author> = Vec::new();
    for author in authors {
        if !out.iter().any(|seen| seen.label() == author.label()) {
            out.push(author);
        }
    }
    out
}

/// Join author labels with `separator` ("; " for editing, " and " for BibTeX)
pub fn format_author_list(authors: &[Author], separator: &str) -> String {
    authors
        .iter()
        .map(Author::label)
        .collect::<Vec<_>>()
        .join(separator)
}
