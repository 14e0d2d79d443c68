//! Bibliographic record: title, authors, venue and year, normalized on write.

use chrono::Datelike;
use papershelf_bibtex::{Citation, CitationKind};
use serde::{Deserialize, Serialize};

use crate::author::{dedup_authors, format_author_list, Author};
use crate::{DEFAULT_YEAR, OTHERS_VENUE};

/// Title, authors, venue and year of a paper.
///
/// Setters never fail: out-of-range or malformed input falls back to a default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bib {
    pub(crate) title: String,
    pub(crate) title_word: String,
    pub(crate) authors: Vec<Author>,
    pub(crate) venue: String,
    pub(crate) year: i32,
    pub(crate) source: String,
    pub(crate) kind: CitationKind,
}

impl Default for Bib {
    fn default() -> Self {
        Self {
            title: String::new(),
            title_word: String::new(),
            authors: Vec::new(),
            venue: OTHERS_VENUE.to_string(),
            year: DEFAULT_YEAR,
            source: String::new(),
            kind: CitationKind::default(),
        }
    }
}

impl Bib {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// First alphabetic word of the title as entered, lowercased
    pub fn title_word(&self) -> &str {
        &self.title_word
    }

    /// Store the title lowercased and cache its first alphabetic word.
    pub fn set_title(&mut self, raw: &str) {
        self.title = raw.trim().to_lowercase();
        self.title_word = raw
            .split(|c: char| !c.is_ascii_alphabetic())
            .find(|word| !word.is_empty())
            .unwrap_or_default()
            .to_lowercase();
    }

    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    /// Replace the author list with already-resolved authors; repeated labels are dropped.
    pub fn set_authors(&mut self, authors: Vec<Author>) {
        self.authors = dedup_authors(authors);
    }

    pub fn author_labels(&self) -> Vec<String> {
        self.authors.iter().map(Author::label).collect()
    }

    /// Authors as edited: `;`-separated labels
    pub fn authors_text(&self) -> String {
        format_author_list(&self.authors, "; ")
    }

    /// Canonical venue label
    pub fn venue(&self) -> &str {
        &self.venue
    }

    /// Store a venue label; blank input means `others`.
    pub fn set_venue(&mut self, label: &str) {
        let label = label.trim().to_lowercase();
        self.venue = if label.is_empty() {
            OTHERS_VENUE.to_string()
        } else {
            label
        };
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Whether a real year is recorded; [`DEFAULT_YEAR`] means none.
    pub fn has_year(&self) -> bool {
        self.year > DEFAULT_YEAR
    }

    /// Accept years in `DEFAULT_YEAR..=current year`, anything else resets to `DEFAULT_YEAR`.
    pub fn set_year(&mut self, year: i32) {
        self.year = if (DEFAULT_YEAR..=current_year()).contains(&year) {
            year
        } else {
            DEFAULT_YEAR
        };
    }

    pub fn set_year_text(&mut self, raw: &str) {
        self.set_year(raw.trim().parse().unwrap_or(DEFAULT_YEAR));
    }

    /// The BibTeX text the record was built from, if any
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn set_source(&mut self, text: &str) {
        self.source = text.trim().to_string();
    }

    pub fn kind(&self) -> CitationKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: CitationKind) {
        self.kind = kind;
    }

    /// `<first author last name><year><first title word>`, e.g. `vaswani2017attention`
    pub fn citation_key(&self) -> String {
        let mut key = self
            .authors
            .first()
            .map(|author| author.last_name.clone())
            .unwrap_or_default();
        if self.has_year() {
            key.push_str(&self.year.to_string());
        }
        key.push_str(&self.title_word);
        key.retain(|c| c.is_ascii_alphanumeric());
        key
    }

    /// Render as BibTeX: `@inproceedings` with `booktitle` or `@article` with `journal`.
    pub fn to_bibtex(&self) -> String {
        let citation = Citation {
            title: self.title.clone(),
            authors: format_author_list(&self.authors, " and "),
            venue: self.venue.clone(),
            year: if self.has_year() {
                self.year.to_string()
            } else {
                String::new()
            },
            kind: self.kind,
        };
        citation.to_bibtex(&self.citation_key())
    }

    /// One-line summary: title, authors and (when set) year
    pub fn short_string(&self) -> String {
        let mut parts = vec![self.title.clone(), format_author_list(&self.authors, "; ")];
        if self.has_year() {
            parts.push(self.year.to_string());
        }
        parts.retain(|part| !part.is_empty());
        parts.join(", ")
    }
}

fn current_year() -> i32 {
    chrono::Local::now().year()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_is_lowercased_and_word_cached() {
        let mut bib = Bib::new();
        bib.set_title("  3D Gaussian Splatting for Real-Time Rendering ");
        assert_eq!(bib.title(), "3d gaussian splatting for real-time rendering");
        assert_eq!(bib.title_word(), "d");

        bib.set_title("Attention Is All You Need");
        assert_eq!(bib.title_word(), "attention");
    }

    #[test]
    fn test_year_range() {
        let mut bib = Bib::new();
        bib.set_year(2017);
        assert_eq!(bib.year(), 2017);
        assert!(bib.has_year());

        bib.set_year(current_year() + 1);
        assert_eq!(bib.year(), DEFAULT_YEAR);
        bib.set_year(1899);
        assert_eq!(bib.year(), DEFAULT_YEAR);

        bib.set_year_text(" 2001 ");
        assert_eq!(bib.year(), 2001);
        bib.set_year_text("two thousand");
        assert!(!bib.has_year());

        bib.set_year(DEFAULT_YEAR);
        assert!(!bib.has_year());
    }

    #[test]
    fn test_blank_venue_is_others() {
        let mut bib = Bib::new();
        assert_eq!(bib.venue(), OTHERS_VENUE);
        bib.set_venue(" CVPR ");
        assert_eq!(bib.venue(), "cvpr");
        bib.set_venue("   ");
        assert_eq!(bib.venue(), OTHERS_VENUE);
    }

    #[test]
    fn test_citation_key_and_rendering() {
        let mut bib = Bib::new();
        bib.set_title("Attention Is All You Need");
        bib.set_authors(vec![
            Author::new("vaswani", "ashish"),
            Author::new("shazeer", "noam"),
        ]);
        bib.set_venue("neurips");
        bib.set_year(2017);

        assert_eq!(bib.citation_key(), "vaswani2017attention");

        let text = bib.to_bibtex();
        assert!(text.starts_with("@inproceedings{vaswani2017attention,"));
        assert!(text.contains("author = {vaswani, ashish and shazeer, noam}"));
        assert!(text.contains("booktitle = {neurips}"));
        assert!(text.contains("year = 2017"));

        bib.set_kind(CitationKind::Journal);
        assert!(bib.to_bibtex().contains("journal = {neurips}"));
    }

    #[test]
    fn test_short_string_omits_unset_year() {
        let mut bib = Bib::new();
        bib.set_title("Deep Learning");
        bib.set_authors(vec![Author::new("lecun", "yann")]);
        assert_eq!(bib.short_string(), "deep learning, lecun, yann");

        bib.set_year(2015);
        assert_eq!(bib.short_string(), "deep learning, lecun, yann, 2015");
    }

    #[test]
    fn test_set_authors_drops_repeats() {
        let mut bib = Bib::new();
        bib.set_authors(vec![Author::new("doe", "jane"), Author::new("doe", "jane")]);
        assert_eq!(bib.authors_text(), "doe, jane");
    }
}
