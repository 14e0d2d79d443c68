//! Publication venues and the alias table that folds free-text spellings onto them.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{PaperId, OTHERS_VENUE};

lazy_static! {
    /// Column separator of the alias table: a tab or a run of two or more spaces
    static ref COLUMN_SEPARATOR: Regex = Regex::new(r"\t+| {2,}").unwrap();
}

/// A conference or journal
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    pub label: String,
    /// 1-based position for numbered selection
    pub index: usize,
    pub papers: BTreeSet<PaperId>,
}

impl Venue {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            index: 0,
            papers: BTreeSet::new(),
        }
    }
}

/// Registered venues plus the spelling → canonical label aliases.
///
/// Venues only come from alias registration and are never pruned; the `others` venue is
/// always present and catches every spelling nothing else matches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueTable {
    venues: BTreeMap<String, Venue>,
    aliases: BTreeMap<String, String>,
}

impl Default for VenueTable {
    fn default() -> Self {
        let mut table = Self {
            venues: BTreeMap::new(),
            aliases: BTreeMap::new(),
        };
        table
            .venues
            .insert(OTHERS_VENUE.to_string(), Venue::new(OTHERS_VENUE));
        table
            .aliases
            .insert(OTHERS_VENUE.to_string(), OTHERS_VENUE.to_string());
        table.reindex();
        table
    }
}

impl VenueTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, label: &str) -> Option<&Venue> {
        self.venues.get(label)
    }

    pub fn others(&self) -> &Venue {
        &self.venues[OTHERS_VENUE]
    }

    pub fn len(&self) -> usize {
        self.venues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }

    /// Venues ordered by index
    pub fn iter(&self) -> impl Iterator<Item = &Venue> {
        let mut venues: Vec<&Venue> = self.venues.values().collect();
        venues.sort_by_key(|venue| venue.index);
        venues.into_iter()
    }

    /// Venue at a 1-based index
    pub fn at_index(&self, index: usize) -> Option<&Venue> {
        self.venues.values().find(|venue| venue.index == index)
    }

    /// All `(spelling, canonical label)` pairs
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Canonical label an exact spelling is aliased to
    pub fn canonical(&self, spelling: &str) -> Option<&str> {
        self.aliases
            .get(&spelling.trim().to_lowercase())
            .map(String::as_str)
    }

    /// Register one `spelling → canonical` pair without renumbering.
    ///
    /// If `canonical` is itself a known spelling, `spelling` is pointed at the venue it
    /// already resolves to; otherwise a venue named `canonical` is created. When
    /// `spelling` was a venue of its own, that venue is folded into the target and its old
    /// label is returned.
    fn register(&mut self, spelling: &str, canonical: &str) -> Option<String> {
        let target = match self.aliases.get(canonical) {
            Some(existing) => existing.clone(),
            None => {
                self.venues
                    .entry(canonical.to_string())
                    .or_insert_with(|| Venue::new(canonical));
                canonical.to_string()
            }
        };
        debug!(spelling, canonical = %target, "registered venue alias");
        self.aliases.insert(spelling.to_string(), target.clone());
        self.aliases.insert(canonical.to_string(), target.clone());

        if spelling == target || spelling == OTHERS_VENUE {
            return None;
        }
        let folded = self.venues.remove(spelling)?;
        for label in self.aliases.values_mut() {
            if *label == folded.label {
                *label = target.clone();
            }
        }
        if let Some(venue) = self.venues.get_mut(&target) {
            venue.papers.extend(folded.papers);
        }
        debug!(venue = %folded.label, into = %target, "folded venue");
        Some(folded.label)
    }

    /// Register alias pairs in order, then renumber the venues.
    ///
    /// Returns `(old label, new label)` for every venue folded into another, in order.
    pub fn register_all<I, S>(&mut self, pairs: I) -> Vec<(String, String)>
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        let mut folded = Vec::new();
        for (spelling, canonical) in pairs {
            let spelling = spelling.as_ref().trim().to_lowercase();
            let canonical = canonical.as_ref().trim().to_lowercase();
            if spelling.is_empty() || canonical.is_empty() {
                continue;
            }
            if let Some(old) = self.register(&spelling, &canonical) {
                let new = self.aliases[&spelling].clone();
                folded.push((old, new));
            }
        }
        self.reindex();
        folded
    }

    /// Restore the `others` venue if a loaded table lacks it.
    pub(crate) fn ensure_others(&mut self) {
        if !self.venues.contains_key(OTHERS_VENUE) {
            self.venues
                .insert(OTHERS_VENUE.to_string(), Venue::new(OTHERS_VENUE));
            self.reindex();
        }
        self.aliases
            .entry(OTHERS_VENUE.to_string())
            .or_insert_with(|| OTHERS_VENUE.to_string());
    }

    /// `others` is 1, the rest follow in label order.
    fn reindex(&mut self) {
        let mut next = 2;
        for venue in self.venues.values_mut() {
            if venue.label == OTHERS_VENUE {
                venue.index = 1;
            } else {
                venue.index = next;
                next += 1;
            }
        }
    }

    /// Venues whose aliases match `text`: a spelling matches when it equals `text` or is
    /// contained in it, and with `fuzzy` also when it contains `text`.
    ///
    /// Candidates are ordered exact label first, then by longest matching spelling. Never
    /// empty: falls back to `others`.
    pub fn find(&self, text: &str, fuzzy: bool) -> Vec<&Venue> {
        let text = text.trim().to_lowercase();
        let mut hits: Vec<(&str, &Venue)> = Vec::new();

        if !text.is_empty() {
            for (spelling, label) in &self.aliases {
                let matched = text == *spelling
                    || text.contains(spelling.as_str())
                    || (fuzzy && spelling.contains(text.as_str()));
                if !matched {
                    continue;
                }
                let Some(venue) = self.venues.get(label) else {
                    continue;
                };
                match hits.iter().position(|(_, seen)| seen.label == venue.label) {
                    Some(at) if hits[at].0.len() < spelling.len() => hits[at].0 = spelling.as_str(),
                    Some(_) => {}
                    None => hits.push((spelling.as_str(), venue)),
                }
            }
        }

        hits.sort_by(|(a_spelling, a), (b_spelling, b)| {
            let a_exact = a.label == text;
            let b_exact = b.label == text;
            b_exact
                .cmp(&a_exact)
                .then(b_spelling.len().cmp(&a_spelling.len()))
                .then(a.index.cmp(&b.index))
        });

        if hits.is_empty() {
            return vec![self.others()];
        }
        hits.into_iter().map(|(_, venue)| venue).collect()
    }

    /// Canonical label for free-text venue input
    pub fn resolve(&self, text: &str) -> &str {
        self.find(text, false)
            .into_iter()
            .next()
            .map(|venue| venue.label.as_str())
            .unwrap_or(OTHERS_VENUE)
    }

    pub(crate) fn attach(&mut self, label: &str, id: PaperId) {
        if let Some(venue) = self.venues.get_mut(label) {
            venue.papers.insert(id);
        }
    }

    pub(crate) fn detach(&mut self, label: &str, id: PaperId) {
        if let Some(venue) = self.venues.get_mut(label) {
            venue.papers.remove(&id);
        }
    }
}

/// Parse a two-column alias table: `spelling<TAB>canonical` per line.
///
/// Columns may also be separated by two or more spaces, or by a single space when a line
/// holds exactly two words. Lines are lowercased; lines without exactly two columns are
/// skipped.
pub fn parse_alias_table(text: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    for (number, line) in text.lines().enumerate() {
        let line = line.trim().to_lowercase();
        if line.is_empty() {
            continue;
        }

        let mut columns: Vec<&str> = COLUMN_SEPARATOR
            .split(&line)
            .map(str::trim)
            .filter(|column| !column.is_empty())
            .collect();
        if columns.len() == 1 {
            columns = line.split_whitespace().collect();
        }

        match columns.as_slice() {
            [spelling, canonical] => pairs.push((spelling.to_string(), canonical.to_string())),
            _ => warn!(line = number + 1, "ignoring venue alias line without two columns"),
        }
    }

    pairs
}

/// Read and parse an alias file
pub fn load_alias_file(path: &Path) -> std::io::Result<Vec<(String, String)>> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_alias_table(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(venues: &[&Venue]) -> Vec<String> {
        venues.iter().map(|venue| venue.label.clone()).collect()
    }

    fn sample() -> VenueTable {
        let mut table = VenueTable::new();
        table.register_all([
            ("neurips", "neurips"),
            ("nips", "neurips"),
            ("cvpr", "cvpr"),
            ("cvpr workshops", "cvprw"),
        ]);
        table
    }

    #[test]
    fn test_default_table_has_others() {
        let table = VenueTable::new();
        assert_eq!(table.len(), 1);
        assert_eq!(table.others().index, 1);
        assert_eq!(table.resolve("anything"), OTHERS_VENUE);
        assert_eq!(table.resolve(""), OTHERS_VENUE);
    }

    #[test]
    fn test_aliases_share_one_venue() {
        let table = sample();
        assert_eq!(table.resolve("NIPS"), "neurips");
        assert_eq!(table.resolve("neurips"), "neurips");
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_alias_to_known_spelling_repoints() {
        let mut table = sample();
        table.register_all([("advances in neural information processing systems", "nips")]);
        assert_eq!(
            table.canonical("Advances in Neural Information Processing Systems"),
            Some("neurips")
        );
        assert!(table.get("nips").is_none());
    }

    #[test]
    fn test_reregistered_venue_is_folded() {
        let mut table = VenueTable::new();
        table.register_all([("nips", "nips"), ("nips proceedings", "nips")]);
        table.attach("nips", 0);

        let folded = table.register_all([("nips", "neurips")]);
        assert_eq!(folded, vec![("nips".to_string(), "neurips".to_string())]);
        assert!(table.get("nips").is_none());
        assert!(table.get("neurips").unwrap().papers.contains(&0));
        assert_eq!(table.canonical("nips proceedings"), Some("neurips"));
        assert_eq!(table.resolve("nips"), "neurips");
    }

    #[test]
    fn test_substring_prefers_longest_spelling() {
        let table = sample();
        assert_eq!(table.resolve("Proceedings of CVPR Workshops 2020"), "cvprw");
        assert_eq!(table.resolve("proceedings of cvpr 2020"), "cvpr");
    }

    #[test]
    fn test_fuzzy_find_matches_partial_input() {
        let table = sample();
        assert_eq!(labels(&table.find("cvpr w", false)), vec!["cvpr"]);
        assert_eq!(labels(&table.find("cvpr w", true)), vec!["cvprw", "cvpr"]);
        assert_eq!(labels(&table.find("iclr", true)), vec![OTHERS_VENUE]);
    }

    #[test]
    fn test_indexes_are_dense() {
        let table = sample();
        let order: Vec<_> = table.iter().map(|v| (v.index, v.label.as_str())).collect();
        assert_eq!(
            order,
            vec![(1, "others"), (2, "cvpr"), (3, "cvprw"), (4, "neurips")]
        );
        assert_eq!(table.at_index(4).unwrap().label, "neurips");
    }

    #[test]
    fn test_registering_others_keeps_fallback() {
        let mut table = VenueTable::new();
        table.attach(OTHERS_VENUE, 3);
        table.register_all([("misc", "others"), ("others", "others")]);
        assert_eq!(table.resolve("misc"), OTHERS_VENUE);
        assert!(table.others().papers.contains(&3));
    }

    #[test]
    fn test_parse_alias_table() {
        let text = "NeurIPS\tneurips\nNIPS    neurips\nicml icml\n\nbroken\nthree\tcolumns\there\n";
        assert_eq!(
            parse_alias_table(text),
            vec![
                ("neurips".to_string(), "neurips".to_string()),
                ("nips".to_string(), "neurips".to_string()),
                ("icml".to_string(), "icml".to_string()),
            ]
        );
    }
}
