//! Multi-field paper queries.
//!
//! Each populated field of a query paper yields a candidate id set; the sets are
//! intersected. Within a field, every matching category contributes (union).

use std::collections::BTreeSet;

use crate::category::{fuzzy_match, Catalog};
use crate::library::Library;
use crate::paper::Paper;
use crate::venue::Venue;
use crate::{PaperId, DEFAULT_YEAR, OTHERS_VENUE};

/// How a query matches
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Substring matching in either direction instead of equality
    pub fuzzy: bool,
    /// Years on either side of the query year that also match
    pub year_window: u32,
    /// Only report papers from this set
    pub within: Option<BTreeSet<PaperId>>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fuzzy(mut self, fuzzy: bool) -> Self {
        self.fuzzy = fuzzy;
        self
    }

    pub fn with_year_window(mut self, window: u32) -> Self {
        self.year_window = window;
        self
    }

    pub fn within(mut self, ids: BTreeSet<PaperId>) -> Self {
        self.within = Some(ids);
        self
    }
}

fn union_of<'a>(categories: impl IntoIterator<Item = &'a BTreeSet<PaperId>>) -> BTreeSet<PaperId> {
    categories.into_iter().flatten().copied().collect()
}

fn find_labels(catalog: &Catalog, labels: &[String], fuzzy: bool) -> BTreeSet<PaperId> {
    union_of(
        labels
            .iter()
            .flat_map(|label| catalog.find(label, fuzzy))
            .map(|category| &category.papers),
    )
}

impl Library {
    /// Papers matching every populated field of `query`.
    ///
    /// Title, venue (unless `others`), year (when set), authors, tags, projects and
    /// datasets take part. A query with no populated field matches nothing.
    pub fn find_paper(&self, query: &Paper, options: &QueryOptions) -> BTreeSet<PaperId> {
        let fuzzy = options.fuzzy;
        let mut fields: Vec<BTreeSet<PaperId>> = Vec::new();

        if !query.bib.title().is_empty() {
            fields.push(self.find_title(query.bib.title(), fuzzy));
        }
        if query.bib.venue() != OTHERS_VENUE {
            let venues = self.find_venue(query.bib.venue(), fuzzy);
            fields.push(union_of(venues.iter().map(|venue| &venue.papers)));
        }
        if query.bib.has_year() {
            fields.push(self.find_year(query.bib.year(), options.year_window));
        }
        if !query.bib.authors().is_empty() {
            fields.push(find_labels(self.authors(), &query.bib.author_labels(), fuzzy));
        }
        if !query.tags().is_empty() {
            fields.push(find_labels(self.tags(), query.tags(), fuzzy));
        }
        if !query.projects().is_empty() {
            fields.push(find_labels(self.projects(), query.projects(), fuzzy));
        }
        if !query.datasets().is_empty() {
            fields.push(find_labels(self.datasets(), query.datasets(), fuzzy));
        }

        let mut fields = fields.into_iter();
        let Some(first) = fields.next() else {
            return BTreeSet::new();
        };
        let mut result = fields.fold(first, |acc, field| &acc & &field);

        if let Some(within) = &options.within {
            result.retain(|id| within.contains(id));
        }
        result
    }

    /// Papers whose title equals `text` (case-insensitive), or with `fuzzy` contains or is
    /// contained in it
    pub fn find_title(&self, text: &str, fuzzy: bool) -> BTreeSet<PaperId> {
        let text = text.trim().to_lowercase();
        if text.is_empty() {
            return BTreeSet::new();
        }
        self.papers
            .iter()
            .filter(|(_, paper)| {
                let title = paper.bib.title();
                if fuzzy {
                    fuzzy_match(title, &text)
                } else {
                    title == text
                }
            })
            .map(|(id, _)| *id)
            .collect()
    }

    /// Papers published within `window` years of `year`. The unset year matches nothing.
    pub fn find_year(&self, year: i32, window: u32) -> BTreeSet<PaperId> {
        if year <= DEFAULT_YEAR {
            return BTreeSet::new();
        }
        let window = i32::try_from(window).unwrap_or(i32::MAX);
        let low = year.saturating_sub(window);
        let high = year.saturating_add(window);
        union_of(self.years().range(low..=high).map(|(_, ids)| ids))
    }

    pub fn find_rating(&self, rating: u8) -> BTreeSet<PaperId> {
        self.ratings().get(&rating).cloned().unwrap_or_default()
    }

    pub fn find_venue(&self, text: &str, fuzzy: bool) -> Vec<&Venue> {
        self.venues().find(text, fuzzy)
    }

    pub fn find_author(&self, text: &str, fuzzy: bool) -> BTreeSet<PaperId> {
        let labels: Vec<String> = self
            .parse_authors(text)
            .iter()
            .map(|author| author.label())
            .collect();
        find_labels(self.authors(), &labels, fuzzy)
    }

    pub fn find_tag(&self, text: &str, fuzzy: bool) -> BTreeSet<PaperId> {
        find_labels(self.tags(), &self.parse_tags(text), fuzzy)
    }

    pub fn find_project(&self, text: &str, fuzzy: bool) -> BTreeSet<PaperId> {
        find_labels(self.projects(), &self.parse_projects(text), fuzzy)
    }

    pub fn find_dataset(&self, text: &str, fuzzy: bool) -> BTreeSet<PaperId> {
        find_labels(self.datasets(), &self.parse_datasets(text), fuzzy)
    }

    pub fn find_unread(&self) -> BTreeSet<PaperId> {
        self.filter_ids(|paper| !paper.has_read)
    }

    pub fn find_github(&self) -> BTreeSet<PaperId> {
        self.filter_ids(|paper| paper.has_github)
    }

    /// Papers flagged for review by an import or rescan
    pub fn find_to_revise(&self) -> BTreeSet<PaperId> {
        self.filter_ids(|paper| paper.needs_revision)
    }

    fn filter_ids(&self, keep: impl Fn(&Paper) -> bool) -> BTreeSet<PaperId> {
        self.papers
            .iter()
            .filter(|(_, paper)| keep(paper))
            .map(|(id, _)| *id)
            .collect()
    }
}
