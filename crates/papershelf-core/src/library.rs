//! The in-memory index: papers by id plus every category, year and rating index.
//!
//! All mutation goes through [`Library`] so that category membership and the papers'
//! own fields stay in step: every category reachable from a paper lists the paper's id,
//! and every id a category lists belongs to a paper that references it.

use std::collections::{BTreeMap, BTreeSet};

use papershelf_bibtex::{extract_citation, ParseError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::author::{parse_author_list, Author};
use crate::bib::Bib;
use crate::category::{parse_labels, Catalog};
use crate::error::LibraryError;
use crate::ids::IdAllocator;
use crate::paper::{Paper, PaperState};
use crate::venue::VenueTable;
use crate::PaperId;

/// Result of [`Library::submit`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Submission {
    Added(PaperId),
    /// An existing paper already has this path, title or file name
    Duplicate(PaperId),
    Incomplete(PaperState),
}

/// Result of [`Library::submit_revision`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevisionOutcome {
    Revised,
    Unchanged,
    /// Another paper already has this path, title or file name
    Duplicate(PaperId),
    Incomplete(PaperState),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    pub(crate) papers: BTreeMap<PaperId, Paper>,
    authors: Catalog,
    tags: Catalog,
    projects: Catalog,
    datasets: Catalog,
    pub(crate) venues: VenueTable,
    years: BTreeMap<i32, BTreeSet<PaperId>>,
    ratings: BTreeMap<u8, BTreeSet<PaperId>>,
    ids: IdAllocator,
}

impl Default for Library {
    fn default() -> Self {
        Self {
            papers: BTreeMap::new(),
            authors: Catalog::new(),
            tags: Catalog::new(),
            projects: Catalog::new(),
            datasets: Catalog::new(),
            venues: VenueTable::new(),
            years: BTreeMap::new(),
            ratings: BTreeMap::new(),
            ids: IdAllocator::new(),
        }
    }
}

fn bucket_insert<K: Ord>(buckets: &mut BTreeMap<K, BTreeSet<PaperId>>, key: K, id: PaperId) {
    buckets.entry(key).or_default().insert(id);
}

fn bucket_remove<K: Ord>(buckets: &mut BTreeMap<K, BTreeSet<PaperId>>, key: &K, id: PaperId) {
    if let Some(ids) = buckets.get_mut(key) {
        ids.remove(&id);
        if ids.is_empty() {
            buckets.remove(key);
        }
    }
}

impl Library {
    /// An empty library holding only the `others` venue
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Accessors =====

    pub fn len(&self) -> usize {
        self.papers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }

    pub fn paper(&self, id: PaperId) -> Option<&Paper> {
        self.papers.get(&id)
    }

    /// Papers in ascending id order
    pub fn papers(&self) -> impl Iterator<Item = &Paper> {
        self.papers.values()
    }

    pub fn ids(&self) -> BTreeSet<PaperId> {
        self.papers.keys().copied().collect()
    }

    pub fn authors(&self) -> &Catalog {
        &self.authors
    }

    pub fn tags(&self) -> &Catalog {
        &self.tags
    }

    pub fn projects(&self) -> &Catalog {
        &self.projects
    }

    pub fn datasets(&self) -> &Catalog {
        &self.datasets
    }

    pub fn venues(&self) -> &VenueTable {
        &self.venues
    }

    pub fn years(&self) -> &BTreeMap<i32, BTreeSet<PaperId>> {
        &self.years
    }

    pub fn ratings(&self) -> &BTreeMap<u8, BTreeSet<PaperId>> {
        &self.ratings
    }

    pub fn id_allocator(&self) -> &IdAllocator {
        &self.ids
    }

    // ===== Free-text resolution =====

    /// Authors named in `text`. Authors are identified by label, so a name that is
    /// already indexed resolves to the same author every time.
    pub fn parse_authors(&self, text: &str) -> Vec<Author> {
        parse_author_list(text)
    }

    /// Canonical venue label for `text`, `others` when nothing matches
    pub fn parse_venue(&self, text: &str) -> String {
        self.venues.resolve(text).to_string()
    }

    pub fn parse_tags(&self, text: &str) -> Vec<String> {
        parse_labels(text)
    }

    pub fn parse_projects(&self, text: &str) -> Vec<String> {
        parse_labels(text)
    }

    pub fn parse_datasets(&self, text: &str) -> Vec<String> {
        parse_labels(text)
    }

    /// Build a record from BibTeX text, resolving its authors and venue.
    pub fn parse_bib(&self, text: &str) -> Result<Bib, ParseError> {
        let citation = extract_citation(text)?;
        let mut bib = Bib::new();
        bib.set_source(text);
        bib.set_kind(citation.kind);
        bib.set_title(&citation.title);
        bib.set_authors(self.parse_authors(&citation.authors));
        bib.set_venue(&self.parse_venue(&citation.venue));
        bib.set_year_text(&citation.year);
        Ok(bib)
    }

    /// Register venue spellings (`spelling → canonical`) and renumber the venues.
    ///
    /// A venue whose label becomes an alias of another is merged into it, and its papers
    /// are relabelled.
    pub fn register_venue_aliases<I, S>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        for (old, new) in self.venues.register_all(pairs) {
            for paper in self.papers.values_mut() {
                if paper.bib.venue == old {
                    paper.bib.venue = new.clone();
                }
            }
        }
    }

    // ===== Index maintenance =====

    /// Store `paper` under a fresh id and index it. Returns the id.
    pub fn add_paper(&mut self, mut paper: Paper) -> PaperId {
        let papers = &self.papers;
        let id = self.ids.allocate(|id| papers.contains_key(&id));
        paper.assign_id(id);

        let venue = self.venues.resolve(paper.bib.venue()).to_string();
        paper.bib.set_venue(&venue);
        self.venues.attach(&venue, id);

        if paper.bib.has_year() {
            bucket_insert(&mut self.years, paper.bib.year(), id);
        }
        if paper.rating() > 0 {
            bucket_insert(&mut self.ratings, paper.rating(), id);
        }
        for label in paper.bib.author_labels() {
            self.authors.attach(&label, id);
        }
        for label in &paper.tags {
            self.tags.attach(label, id);
        }
        for label in &paper.projects {
            self.projects.attach(label, id);
        }
        for label in &paper.datasets {
            self.datasets.attach(label, id);
        }

        debug!(id, title = paper.bib.title(), "added paper");
        self.papers.insert(id, paper);
        id
    }

    /// Detach and drop a paper, freeing its id. Unknown ids are ignored.
    pub fn remove_paper(&mut self, id: PaperId) -> Option<Paper> {
        let paper = self.papers.remove(&id)?;

        if paper.bib.has_year() {
            bucket_remove(&mut self.years, &paper.bib.year(), id);
        }
        self.venues.detach(paper.bib.venue(), id);
        for label in paper.bib.author_labels() {
            self.authors.detach(&label, id);
        }
        for label in &paper.tags {
            self.tags.detach(label, id);
        }
        for label in &paper.projects {
            self.projects.detach(label, id);
        }
        for label in &paper.datasets {
            self.datasets.detach(label, id);
        }
        if paper.rating() > 0 {
            bucket_remove(&mut self.ratings, &paper.rating(), id);
        }

        self.ids.free(id);
        debug!(id, "removed paper");
        Some(paper)
    }

    /// Apply the bibliographic part of a revision. Returns whether anything changed.
    pub fn revise_bib(&mut self, id: PaperId, bib: &Bib) -> Result<bool, LibraryError> {
        let stored = self
            .papers
            .get_mut(&id)
            .ok_or(LibraryError::UnknownPaper(id))?;
        let mut changed = false;

        if stored.bib.source != bib.source {
            stored.bib.source = bib.source.clone();
            changed = true;
        }

        if stored.bib.kind != bib.kind {
            stored.bib.kind = bib.kind;
            changed = true;
        }

        if stored.bib.title != bib.title || stored.bib.title_word != bib.title_word {
            stored.bib.title = bib.title.clone();
            stored.bib.title_word = bib.title_word.clone();
            changed = true;
        }

        if stored.bib.year != bib.year {
            if stored.bib.has_year() {
                bucket_remove(&mut self.years, &stored.bib.year, id);
            }
            if bib.has_year() {
                bucket_insert(&mut self.years, bib.year, id);
            }
            stored.bib.year = bib.year;
            changed = true;
        }

        let venue = self.venues.resolve(&bib.venue).to_string();
        if stored.bib.venue != venue {
            self.venues.detach(&stored.bib.venue, id);
            self.venues.attach(&venue, id);
            stored.bib.venue = venue;
            changed = true;
        }

        let old_authors = stored.bib.author_labels();
        let new_authors = bib.author_labels();
        if old_authors != new_authors {
            self.authors.apply_diff(id, &old_authors, &new_authors);
            stored.bib.authors = bib.authors.clone();
            changed = true;
        }

        if changed {
            debug!(id, "revised bibliographic record");
        }
        Ok(changed)
    }

    /// Bring the stored paper `id` in line with `incoming`, touching only the index entries
    /// of fields that differ. Returns whether anything changed; the id never changes.
    pub fn revise_paper(&mut self, id: PaperId, incoming: &Paper) -> Result<bool, LibraryError> {
        let mut changed = self.revise_bib(id, &incoming.bib)?;
        let stored = self
            .papers
            .get_mut(&id)
            .ok_or(LibraryError::UnknownPaper(id))?;

        if stored.path != incoming.path {
            stored.path = incoming.path.clone();
            changed = true;
        }

        if stored.tags != incoming.tags {
            self.tags.apply_diff(id, &stored.tags, &incoming.tags);
            stored.tags = incoming.tags.clone();
            changed = true;
        }

        if stored.projects != incoming.projects {
            self.projects.apply_diff(id, &stored.projects, &incoming.projects);
            stored.projects = incoming.projects.clone();
            changed = true;
        }

        if stored.datasets != incoming.datasets {
            self.datasets.apply_diff(id, &stored.datasets, &incoming.datasets);
            stored.datasets = incoming.datasets.clone();
            changed = true;
        }

        if stored.rating != incoming.rating {
            if stored.rating > 0 {
                bucket_remove(&mut self.ratings, &stored.rating, id);
            }
            if incoming.rating > 0 {
                bucket_insert(&mut self.ratings, incoming.rating, id);
            }
            stored.rating = incoming.rating;
            changed = true;
        }

        if stored.comment != incoming.comment {
            stored.comment = incoming.comment.clone();
            changed = true;
        }

        if stored.has_read != incoming.has_read {
            stored.has_read = incoming.has_read;
            changed = true;
        }

        if stored.has_github != incoming.has_github {
            stored.has_github = incoming.has_github;
            changed = true;
        }

        if stored.needs_revision != incoming.needs_revision {
            stored.needs_revision = incoming.needs_revision;
            changed = true;
        }

        Ok(changed)
    }

    /// Point a paper at an already-validated document path.
    pub fn relocate(&mut self, id: PaperId, path: &str) -> Result<bool, LibraryError> {
        let stored = self
            .papers
            .get_mut(&id)
            .ok_or(LibraryError::UnknownPaper(id))?;
        if stored.path == path {
            return Ok(false);
        }
        debug!(id, from = %stored.path, to = path, "relocated paper");
        stored.path = path.to_string();
        Ok(true)
    }

    pub fn set_needs_revision(&mut self, id: PaperId, flag: bool) -> Result<bool, LibraryError> {
        let stored = self
            .papers
            .get_mut(&id)
            .ok_or(LibraryError::UnknownPaper(id))?;
        let changed = stored.needs_revision != flag;
        stored.needs_revision = flag;
        Ok(changed)
    }

    // ===== Duplicates =====

    /// Every stored paper sharing the candidate's path, title or file name, by ascending id.
    /// Empty paths and titles never match.
    pub fn find_duplicates(&self, candidate: &Paper) -> Vec<PaperId> {
        let path = candidate.path();
        let title = candidate.bib.title();
        let file_name = candidate.file_name();

        self.papers
            .iter()
            .filter(|(_, paper)| {
                (!path.is_empty() && paper.path() == path)
                    || (!title.is_empty() && paper.bib.title() == title)
                    || (file_name.is_some() && paper.file_name() == file_name)
            })
            .map(|(id, _)| *id)
            .collect()
    }

    /// First stored paper that [`find_duplicates`](Self::find_duplicates) reports
    pub fn search_duplicate(&self, candidate: &Paper) -> Option<PaperId> {
        self.find_duplicates(candidate).into_iter().next()
    }

    // ===== Checked workflows =====

    /// Add a paper entered by the user: it must be complete and not a duplicate.
    pub fn submit(&mut self, mut paper: Paper) -> Submission {
        let state = paper.check_state();
        if state != PaperState::Ok {
            return Submission::Incomplete(state);
        }
        if let Some(existing) = self.search_duplicate(&paper) {
            return Submission::Duplicate(existing);
        }
        paper.needs_revision = false;
        Submission::Added(self.add_paper(paper))
    }

    /// Revise a paper from user input. A confirmed revision clears `needs_revision`.
    pub fn submit_revision(
        &mut self,
        id: PaperId,
        mut paper: Paper,
    ) -> Result<RevisionOutcome, LibraryError> {
        if !self.papers.contains_key(&id) {
            return Err(LibraryError::UnknownPaper(id));
        }

        let state = paper.check_state();
        if state == PaperState::MissingPath {
            return Ok(RevisionOutcome::Incomplete(state));
        }
        if let Some(other) = self
            .find_duplicates(&paper)
            .into_iter()
            .find(|other| *other != id)
        {
            return Ok(RevisionOutcome::Duplicate(other));
        }
        if state != PaperState::Ok {
            return Ok(RevisionOutcome::Incomplete(state));
        }

        paper.needs_revision = false;
        if self.revise_paper(id, &paper)? {
            Ok(RevisionOutcome::Revised)
        } else {
            Ok(RevisionOutcome::Unchanged)
        }
    }

    /// A copy of a stored paper for editing and resubmitting
    pub fn draft(&self, id: PaperId) -> Option<Paper> {
        self.papers.get(&id).cloned()
    }

    // ===== Consistency =====

    /// Check that the indexes agree with the papers. Returns one message per violation.
    pub fn audit(&self) -> Vec<String> {
        let mut problems = Vec::new();

        let kinds: [(&str, &Catalog, fn(&Paper) -> Vec<String>); 4] = [
            ("author", &self.authors, |p: &Paper| p.bib.author_labels()),
            ("tag", &self.tags, |p: &Paper| p.tags.clone()),
            ("project", &self.projects, |p: &Paper| p.projects.clone()),
            ("dataset", &self.datasets, |p: &Paper| p.datasets.clone()),
        ];

        for (kind, catalog, labels_of) in kinds {
            for (id, paper) in &self.papers {
                for label in labels_of(paper) {
                    let filed = catalog
                        .get(&label)
                        .map_or(false, |category| category.papers.contains(id));
                    if !filed {
                        problems.push(format!("paper {id} is missing from {kind} '{label}'"));
                    }
                }
            }
            for category in catalog.iter() {
                if category.papers.is_empty() {
                    problems.push(format!("{kind} '{}' is empty", category.label));
                }
                for id in &category.papers {
                    let holds = self
                        .papers
                        .get(id)
                        .map_or(false, |paper| labels_of(paper).contains(&category.label));
                    if !holds {
                        problems.push(format!(
                            "{kind} '{}' lists paper {id} which does not reference it",
                            category.label
                        ));
                    }
                }
            }
        }

        for (id, paper) in &self.papers {
            let in_venue = self
                .venues
                .get(paper.bib.venue())
                .map_or(false, |venue| venue.papers.contains(id));
            if !in_venue {
                problems.push(format!(
                    "paper {id} is missing from venue '{}'",
                    paper.bib.venue()
                ));
            }
            let in_year = !paper.bib.has_year()
                || self
                    .years
                    .get(&paper.bib.year())
                    .map_or(false, |ids| ids.contains(id));
            if !in_year {
                problems.push(format!("paper {id} is missing from year {}", paper.bib.year()));
            }
            let in_rating = paper.rating() == 0
                || self
                    .ratings
                    .get(&paper.rating())
                    .map_or(false, |ids| ids.contains(id));
            if !in_rating {
                problems.push(format!("paper {id} is missing from rating {}", paper.rating()));
            }
        }

        for venue in self.venues.iter() {
            for id in &venue.papers {
                if self.papers.get(id).map(|p| p.bib.venue()) != Some(venue.label.as_str()) {
                    problems.push(format!("venue '{}' lists stray paper {id}", venue.label));
                }
            }
        }
        for (year, ids) in &self.years {
            for id in ids {
                if self.papers.get(id).map(|p| p.bib.year()) != Some(*year) {
                    problems.push(format!("year {year} lists stray paper {id}"));
                }
            }
        }
        for (rating, ids) in &self.ratings {
            for id in ids {
                if self.papers.get(id).map(|p| p.rating()) != Some(*rating) {
                    problems.push(format!("rating {rating} lists stray paper {id}"));
                }
            }
        }

        problems
    }

    /// Repair state that a loaded snapshot may lack.
    pub(crate) fn after_load(&mut self) {
        self.venues.ensure_others();
    }
}
