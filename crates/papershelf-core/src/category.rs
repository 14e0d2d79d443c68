//! Shared classifications and their canonical registries.
//!
//! A [`Category`] is a label plus the ids of the papers filed under it. Each category
//! kind (authors, tags, projects, datasets) lives in one [`Catalog`] owned by the
//! [`Library`](crate::Library); a category is present in its catalog exactly while
//! its paper set is non-empty.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::PaperId;

/// A named classification and the papers filed under it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub label: String,
    pub papers: BTreeSet<PaperId>,
}

impl Category {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            papers: BTreeSet::new(),
        }
    }
}

/// Label → category registry for one category kind.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: BTreeMap<String, Category>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, label: &str) -> Option<&Category> {
        self.entries.get(label)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Categories in label order
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.entries.values()
    }

    /// File `id` under `label`, registering the category on first use.
    pub(crate) fn attach(&mut self, label: &str, id: PaperId) {
        self.entries
            .entry(label.to_string())
            .or_insert_with(|| Category::new(label))
            .papers
            .insert(id);
    }

    /// Remove `id` from `label`, dropping the category once nothing is filed under it.
    /// Returns whether the category was dropped.
    pub(crate) fn detach(&mut self, label: &str, id: PaperId) -> bool {
        let Some(category) = self.entries.get_mut(label) else {
            return false;
        };
        category.papers.remove(&id);
        if category.papers.is_empty() {
            self.entries.remove(label);
            return true;
        }
        false
    }

    /// Move paper `id` from the `old` labels to the `new` ones.
    ///
    /// Every new label is attached before any old-only label is detached, and labels present
    /// in both lists are never detached, so a category the paper keeps is never dropped.
    pub(crate) fn apply_diff(&mut self, id: PaperId, old: &[String], new: &[String]) {
        for label in new {
            self.attach(label, id);
        }
        for label in old.iter().filter(|label| !new.contains(label)) {
            self.detach(label, id);
        }
    }

    /// Categories matching `key`: the exact label if registered, otherwise (with `fuzzy`)
    /// every label that contains or is contained in `key`.
    pub fn find(&self, key: &str, fuzzy: bool) -> Vec<&Category> {
        let key = key.trim().to_lowercase();
        if key.is_empty() {
            return Vec::new();
        }
        if let Some(category) = self.entries.get(&key) {
            return vec![category];
        }
        if !fuzzy {
            return Vec::new();
        }
        self.entries
            .values()
            .filter(|category| fuzzy_match(&category.label, &key))
            .collect()
    }
}

/// Case-insensitive containment in either direction. Empty strings never match.
pub fn fuzzy_match(a: &str, b: &str) -> bool {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

/// Split `;`-delimited text into canonical labels: trimmed, lowercased, without empties
/// or repeats, in first-seen order.
pub fn parse_labels(text: &str) -> Vec<String> {
    normalize_labels(text.split(';'))
}

/// Canonicalize already-split labels the same way [`parse_labels`] does.
pub fn normalize_labels<I, S>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for label in labels {
        let label = label.as_ref().trim().to_lowercase();
        if !label.is_empty() && !out.contains(&label) {
            out.push(label);
        }
    }
    out
}

/// Render labels the way the front end edits them
pub fn join_labels(labels: &[String]) -> String {
    labels.join("; ")
}
