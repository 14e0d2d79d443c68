//! Paper id allocation with recycling of freed ids.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::PaperId;

/// Hands out small dense ids, reusing freed ones first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    pool: BTreeSet<PaperId>,
    max_id: Option<PaperId>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id: the smallest freed id, else the first id above the high-water mark that
    /// `is_live` does not claim. Ids for which `is_live` holds are never returned.
    pub fn allocate(&mut self, is_live: impl Fn(PaperId) -> bool) -> PaperId {
        while let Some(id) = self.pool.pop_first() {
            if !is_live(id) {
                return id;
            }
        }

        let mut candidate = self.max_id.map_or(0, |max| max + 1);
        while is_live(candidate) {
            candidate += 1;
        }
        self.max_id = Some(candidate);
        candidate
    }

    /// Return a detached id to the pool.
    pub fn free(&mut self, id: PaperId) {
        self.pool.insert(id);
    }

    /// Highest id ever handed out
    pub fn high_water_mark(&self) -> Option<PaperId> {
        self.max_id
    }

    /// Ids waiting to be reused
    pub fn pooled(&self) -> impl Iterator<Item = PaperId> + '_ {
        self.pool.iter().copied()
    }
}
