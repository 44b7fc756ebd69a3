//! Collision-free xref allocation

use crate::graph::{Graph, XrefId};
use rustc_hash::{FxHashMap, FxHashSet};
use std::ops::RangeInclusive;

/// Hands out xref ids not used by a graph or by earlier allocations
#[derive(Debug, Default)]
pub struct IdAllocator {
    used: FxHashSet<XrefId>,
    /// Highest numeric suffix seen per alphabetic prefix
    high: FxHashMap<String, u64>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve every id already present in `graph`
    pub fn from_graph(graph: &Graph) -> Self {
        let mut ids = Self::new();
        for xref in graph.xrefs() {
            ids.reserve(xref.clone());
        }
        ids
    }

    pub fn is_used(&self, xref: &XrefId) -> bool {
        self.used.contains(xref)
    }

    /// Mark `xref` as taken
    pub fn reserve(&mut self, xref: XrefId) {
        let (prefix, number) = split(xref.as_str());
        let high = self.high.entry(prefix.to_string()).or_insert(0);
        *high = (*high).max(number);
        self.used.insert(xref);
    }

    /// `preferred` when free, otherwise its prefix with the next free number
    pub fn allocate(&mut self, preferred: &XrefId) -> XrefId {
        if !self.is_used(preferred) {
            self.reserve(preferred.clone());
            return preferred.clone();
        }

        let (prefix, _) = split(preferred.as_str());
        let high = self.high.get(prefix).copied().unwrap_or(0);
        // Past the highest suffix first; once that runs out, the lowest gap
        let fresh = high
            .checked_add(1)
            .and_then(|next| self.first_free(prefix, next..=u64::MAX))
            .or_else(|| self.first_free(prefix, 1..=high))
            .unwrap_or_else(|| self.suffixed(preferred));
        self.reserve(fresh.clone());
        fresh
    }

    fn first_free(&self, prefix: &str, numbers: RangeInclusive<u64>) -> Option<XrefId> {
        numbers
            .map(|number| XrefId::new(format!("{}{}", prefix, number)))
            .find(|candidate| !self.is_used(candidate))
    }

    /// Every numeric suffix of the prefix is taken
    fn suffixed(&self, preferred: &XrefId) -> XrefId {
        let mut candidate = format!("{}_", preferred.as_str());
        while self.used.contains(candidate.as_str()) {
            candidate.push('_');
        }
        XrefId::new(candidate)
    }
}

/// `I12` -> (`I`, 12); ids without a numeric suffix count as 0
fn split(id: &str) -> (&str, u64) {
    let prefix = id.trim_end_matches(|c: char| c.is_ascii_digit());
    let number = id[prefix.len()..].parse().unwrap_or(0);
    (prefix, number)
}
