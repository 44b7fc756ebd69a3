//! Family reconciliation
//!
//! Two family records describe the same family when, after individual
//! ids have been unified, their children are the same set and neither
//! parent conflicts. A missing parent on one side is not a conflict.

use crate::graph::{tags, Graph, NodeId, XrefId};
use std::collections::BTreeSet;

/// Resolved member set of a family record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FamilyMembers {
    pub husband: Option<XrefId>,
    pub wife: Option<XrefId>,
    pub children: BTreeSet<XrefId>,
}

impl FamilyMembers {
    /// Members of `family` as currently resolved in `graph`.
    ///
    /// Only resolved pointers count; a repeated parent tag uses its first
    /// entry.
    pub fn of(graph: &Graph, family: NodeId) -> Self {
        let Some(node) = graph.node(family) else {
            return Self::default();
        };
        let first = |tag: &str| {
            node.children(tag)
                .iter()
                .find_map(|&id| graph.pointer(id).cloned())
        };
        FamilyMembers {
            husband: first(tags::HUSB),
            wife: first(tags::WIFE),
            children: node
                .children(tags::CHIL)
                .iter()
                .filter_map(|&id| graph.pointer(id).cloned())
                .collect(),
        }
    }

    /// Rewrite every member through `remap`; unmapped members are dropped
    pub fn remapped<F>(&self, remap: F) -> Self
    where
        F: Fn(&XrefId) -> Option<XrefId>,
    {
        FamilyMembers {
            husband: self.husband.as_ref().and_then(&remap),
            wife: self.wife.as_ref().and_then(&remap),
            children: self.children.iter().filter_map(&remap).collect(),
        }
    }

    /// Same children, and each parent either equal or given by at most
    /// one side
    pub fn is_compatible(&self, other: &FamilyMembers) -> bool {
        self.children == other.children
            && parents_agree(&self.husband, &other.husband)
            && parents_agree(&self.wife, &other.wife)
    }

    /// Every parent `other` specifies is already here, so absorbing it
    /// changes nothing
    pub fn covers(&self, other: &FamilyMembers) -> bool {
        (other.husband.is_none() || self.husband == other.husband)
            && (other.wife.is_none() || self.wife == other.wife)
    }

    /// Take parents `other` specifies and `self` lacks.
    ///
    /// Returns the `(tag, individual)` fields that must be added to the
    /// surviving record.
    pub fn absorb(&mut self, other: &FamilyMembers) -> Vec<(&'static str, XrefId)> {
        let mut added = Vec::new();
        if self.husband.is_none() {
            if let Some(husband) = &other.husband {
                self.husband = Some(husband.clone());
                added.push((tags::HUSB, husband.clone()));
            }
        }
        if self.wife.is_none() {
            if let Some(wife) = &other.wife {
                self.wife = Some(wife.clone());
                added.push((tags::WIFE, wife.clone()));
            }
        }
        added
    }
}

fn parents_agree(a: &Option<XrefId>, b: &Option<XrefId>) -> bool {
    match (a, b) {
        (Some(x), Some(y)) => x == y,
        _ => true,
    }
}

/// A family already present in the merged graph
#[derive(Debug, Clone)]
pub struct FamilyEntry {
    pub xref: XrefId,
    pub members: FamilyMembers,
}

/// Families of the merged graph in insertion order
#[derive(Debug, Default)]
pub struct FamilyIndex {
    entries: Vec<FamilyEntry>,
}

impl FamilyIndex {
    /// Index every family currently in `graph`
    pub fn from_graph(graph: &Graph) -> Self {
        let entries = graph
            .families()
            .map(|(xref, node)| FamilyEntry {
                xref: xref.clone(),
                members: FamilyMembers::of(graph, node),
            })
            .collect();
        Self { entries }
    }

    pub fn push(&mut self, entry: FamilyEntry) {
        self.entries.push(entry);
    }

    /// Family that `members` folds into.
    ///
    /// A compatible family that already covers every parent of `members`
    /// wins; otherwise the first compatible one in insertion order. Once an
    /// absorb would reproduce an existing member set that family covers
    /// `members` itself, so absorbing never creates two equal families.
    pub fn find_compatible(&mut self, members: &FamilyMembers) -> Option<&mut FamilyEntry> {
        let compatible = |entry: &FamilyEntry| entry.members.is_compatible(members);
        let position = self
            .entries
            .iter()
            .position(|entry| compatible(entry) && entry.members.covers(members))
            .or_else(|| self.entries.iter().position(compatible))?;
        self.entries.get_mut(position)
    }
}
