//! Entity resolution across two graphs
//!
//! [`merge_gedcoms`] copies the target, then folds the source into it:
//! 1. match source individuals 1:1 against target individuals
//! 2. build the identity map (matched ids, fresh ids for everything else)
//! 3. reconcile families by their members after remapping
//! 4. copy records with every pointer rewritten through the identity map
//! 5. resolve pointers, add absorbed parents, collapse duplicate pointers

pub mod families;
pub mod ids;
pub mod inplace;

pub use families::{FamilyEntry, FamilyIndex, FamilyMembers};
pub use ids::IdAllocator;
pub use inplace::{clone_indis, merge_indis};

use crate::graph::{tags, Graph, GraphError, GraphResult, NodeId, PendingPointer, Tag, XrefId};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Pointer fields that keep one entry per target record
pub(crate) const POINTER_TAGS: &[&str] = &[tags::FAMS, tags::FAMC, tags::HUSB, tags::WIFE, tags::CHIL];

/// Rule deciding whether two individuals are the same person
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Equal cross-reference ids
    Id,
    /// Equal first value under this tag, e.g. `NAME`
    Tag(Tag),
}

impl FromStr for MergeStrategy {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("id") {
            Ok(MergeStrategy::Id)
        } else {
            Ok(MergeStrategy::Tag(Tag::new(s)))
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeStrategy::Id => write!(f, "id"),
            MergeStrategy::Tag(tag) => write!(f, "{}", tag),
        }
    }
}

/// Merge `source` into a copy of `target`.
///
/// Neither input is modified. Never fails: a strategy that matches
/// nothing appends every source record.
pub fn merge_gedcoms(target: &Graph, source: &Graph, strategy: &MergeStrategy) -> Graph {
    match try_merge_gedcoms(target, source, strategy) {
        Ok(graph) => graph,
        Err(err) => {
            // Only reachable when an input's own bookkeeping is corrupt
            warn!(error = %err, "merge aborted, returning target copy");
            target.clone()
        }
    }
}

/// [`merge_gedcoms`], surfacing internal graph errors
pub fn try_merge_gedcoms(target: &Graph, source: &Graph, strategy: &MergeStrategy) -> GraphResult<Graph> {
    Merger::new(target, source).run(strategy)
}

/// Source individual id -> target individual id, first match wins
fn match_individuals(target: &Graph, source: &Graph, strategy: &MergeStrategy) -> FxHashMap<XrefId, XrefId> {
    let mut matches = FxHashMap::default();
    match strategy {
        MergeStrategy::Id => {
            let Some(candidates) = target.collection(tags::INDI) else {
                return matches;
            };
            for (xref, _) in source.individuals() {
                if candidates.contains_key(xref) {
                    matches.insert(xref.clone(), xref.clone());
                }
            }
        }
        MergeStrategy::Tag(tag) => {
            let mut unclaimed: FxHashMap<&str, VecDeque<&XrefId>> = FxHashMap::default();
            for (xref, node) in target.individuals() {
                if let Some(value) = target.first_value(node, tag.as_str()) {
                    unclaimed.entry(value).or_default().push_back(xref);
                }
            }
            for (xref, node) in source.individuals() {
                let found = source
                    .first_value(node, tag.as_str())
                    .and_then(|value| unclaimed.get_mut(value))
                    .and_then(VecDeque::pop_front);
                if let Some(found) = found {
                    matches.insert(xref.clone(), found.clone());
                }
            }
        }
    }
    matches
}

struct Merger<'s> {
    source: &'s Graph,
    out: Graph,
    ids: IdAllocator,
    /// Source xref -> merged xref
    remap: FxHashMap<XrefId, XrefId>,
    pending: Vec<PendingPointer>,
    /// (surviving family, parent tag, individual) added after resolution
    absorbed: Vec<(XrefId, &'static str, XrefId)>,
}

impl<'s> Merger<'s> {
    fn new(target: &Graph, source: &'s Graph) -> Self {
        let out = target.clone();
        let ids = IdAllocator::from_graph(&out);
        Self {
            source,
            out,
            ids,
            remap: FxHashMap::default(),
            pending: Vec::new(),
            absorbed: Vec::new(),
        }
    }

    fn run(mut self, strategy: &MergeStrategy) -> GraphResult<Graph> {
        let source = self.source;
        let matches = match_individuals(&self.out, source, strategy);

        for (xref, _) in source.individuals() {
            let mapped = match matches.get(xref) {
                Some(found) => found.clone(),
                None => self.ids.allocate(xref),
            };
            self.remap.insert(xref.clone(), mapped);
        }
        for xref in source.ignored().keys() {
            let mapped = self.ids.allocate(xref);
            self.remap.insert(xref.clone(), mapped);
        }
        for (tag, collection) in source.collections() {
            if tag.as_str() == tags::INDI || tag.as_str() == tags::FAM {
                continue;
            }
            for xref in collection.keys() {
                let mapped = self.ids.allocate(xref);
                self.remap.insert(xref.clone(), mapped);
            }
        }

        let appended = self.reconcile_families();

        for (tag, collection) in source.collections() {
            match tag.as_str() {
                tags::INDI => {
                    for (xref, &node) in collection {
                        match matches.get(xref) {
                            Some(found) => {
                                let survivor = self.out.require_record(found, tags::INDI)?;
                                self.copy_fields(node, survivor)?;
                            }
                            None => {
                                self.append_record(node, xref)?;
                            }
                        }
                    }
                }
                tags::FAM => {
                    for (xref, &node) in collection {
                        if appended.contains(xref) {
                            self.append_record(node, xref)?;
                        }
                    }
                }
                _ => {
                    for (xref, &node) in collection {
                        self.append_record(node, xref)?;
                    }
                }
            }
        }
        for (xref, &node) in source.ignored() {
            self.append_record(node, xref)?;
            let mapped = self.mapped(xref)?;
            self.out.ignore_record(&mapped)?;
        }
        self.copy_preamble()?;

        let resolved = self.out.resolve_pointers(std::mem::take(&mut self.pending))?;
        for (family, tag, member) in std::mem::take(&mut self.absorbed) {
            let node = self.out.require_record(&family, tags::FAM)?;
            let field = self.out.alloc(tag, None);
            self.out.append_child(node, field)?;
            self.out.set_value(field, Some(member.token()))?;
        }
        let collapsed = self.collapse_pointers()?;
        self.copy_members()?;

        self.out.refresh_meta();
        if source.meta().purged && !self.out.meta().purged {
            if let Some(head) = self.out.header() {
                self.out.set_field(head, tags::PURGED, Some("Y".to_string()))?;
            }
            self.out.meta_mut().purged = true;
        }
        self.out.validate()?;

        debug!(
            strategy = %strategy,
            matched = matches.len(),
            families_appended = appended.len(),
            resolved,
            collapsed,
            "merge done"
        );
        Ok(self.out)
    }

    /// Decide, per source family, whether it folds into an existing one.
    ///
    /// Returns the source families that will be appended.
    fn reconcile_families(&mut self) -> FxHashSet<XrefId> {
        let source = self.source;
        let mut index = FamilyIndex::from_graph(&self.out);
        let mut appended = FxHashSet::default();

        for (xref, node) in source.families() {
            let members = FamilyMembers::of(source, node).remapped(|x| self.remap.get(x).cloned());
            match index.find_compatible(&members) {
                Some(entry) => {
                    for (tag, member) in entry.members.absorb(&members) {
                        self.absorbed.push((entry.xref.clone(), tag, member));
                    }
                    debug!(family = %xref, into = %entry.xref, "family reconciled");
                    self.remap.insert(xref.clone(), entry.xref.clone());
                }
                None => {
                    let fresh = self.ids.allocate(xref);
                    self.remap.insert(xref.clone(), fresh.clone());
                    index.push(FamilyEntry { xref: fresh, members });
                    appended.insert(xref.clone());
                }
            }
        }
        appended
    }

    fn mapped(&self, xref: &XrefId) -> GraphResult<XrefId> {
        self.remap
            .get(xref)
            .cloned()
            .ok_or_else(|| GraphError::UnknownRecord(xref.clone()))
    }

    /// Copy the fields of a source node onto `onto`, pointers remapped
    fn copy_fields(&mut self, from: NodeId, onto: NodeId) -> GraphResult<()> {
        let mut fields = self.source.child_fragments(from);
        let remap = &self.remap;
        for field in &mut fields {
            field.rewrite_pointers(&|x: &XrefId| remap.get(x).cloned());
        }
        let pending = self.out.graft_children(onto, fields)?;
        self.pending.extend(pending);
        Ok(())
    }

    /// Add a source record under its merged id
    fn append_record(&mut self, from: NodeId, xref: &XrefId) -> GraphResult<NodeId> {
        let source = self.source;
        let record = source.node(from).ok_or(GraphError::NodeNotFound(from))?;
        let node = self.out.alloc(record.tag.clone(), record.value.clone());
        self.out.insert_record(node, self.mapped(xref)?)?;
        self.copy_fields(from, node)?;
        Ok(node)
    }

    /// Top-level non-record nodes whose tag the target lacks
    fn copy_preamble(&mut self) -> GraphResult<()> {
        let source = self.source;
        for &from in source.preamble() {
            let Some(top) = source.node(from) else {
                continue;
            };
            let present = self
                .out
                .preamble()
                .iter()
                .any(|&id| self.out.node(id).is_some_and(|n| n.tag == top.tag));
            if present {
                continue;
            }
            let node = self.out.alloc(top.tag.clone(), top.value.clone());
            self.out.add_preamble(node)?;
            self.copy_fields(from, node)?;
        }
        Ok(())
    }

    fn collapse_pointers(&mut self) -> GraphResult<usize> {
        let records: Vec<NodeId> = self
            .out
            .individuals()
            .chain(self.out.families())
            .map(|(_, id)| id)
            .chain(self.out.ignored().values().copied())
            .collect();
        let mut collapsed = 0;
        for id in records {
            collapsed += self.out.dedup_pointers(id, POINTER_TAGS)?;
        }
        Ok(collapsed)
    }

    /// Carry source member groups over to the merged individuals
    fn copy_members(&mut self) -> GraphResult<()> {
        let source = self.source;
        for (name, group) in source.members() {
            let Some(definition) = source.node(group.definition) else {
                continue;
            };
            for member in &group.members {
                let mapped = self.mapped(member)?;
                let Some(record) = self.out.record_node(mapped.as_str()) else {
                    continue;
                };
                let field = record.children(definition.tag.as_str()).iter().copied().find(|&f| {
                    self.out
                        .node(f)
                        .and_then(|n| n.value())
                        .is_some_and(|v| v.trim() == name.as_str())
                });
                if let Some(field) = field {
                    self.out.add_member(name, field, mapped);
                }
            }
        }
        Ok(())
    }
}
