//! In-memory GEDCOM graph storage
//!
//! The graph owns every node in a single arena. Records are additionally
//! indexed by tag and xref id in insertion-ordered collections. Parent
//! links, references and back-references are arena indices, never owning
//! pointers.

use super::fragment::Fragment;
use super::node::Node;
use super::types::{tags, NodeId, Tag, XrefId};
use indexmap::{IndexMap, IndexSet};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during graph operations
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Record {0} not found")]
    UnknownRecord(XrefId),

    #[error("Record {0} already exists")]
    DuplicateXref(XrefId),

    #[error("Node {0} is not a record")]
    NotARecord(NodeId),

    #[error("Record {xref} is a {found} record, expected {expected}")]
    WrongRecordType {
        xref: XrefId,
        expected: Tag,
        found: Tag,
    },

    #[error("Node {from} references missing node {to}")]
    DanglingReference { from: NodeId, to: NodeId },

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Header metadata extracted from the `HEAD` record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeaderMeta {
    /// `HEAD.GEDC.VERS`
    pub version: Option<String>,
    /// `HEAD.CHAR`
    pub charset: Option<String>,
    /// Set when bulky substructures were stripped from oversized input
    pub purged: bool,
}

/// Ad hoc group collected from the member tag convention
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberGroup {
    /// First field node naming this group
    pub definition: NodeId,
    /// Individuals carrying the group, in first-seen order
    pub members: IndexSet<XrefId>,
}

/// A pointer produced by [`Graph::graft`] that still has to be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPointer {
    pub node: NodeId,
    pub target: XrefId,
}

/// In-memory GEDCOM graph
///
/// - nodes: arena, `None` marks a removed node
/// - collections: record tag -> xref -> node (insertion ordered)
/// - xref_index: xref -> node for every record, including ignored ones
/// - preamble: top-level nodes without an xref (`HEAD`, ...)
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Option<Node>>,

    collections: IndexMap<Tag, IndexMap<XrefId, NodeId>>,

    xref_index: FxHashMap<XrefId, NodeId>,

    preamble: Vec<NodeId>,

    /// Placeholder individuals removed from the public collection
    ignored: IndexMap<XrefId, NodeId>,

    members: IndexMap<String, MemberGroup>,

    meta: HeaderMeta,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the graph holds no records and no top-level nodes
    pub fn is_empty(&self) -> bool {
        self.xref_index.is_empty() && self.preamble.is_empty()
    }

    /// Allocate a detached node
    pub fn alloc(&mut self, tag: impl Into<Tag>, value: Option<String>) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Some(Node::with_value(id, tag, value)));
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index()).and_then(Option::as_mut)
    }

    fn require(&self, id: NodeId) -> GraphResult<&Node> {
        self.node(id).ok_or(GraphError::NodeNotFound(id))
    }

    fn require_mut(&mut self, id: NodeId) -> GraphResult<&mut Node> {
        self.node_mut(id).ok_or(GraphError::NodeNotFound(id))
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Register a node as a record under `xref`
    pub fn insert_record(&mut self, id: NodeId, xref: XrefId) -> GraphResult<()> {
        if self.xref_index.contains_key(&xref) {
            return Err(GraphError::DuplicateXref(xref));
        }
        let node = self.require_mut(id)?;
        node.xref = Some(xref.clone());
        node.parent = None;
        node.depth = 0;
        let tag = node.tag.clone();

        self.collections
            .entry(tag)
            .or_default()
            .insert(xref.clone(), id);
        self.xref_index.insert(xref, id);
        Ok(())
    }

    /// Register a top-level node without an xref
    pub fn add_preamble(&mut self, id: NodeId) -> GraphResult<()> {
        let node = self.require_mut(id)?;
        node.parent = None;
        node.depth = 0;
        self.preamble.push(id);
        Ok(())
    }

    /// Attach `child` as the last field of `parent` carrying its tag
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> GraphResult<()> {
        let depth = self.require(parent)?.depth + 1;
        let node = self.require_mut(child)?;
        node.parent = Some(parent);
        node.depth = depth;
        let tag = node.tag.clone();
        self.require_mut(parent)?.push_child(tag, child);
        Ok(())
    }

    /// Look up any record (including ignored individuals) by xref
    pub fn record(&self, xref: &str) -> Option<NodeId> {
        self.xref_index.get(xref).copied()
    }

    pub fn record_node(&self, xref: &str) -> Option<&Node> {
        self.record(xref).and_then(|id| self.node(id))
    }

    /// Record of the expected tag, or an error naming what was found
    pub fn require_record(&self, xref: &XrefId, tag: &str) -> GraphResult<NodeId> {
        let id = self
            .record(xref.as_str())
            .ok_or_else(|| GraphError::UnknownRecord(xref.clone()))?;
        let node = self.require(id)?;
        if !node.has_tag(tag) {
            return Err(GraphError::WrongRecordType {
                xref: xref.clone(),
                expected: Tag::new(tag),
                found: node.tag.clone(),
            });
        }
        Ok(id)
    }

    /// Typed collection for a record tag
    pub fn collection(&self, tag: &str) -> Option<&IndexMap<XrefId, NodeId>> {
        self.collections.get(tag)
    }

    /// All collections, in first-seen order
    pub fn collections(&self) -> impl Iterator<Item = (&Tag, &IndexMap<XrefId, NodeId>)> {
        self.collections.iter()
    }

    /// Records of one collection as `(xref, node)` pairs
    pub fn records_of(&self, tag: &str) -> impl Iterator<Item = (&XrefId, NodeId)> {
        self.collection(tag)
            .into_iter()
            .flat_map(|c| c.iter().map(|(x, id)| (x, *id)))
    }

    pub fn individuals(&self) -> impl Iterator<Item = (&XrefId, NodeId)> {
        self.records_of(tags::INDI)
    }

    pub fn families(&self) -> impl Iterator<Item = (&XrefId, NodeId)> {
        self.records_of(tags::FAM)
    }

    pub fn individual_count(&self) -> usize {
        self.collection(tags::INDI).map_or(0, IndexMap::len)
    }

    pub fn family_count(&self) -> usize {
        self.collection(tags::FAM).map_or(0, IndexMap::len)
    }

    /// Every xref id in use, ignored records included
    pub fn xrefs(&self) -> impl Iterator<Item = &XrefId> {
        self.xref_index.keys()
    }

    pub fn preamble(&self) -> &[NodeId] {
        &self.preamble
    }

    /// The `HEAD` node, if any
    pub fn header(&self) -> Option<NodeId> {
        self.preamble
            .iter()
            .copied()
            .find(|&id| self.node(id).is_some_and(|n| n.has_tag(tags::HEAD)))
    }

    pub fn meta(&self) -> &HeaderMeta {
        &self.meta
    }

    pub(crate) fn meta_mut(&mut self) -> &mut HeaderMeta {
        &mut self.meta
    }

    /// Recompute [`HeaderMeta`] from the `HEAD` node
    pub fn refresh_meta(&mut self) {
        let Some(head) = self.header() else {
            self.meta = HeaderMeta::default();
            return;
        };
        self.meta = HeaderMeta {
            version: self.get_value(head, "GEDC.VERS").map(str::to_string),
            charset: self.first_value(head, tags::CHAR).map(str::to_string),
            purged: self.node(head).is_some_and(|n| n.first_child(tags::PURGED).is_some()),
        };
    }

    /// Member-tag groups: name -> definition and members
    pub fn members(&self) -> &IndexMap<String, MemberGroup> {
        &self.members
    }

    pub(crate) fn add_member(&mut self, name: &str, definition: NodeId, member: XrefId) {
        self.members
            .entry(name.to_string())
            .or_insert_with(|| MemberGroup {
                definition,
                members: IndexSet::new(),
            })
            .members
            .insert(member);
    }

    /// Move group memberships of `old` over to `new`
    pub(crate) fn replace_member(&mut self, old: &XrefId, new: &XrefId) {
        for group in self.members.values_mut() {
            if group.members.shift_remove(old) {
                group.members.insert(new.clone());
            }
        }
    }

    /// Add `new` to every group `existing` belongs to
    pub(crate) fn share_member(&mut self, existing: &XrefId, new: &XrefId) {
        for group in self.members.values_mut() {
            if group.members.contains(existing) {
                group.members.insert(new.clone());
            }
        }
    }

    /// Placeholder individuals kept out of the public collection
    pub fn ignored(&self) -> &IndexMap<XrefId, NodeId> {
        &self.ignored
    }

    /// Move a record out of its public collection into the ignored set.
    ///
    /// The node stays in the arena so references to it keep resolving.
    pub(crate) fn ignore_record(&mut self, xref: &XrefId) -> GraphResult<()> {
        let id = self
            .record(xref.as_str())
            .ok_or_else(|| GraphError::UnknownRecord(xref.clone()))?;
        let tag = self.require(id)?.tag.clone();
        if let Some(collection) = self.collections.get_mut(&tag) {
            collection.shift_remove(xref);
        }
        self.ignored.insert(xref.clone(), id);
        Ok(())
    }

    /// Value of the first child carrying `tag`
    pub fn first_value(&self, id: NodeId, tag: &str) -> Option<&str> {
        let child = self.node(id)?.first_child(tag)?;
        self.node(child)?.value()
    }

    /// Xref of the record a node points at
    pub fn pointer(&self, id: NodeId) -> Option<&XrefId> {
        let target = self.node(id)?.reference?;
        self.node(target)?.xref.as_ref()
    }

    /// Point `from` at the record `to`, rewriting its value to `@to@`
    pub fn link_reference(&mut self, from: NodeId, to: NodeId) -> GraphResult<()> {
        let token = self
            .require(to)?
            .xref
            .as_ref()
            .map(XrefId::token)
            .ok_or(GraphError::NotARecord(to))?;
        self.require(from)?;

        self.unlink_reference(from);
        if let Some(node) = self.node_mut(from) {
            node.value = Some(token);
            node.reference = Some(to);
        }
        if let Some(target) = self.node_mut(to) {
            target.referenced_by.insert(from);
        }
        Ok(())
    }

    /// Drop the resolved reference of `from`, keeping its value as text
    pub fn unlink_reference(&mut self, from: NodeId) {
        let Some(old) = self.node_mut(from).and_then(|n| n.reference.take()) else {
            return;
        };
        if let Some(target) = self.node_mut(old) {
            target.referenced_by.shift_remove(&from);
        }
    }

    /// Assign a value, resolving it when it names an existing record
    pub fn set_value(&mut self, id: NodeId, value: Option<String>) -> GraphResult<()> {
        self.require(id)?;
        self.unlink_reference(id);

        let target = value
            .as_deref()
            .and_then(crate::grammar::parse_xref)
            .and_then(|x| self.record(x));

        match target {
            Some(target) => self.link_reference(id, target),
            None => {
                self.require_mut(id)?.value = value;
                Ok(())
            }
        }
    }

    /// Set the first `tag` field of `id`, creating it when absent
    pub fn set_field(&mut self, id: NodeId, tag: &str, value: Option<String>) -> GraphResult<NodeId> {
        let field = match self.require(id)?.first_child(tag) {
            Some(field) => field,
            None => {
                let field = self.alloc(tag, None);
                self.append_child(id, field)?;
                field
            }
        };
        self.set_value(field, value)?;
        Ok(field)
    }

    /// Node ids of a subtree in pre-order, root first
    pub fn subtree(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            out.push(id);
            let children: Vec<NodeId> = node.all_children().collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Remove a node and everything beneath it.
    ///
    /// Records are removed from their collection; nodes that pointed into
    /// the subtree keep their value as plain text.
    pub fn remove_subtree(&mut self, root: NodeId) -> GraphResult<()> {
        let (parent, tag, xref) = {
            let node = self.require(root)?;
            (node.parent, node.tag.clone(), node.xref.clone())
        };

        match parent {
            Some(parent) => {
                if let Some(p) = self.node_mut(parent) {
                    p.remove_child(tag.as_str(), root);
                }
            }
            None => self.preamble.retain(|&id| id != root),
        }
        if let Some(xref) = xref {
            if let Some(collection) = self.collections.get_mut(&tag) {
                collection.shift_remove(&xref);
            }
            self.ignored.shift_remove(&xref);
            self.xref_index.remove(&xref);
        }

        for id in self.subtree(root) {
            let Some(node) = self.nodes[id.index()].take() else {
                continue;
            };
            if let Some(target) = node.reference {
                if let Some(t) = self.node_mut(target) {
                    t.referenced_by.shift_remove(&id);
                }
            }
            for referrer in node.referenced_by {
                if let Some(r) = self.node_mut(referrer) {
                    r.reference = None;
                }
            }
        }
        Ok(())
    }

    /// Remove a record by xref
    pub fn remove_record(&mut self, xref: &XrefId) -> GraphResult<NodeId> {
        let id = self
            .record(xref.as_str())
            .ok_or_else(|| GraphError::UnknownRecord(xref.clone()))?;
        self.remove_subtree(id)?;
        Ok(id)
    }

    /// Owned copy of a subtree
    pub fn fragment(&self, id: NodeId) -> Option<Fragment> {
        let node = self.node(id)?;
        Some(Fragment {
            tag: node.tag.clone(),
            value: node.value.clone(),
            pointer: self.pointer(id).cloned(),
            children: node
                .all_children()
                .filter_map(|child| self.fragment(child))
                .collect(),
        })
    }

    /// Owned copies of every child subtree of `id`
    pub fn child_fragments(&self, id: NodeId) -> Vec<Fragment> {
        self.node(id)
            .map(|n| n.all_children().filter_map(|c| self.fragment(c)).collect())
            .unwrap_or_default()
    }

    /// Build `fragment` beneath `parent`.
    ///
    /// Pointers are not resolved here; they are returned so the caller can
    /// resolve them once every target record exists.
    pub fn graft(&mut self, parent: NodeId, fragment: Fragment) -> GraphResult<Vec<PendingPointer>> {
        let mut pending = Vec::new();
        let child = self.build_fragment(fragment, &mut pending)?;
        self.append_child(parent, child)?;
        self.fix_depths(child);
        Ok(pending)
    }

    /// Build the children of `fragment` beneath an existing node
    pub(crate) fn graft_children(
        &mut self,
        parent: NodeId,
        children: Vec<Fragment>,
    ) -> GraphResult<Vec<PendingPointer>> {
        let mut pending = Vec::new();
        for child in children {
            pending.extend(self.graft(parent, child)?);
        }
        Ok(pending)
    }

    fn build_fragment(
        &mut self,
        fragment: Fragment,
        pending: &mut Vec<PendingPointer>,
    ) -> GraphResult<NodeId> {
        let value = match &fragment.pointer {
            Some(target) => Some(target.token()),
            None => fragment.value,
        };
        let id = self.alloc(fragment.tag, value);
        if let Some(target) = fragment.pointer {
            pending.push(PendingPointer { node: id, target });
        }
        for child in fragment.children {
            let child_id = self.build_fragment(child, pending)?;
            self.append_child(id, child_id)?;
        }
        Ok(id)
    }

    fn fix_depths(&mut self, root: NodeId) {
        for id in self.subtree(root) {
            let depth = self
                .node(id)
                .and_then(|n| n.parent)
                .and_then(|p| self.node(p))
                .map_or(0, |p| p.depth + 1);
            if let Some(node) = self.node_mut(id) {
                node.depth = depth;
            }
        }
    }

    /// Resolve pointers against this graph's records.
    ///
    /// Pointers whose target does not exist stay plain values. Returns the
    /// number resolved.
    pub fn resolve_pointers(&mut self, pending: Vec<PendingPointer>) -> GraphResult<usize> {
        let mut resolved = 0;
        for PendingPointer { node, target } in pending {
            if let Some(target) = self.record(target.as_str()) {
                self.link_reference(node, target)?;
                resolved += 1;
            }
        }
        Ok(resolved)
    }

    /// Collapse repeated pointer fields of `id` that name the same record.
    ///
    /// The first entry per target survives. Returns the number removed.
    pub fn dedup_pointers(&mut self, id: NodeId, tag_names: &[&str]) -> GraphResult<usize> {
        let mut duplicates = Vec::new();
        {
            let node = self.require(id)?;
            for tag in tag_names {
                let mut seen: FxHashSet<String> = FxHashSet::default();
                for &child in node.children(tag) {
                    let key = match self.pointer(child) {
                        Some(xref) => xref.as_str().to_string(),
                        None => continue,
                    };
                    if !seen.insert(key) {
                        duplicates.push(child);
                    }
                }
            }
        }
        let removed = duplicates.len();
        for child in duplicates {
            self.remove_subtree(child)?;
        }
        Ok(removed)
    }

    /// Check reference bookkeeping across the whole graph
    pub fn validate(&self) -> GraphResult<()> {
        for node in self.nodes.iter().flatten() {
            if let Some(target) = node.reference {
                let ok = self.node(target).is_some_and(|t| t.is_record());
                if !ok {
                    return Err(GraphError::DanglingReference {
                        from: node.id,
                        to: target,
                    });
                }
            }
            for &referrer in &node.referenced_by {
                let ok = self
                    .node(referrer)
                    .is_some_and(|r| r.reference == Some(node.id));
                if !ok {
                    return Err(GraphError::DanglingReference {
                        from: referrer,
                        to: node.id,
                    });
                }
            }
        }
        for (xref, &id) in &self.xref_index {
            let live = self.node(id).is_some_and(|n| n.xref.as_ref() == Some(xref));
            if !live {
                return Err(GraphError::UnknownRecord(xref.clone()));
            }
        }
        Ok(())
    }
}
