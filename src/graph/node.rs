//! Node implementation for the GEDCOM graph
//!
//! A node is one line of the source document together with the lines
//! nested beneath it. Children are kept as an ordered multimap from tag to
//! the sequence of child nodes carrying that tag.

use super::types::{NodeId, Tag, XrefId};
use indexmap::{IndexMap, IndexSet};

/// A tagged element of the graph
///
/// Nodes have:
/// - A tag and an optional scalar value
/// - An xref id when they are records
/// - Ordered children grouped by tag
/// - Non-owning links: parent, resolved reference, and back-references
#[derive(Debug, Clone)]
pub struct Node {
    /// Arena slot of this node
    pub id: NodeId,

    /// Tag of the source line
    pub tag: Tag,

    /// Cross-reference id, present only on records
    pub xref: Option<XrefId>,

    /// Scalar value; for pointer fields this is the `@id@` token
    pub value: Option<String>,

    /// Resolved target when `value` names a known record
    pub reference: Option<NodeId>,

    /// Nodes whose `reference` points here
    pub referenced_by: IndexSet<NodeId>,

    /// Owning node, `None` for top-level nodes
    pub parent: Option<NodeId>,

    /// Nesting depth, `0` for top-level nodes
    pub depth: usize,

    children: IndexMap<Tag, Vec<NodeId>>,
}

impl Node {
    /// Create a new detached node
    pub fn new(id: NodeId, tag: impl Into<Tag>) -> Self {
        Node {
            id,
            tag: tag.into(),
            xref: None,
            value: None,
            reference: None,
            referenced_by: IndexSet::new(),
            parent: None,
            depth: 0,
            children: IndexMap::new(),
        }
    }

    /// Create a new node carrying a value
    pub fn with_value(id: NodeId, tag: impl Into<Tag>, value: Option<String>) -> Self {
        let mut node = Node::new(id, tag);
        node.value = value;
        node
    }

    /// Check if this node is an identified record
    pub fn is_record(&self) -> bool {
        self.xref.is_some()
    }

    /// Check if this node has a specific tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag.as_str() == tag
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Children carrying `tag`, in insertion order
    pub fn children(&self, tag: &str) -> &[NodeId] {
        self.children.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First child carrying `tag`
    pub fn first_child(&self, tag: &str) -> Option<NodeId> {
        self.children(tag).first().copied()
    }

    /// Distinct child tags, in first-seen order
    pub fn child_tags(&self) -> impl Iterator<Item = &Tag> {
        self.children.keys()
    }

    /// All children, grouped by tag in first-seen order
    pub fn all_children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.values().flat_map(|ids| ids.iter().copied())
    }

    pub fn child_count(&self) -> usize {
        self.children.values().map(Vec::len).sum()
    }

    pub fn has_children(&self) -> bool {
        self.children.values().any(|ids| !ids.is_empty())
    }

    pub(crate) fn push_child(&mut self, tag: Tag, child: NodeId) {
        self.children.entry(tag).or_default().push(child);
    }

    /// Detach `child`; returns false if it was not a child of this node
    pub(crate) fn remove_child(&mut self, tag: &str, child: NodeId) -> bool {
        let Some(ids) = self.children.get_mut(tag) else {
            return false;
        };
        let Some(pos) = ids.iter().position(|&id| id == child) else {
            return false;
        };
        ids.remove(pos);
        if ids.is_empty() {
            self.children.shift_remove(tag);
        }
        true
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_node() {
        let node = Node::new(NodeId::new(1), "INDI");
        assert_eq!(node.id, NodeId::new(1));
        assert!(node.has_tag("INDI"));
        assert!(!node.is_record());
        assert!(!node.has_children());
    }

    #[test]
    fn test_repeated_tags_keep_order() {
        let mut node = Node::new(NodeId::new(1), "INDI");
        node.push_child(Tag::new("NAME"), NodeId::new(2));
        node.push_child(Tag::new("BIRT"), NodeId::new(3));
        node.push_child(Tag::new("NAME"), NodeId::new(4));

        assert_eq!(node.children("NAME"), &[NodeId::new(2), NodeId::new(4)]);
        assert_eq!(node.first_child("BIRT"), Some(NodeId::new(3)));
        assert_eq!(node.child_count(), 3);

        let tags: Vec<&str> = node.child_tags().map(|t| t.as_str()).collect();
        assert_eq!(tags, vec!["NAME", "BIRT"]);

        let all: Vec<NodeId> = node.all_children().collect();
        assert_eq!(all, vec![NodeId::new(2), NodeId::new(4), NodeId::new(3)]);
    }

    #[test]
    fn test_remove_child() {
        let mut node = Node::new(NodeId::new(1), "FAM");
        node.push_child(Tag::new("CHIL"), NodeId::new(2));
        node.push_child(Tag::new("CHIL"), NodeId::new(3));

        assert!(node.remove_child("CHIL", NodeId::new(2)));
        assert!(!node.remove_child("CHIL", NodeId::new(2)));
        assert_eq!(node.children("CHIL"), &[NodeId::new(3)]);

        assert!(node.remove_child("CHIL", NodeId::new(3)));
        assert_eq!(node.child_tags().count(), 0);
    }

    #[test]
    fn test_node_equality() {
        let a = Node::new(NodeId::new(7), "INDI");
        let b = Node::new(NodeId::new(7), "FAM");
        let c = Node::new(NodeId::new(8), "INDI");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
