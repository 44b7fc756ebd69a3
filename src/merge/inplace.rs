//! In-place unification of two individuals of one graph

use super::POINTER_TAGS;
use crate::graph::{tags, Graph, GraphResult, NodeId, XrefId};
use indexmap::IndexSet;
use tracing::debug;

/// Unify individual `b` into individual `a`.
///
/// `b`'s fields are appended to `a` per tag and every reference to `b`
/// is redirected to `a`. With `remove_source` the now redundant `b` is
/// deleted, otherwise it stays as a duplicate record.
pub fn merge_indis(graph: &mut Graph, a: &XrefId, b: &XrefId, remove_source: bool) -> GraphResult<()> {
    let survivor = graph.require_record(a, tags::INDI)?;
    let duplicate = graph.require_record(b, tags::INDI)?;
    if survivor == duplicate {
        return Ok(());
    }

    let fields = graph.child_fragments(duplicate);
    let pending = graph.graft_children(survivor, fields)?;
    graph.resolve_pointers(pending)?;

    let referrers: Vec<NodeId> = graph
        .node(duplicate)
        .map(|n| n.referenced_by.iter().copied().collect())
        .unwrap_or_default();
    let mut owners: IndexSet<NodeId> = IndexSet::new();
    owners.insert(survivor);
    for referrer in &referrers {
        graph.link_reference(*referrer, survivor)?;
        if let Some(parent) = graph.node(*referrer).and_then(|n| n.parent) {
            owners.insert(parent);
        }
    }

    let mut collapsed = 0;
    for owner in owners {
        // An earlier dedup may already have removed this owner's field
        if graph.node(owner).is_some() {
            collapsed += graph.dedup_pointers(owner, POINTER_TAGS)?;
        }
    }
    // `a` now carries `b`'s member fields too
    if remove_source {
        graph.replace_member(b, a);
        graph.remove_record(b)?;
    } else {
        graph.share_member(b, a);
    }
    debug!(into = %a, from = %b, redirected = referrers.len(), collapsed, remove_source, "individuals merged");
    Ok(())
}

/// Copy every field of individual `a` onto individual `b`.
///
/// Nothing is redirected or removed; `b` becomes a duplicate of `a`.
pub fn clone_indis(graph: &mut Graph, a: &XrefId, b: &XrefId) -> GraphResult<()> {
    let original = graph.require_record(a, tags::INDI)?;
    let copy = graph.require_record(b, tags::INDI)?;
    if original == copy {
        return Ok(());
    }

    let fields = graph.child_fragments(original);
    let pending = graph.graft_children(copy, fields)?;
    graph.resolve_pointers(pending)?;
    let collapsed = graph.dedup_pointers(copy, POINTER_TAGS)?;

    debug!(from = %a, onto = %b, collapsed, "individual cloned");
    Ok(())
}
