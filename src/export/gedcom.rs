//! GEDCOM writer
//!
//! Header first, then records per collection, ignored individuals, any
//! other top-level nodes, and a single trailer.

use crate::graph::{tags, Graph, NodeId};
use std::fmt::{self, Write};

/// Top-level nodes in output order
pub(crate) fn top_level(graph: &Graph) -> Vec<NodeId> {
    let header = graph.header();
    let mut order: Vec<NodeId> = header.into_iter().collect();
    for (_, collection) in graph.collections() {
        order.extend(collection.values().copied());
    }
    order.extend(graph.ignored().values().copied());
    order.extend(graph.preamble().iter().copied().filter(|&id| Some(id) != header));
    order
}

/// Write `graph` as GEDCOM text into `out`
pub fn write_gedcom<W: Write>(graph: &Graph, out: &mut W) -> fmt::Result {
    for id in top_level(graph) {
        write_node(graph, id, 0, out)?;
    }
    writeln!(out, "0 {}", tags::TRLR)
}

/// GEDCOM text for `graph`
pub fn to_gedcom(graph: &Graph) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_gedcom(graph, &mut out);
    out
}

/// GEDCOM text for a single node and its fields, written at level 0
pub fn node_to_gedcom(graph: &Graph, id: NodeId) -> String {
    let mut out = String::new();
    let _ = write_node(graph, id, 0, &mut out);
    out
}

fn write_node<W: Write>(graph: &Graph, id: NodeId, level: usize, out: &mut W) -> fmt::Result {
    let Some(node) = graph.node(id) else {
        return Ok(());
    };
    write!(out, "{}", level)?;
    if let Some(xref) = &node.xref {
        write!(out, " {}", xref)?;
    }
    write!(out, " {}", node.tag)?;
    if let Some(value) = node.value().filter(|v| !v.is_empty()) {
        write!(out, " {}", value)?;
    }
    writeln!(out)?;

    for child in node.all_children() {
        write_node(graph, child, level + 1, out)?;
    }
    Ok(())
}
