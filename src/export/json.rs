//! JSON dump of a graph
//!
//! Each node becomes `{tag, id?, value?, children}` with children in field
//! order. Records are keyed by collection tag and xref id.

use super::gedcom::top_level;
use crate::graph::{Graph, NodeId};
use serde_json::{json, Map, Value};

/// Structural JSON view of `graph`
pub fn to_json(graph: &Graph) -> Value {
    let mut records = Map::new();
    for (tag, collection) in graph.collections() {
        if collection.is_empty() {
            continue;
        }
        let entries: Map<String, Value> = collection
            .iter()
            .map(|(xref, &id)| (xref.as_str().to_string(), node_json(graph, id)))
            .collect();
        records.insert(tag.to_string(), Value::Object(entries));
    }

    let ignored: Map<String, Value> = graph
        .ignored()
        .iter()
        .map(|(xref, &id)| (xref.as_str().to_string(), node_json(graph, id)))
        .collect();

    let preamble: Vec<Value> = top_level(graph)
        .into_iter()
        .filter(|&id| graph.node(id).is_some_and(|n| n.xref.is_none()))
        .map(|id| node_json(graph, id))
        .collect();

    let meta = graph.meta();
    json!({
        "meta": {
            "version": meta.version,
            "charset": meta.charset,
            "purged": meta.purged,
        },
        "preamble": preamble,
        "records": records,
        "ignored": ignored,
    })
}

/// JSON for one node and its descendants
pub fn node_json(graph: &Graph, id: NodeId) -> Value {
    let Some(node) = graph.node(id) else {
        return Value::Null;
    };
    let mut object = Map::new();
    object.insert("tag".to_string(), Value::from(node.tag.as_str()));
    if let Some(xref) = &node.xref {
        object.insert("id".to_string(), Value::from(xref.as_str()));
    }
    if let Some(value) = node.value().filter(|v| !v.is_empty()) {
        object.insert("value".to_string(), Value::from(value));
    }
    let children: Vec<Value> = node.all_children().map(|c| node_json(graph, c)).collect();
    object.insert("children".to_string(), Value::Array(children));
    Value::Object(object)
}
