//! Path queries over the child multimap
//!
//! A path is a dot-separated list of segments. A tag segment selects the
//! children carrying that tag; an index segment (`1` or `items[1]`) picks
//! one entry of that selection. A tag segment not followed by an index
//! picks the first entry, so `BIRT.DATE`, `BIRT.0.DATE.0` and
//! `BIRT.items[0].DATE` address the same node.

use super::store::{Graph, GraphError, GraphResult};
use super::types::NodeId;
use crate::grammar::{self, PathSegment};
use std::str::FromStr;

impl Graph {
    /// Resolve `path` from `start`; `None` when any segment is absent or
    /// the expression is malformed.
    pub fn get(&self, start: NodeId, path: &str) -> Option<NodeId> {
        self.try_get(start, path).ok().flatten()
    }

    /// Like [`Graph::get`] but reports malformed expressions
    pub fn try_get(&self, start: NodeId, path: &str) -> GraphResult<Option<NodeId>> {
        let segments = grammar::parse_path(path).map_err(|e| GraphError::InvalidPath {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Ok(self.resolve_segments(start, &segments))
    }

    /// Value of the node addressed by `path`
    pub fn get_value(&self, start: NodeId, path: &str) -> Option<&str> {
        self.get(start, path)
            .and_then(|id| self.node(id))
            .and_then(|n| n.value())
    }

    /// Value addressed by `path`, parsed as `T`
    pub fn get_typed<T: FromStr>(&self, start: NodeId, path: &str) -> Option<T> {
        self.get_value(start, path)?.trim().parse().ok()
    }

    fn resolve_segments(&self, start: NodeId, segments: &[PathSegment]) -> Option<NodeId> {
        self.node(start)?;
        let mut current = start;
        let mut selection: Option<&[NodeId]> = None;

        for segment in segments {
            match segment {
                PathSegment::Tag(tag) => {
                    if let Some(list) = selection.take() {
                        current = *list.first()?;
                    }
                    let children = self.node(current)?.children(tag);
                    if children.is_empty() {
                        return None;
                    }
                    selection = Some(children);
                }
                PathSegment::Index(index) => {
                    current = *selection.take()?.get(*index)?;
                }
            }
        }

        match selection {
            Some(list) => list.first().copied(),
            None => Some(current),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::XrefId;

    /// INDI with two BIRT blocks carrying distinct dates
    fn two_births() -> (Graph, NodeId) {
        let mut graph = Graph::new();
        let indi = graph.alloc("INDI", None);
        graph.insert_record(indi, XrefId::new("I1")).unwrap();
        for (date, year) in [("1 JAN 1900", "1900"), ("2 FEB 1901", "1901")] {
            let birt = graph.alloc("BIRT", None);
            graph.append_child(indi, birt).unwrap();
            let d = graph.alloc("DATE", Some(date.to_string()));
            graph.append_child(birt, d).unwrap();
            let y = graph.alloc("YEAR", Some(year.to_string()));
            graph.append_child(d, y).unwrap();
        }
        (graph, indi)
    }

    #[test]
    fn test_dotted_path_takes_first() {
        let (graph, indi) = two_births();
        assert_eq!(graph.get_value(indi, "BIRT.DATE"), Some("1 JAN 1900"));
        assert_eq!(graph.get_value(indi, "BIRT.DATE.YEAR"), Some("1900"));
    }

    #[test]
    fn test_three_notations_agree() {
        let (graph, indi) = two_births();
        let numeric = graph.get(indi, "BIRT.1.DATE.YEAR");
        let items = graph.get(indi, "BIRT.items[1].DATE.YEAR");
        let full = graph.get(indi, "BIRT.1.DATE.0.YEAR.0");
        assert!(numeric.is_some());
        assert_eq!(numeric, items);
        assert_eq!(numeric, full);
        assert_eq!(graph.get_value(indi, "BIRT.items[1].DATE.YEAR"), Some("1901"));
        assert_eq!(graph.get(indi, "BIRT.0.DATE.YEAR"), graph.get(indi, "BIRT.DATE.YEAR"));
    }

    #[test]
    fn test_missing_segments() {
        let (graph, indi) = two_births();
        assert_eq!(graph.get(indi, "DEAT.DATE"), None);
        assert_eq!(graph.get(indi, "BIRT.2.DATE"), None);
        assert_eq!(graph.get(indi, "BIRT.DATE.PLAC"), None);
        assert_eq!(graph.get(indi, "0"), None);
        assert_eq!(graph.get(indi, "BIRT..DATE"), None);
    }

    #[test]
    fn test_try_get_reports_bad_syntax() {
        let (graph, indi) = two_births();
        let err = graph.try_get(indi, "BIRT.items[").unwrap_err();
        assert!(matches!(err, GraphError::InvalidPath { .. }));
    }

    #[test]
    fn test_typed_access() {
        let (graph, indi) = two_births();
        assert_eq!(graph.get_typed::<u32>(indi, "BIRT.1.DATE.YEAR"), Some(1901));
        assert_eq!(graph.get_typed::<u32>(indi, "BIRT.DATE"), None);
    }
}
