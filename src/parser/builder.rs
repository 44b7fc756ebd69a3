//! Structural walk: logical lines to graph
//!
//! Keeps the most recent node at every depth. A line at level `L` attaches
//! under the node at depth `L - 1`; levels that jump by more than one are
//! clamped to one below the previous line.

use super::config::{LinkConfig, LinkPolicy, ParseConfig};
use super::lines::Line;
use super::{LineError, ParseError, ParseResult};
use crate::grammar;
use crate::graph::{tags, Graph, GraphResult, NodeId, PendingPointer, Tag, XrefId};
use crate::merge;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

pub struct TreeBuilder<'a> {
    config: &'a ParseConfig,
    /// Record ids found by the pre-scan
    known: FxHashMap<String, Tag>,
    graph: Graph,
    /// Most recent node per depth
    path: Vec<NodeId>,
    pending: Vec<PendingPointer>,
    clamped: usize,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(config: &'a ParseConfig, known: FxHashMap<String, Tag>) -> Self {
        Self {
            config,
            known,
            graph: Graph::new(),
            path: Vec::new(),
            pending: Vec::new(),
            clamped: 0,
        }
    }

    /// Walk every line, then finalize the graph
    pub fn build(mut self, lines: &[Line]) -> ParseResult<Graph> {
        for line in lines {
            self.push_line(line).map_err(|source| ParseError::Line {
                index: line.index,
                line: line.raw.clone(),
                source,
            })?;
        }
        self.finish()
    }

    fn push_line(&mut self, line: &Line) -> Result<(), LineError> {
        if line.is_trailer() {
            self.path.clear();
            return Ok(());
        }

        let depth = line.level.min(self.path.len());
        if depth < line.level {
            self.clamped += 1;
            trace!(line = line.index, level = line.level, depth, "clamped level");
        }
        self.path.truncate(depth);

        let node = self.graph.alloc(line.tag.as_str(), line.value.clone());
        match (&line.xref, depth) {
            (Some(xref), _) => self.graph.insert_record(node, XrefId::new(xref.as_str()))?,
            (None, 0) => self.graph.add_preamble(node)?,
            (None, d) => self.graph.append_child(self.path[d - 1], node)?,
        }
        self.path.push(node);

        if let Some(target) = line.value.as_deref().and_then(grammar::parse_xref) {
            if self.known.contains_key(target) {
                self.pending.push(PendingPointer {
                    node,
                    target: XrefId::new(target),
                });
            }
        }

        if depth > 0 {
            self.collect_member(node, line);
        }
        Ok(())
    }

    fn collect_member(&mut self, node: NodeId, line: &Line) {
        let Some(member_tag) = &self.config.member_tag else {
            return;
        };
        if line.tag != member_tag.as_str() {
            return;
        }
        let Some(name) = line.value.as_deref().map(str::trim) else {
            return;
        };
        let owner = self
            .path
            .first()
            .and_then(|&id| self.graph.node(id))
            .filter(|n| n.has_tag(tags::INDI))
            .and_then(|n| n.xref.clone());
        if let Some(owner) = owner {
            self.graph.add_member(name, node, owner);
        }
    }

    fn finish(mut self) -> ParseResult<Graph> {
        let pending = std::mem::take(&mut self.pending);
        let total = pending.len();
        let resolved = self
            .graph
            .resolve_pointers(pending)
            .map_err(ParseError::MalformedGraph)?;
        debug!(resolved, unresolved = total - resolved, clamped = self.clamped, "structural walk done");

        self.graph.refresh_meta();

        let mut graph = self.graph;
        finalize(&mut graph, self.config)?;
        Ok(graph)
    }
}

/// Post-processing and the final reference check, reported once
fn finalize(graph: &mut Graph, config: &ParseConfig) -> ParseResult<()> {
    post_process(graph, config)
        .and_then(|()| graph.validate())
        .map_err(ParseError::MalformedGraph)
}

fn post_process(graph: &mut Graph, config: &ParseConfig) -> GraphResult<()> {
    if let Some(tag) = &config.ignore_tag {
        filter_ignored(graph, tag)?;
    }
    if let Some(link) = &config.link {
        apply_links(graph, link)?;
    }
    Ok(())
}

/// Move placeholder individuals out of the public collection
fn filter_ignored(graph: &mut Graph, tag: &Tag) -> GraphResult<()> {
    let flagged: Vec<XrefId> = graph
        .individuals()
        .filter(|&(_, id)| {
            graph
                .node(id)
                .and_then(|n| n.first_child(tag.as_str()))
                .and_then(|field| graph.node(field))
                .is_some_and(|field| {
                    !field
                        .value()
                        .is_some_and(|v| v.trim().eq_ignore_ascii_case("N"))
                })
        })
        .map(|(xref, _)| xref.clone())
        .collect();

    if !flagged.is_empty() {
        debug!(count = flagged.len(), "filtering ignored members");
    }
    for xref in flagged {
        graph.ignore_record(&xref)?;
    }
    Ok(())
}

/// Reconcile individuals whose link field names another individual
fn apply_links(graph: &mut Graph, link: &LinkConfig) -> GraphResult<()> {
    let candidates: Vec<XrefId> = graph.individuals().map(|(x, _)| x.clone()).collect();
    let mut applied = 0;

    for xref in candidates {
        // Gone when an earlier merge absorbed it
        let Some(id) = graph.record(xref.as_str()) else {
            continue;
        };
        let Some(field) = graph.node(id).and_then(|n| n.first_child(link.tag.as_str())) else {
            continue;
        };
        let Some(target) = graph.node(field).and_then(|n| n.reference) else {
            continue;
        };
        if target == id {
            continue;
        }
        let Some(target_xref) = graph
            .node(target)
            .filter(|t| t.has_tag(tags::INDI))
            .and_then(|t| t.xref.clone())
        else {
            continue;
        };

        match link.policy {
            LinkPolicy::Merge => {
                graph.remove_subtree(field)?;
                merge::merge_indis(graph, &target_xref, &xref, true)?;
            }
            LinkPolicy::Clone => merge::clone_indis(graph, &target_xref, &xref)?,
        }
        applied += 1;
    }

    debug!(applied, policy = ?link.policy, "linking pass done");
    Ok(())
}
