//! GEDCOM graph builder and merge engine
//!
//! Reads genealogical GEDCOM text into an in-memory cross-referenced graph
//! and merges two such graphs into one without duplicate people or
//! families and without dangling references.
//!
//! # Architecture
//!
//! - [`grammar`]: pest grammar for lines, xref tokens and path expressions
//! - [`graph`]: node arena, record collections, reference bookkeeping
//! - [`parser`]: tree builder (continuations, purge, packed values, linking)
//! - [`merge`]: entity resolution between graphs and within one graph
//! - [`export`]: GEDCOM and JSON writers
//!
//! ## Example Usage
//!
//! ```rust
//! use gedgraph::merge::{merge_gedcoms, MergeStrategy};
//! use gedgraph::parser::parse;
//!
//! let target = parse("0 @I1@ INDI\n1 NAME John /Smith/\n").unwrap().graph;
//! let source = parse("0 @I10@ INDI\n1 NAME John /Smith/\n1 SEX M\n").unwrap().graph;
//!
//! let strategy: MergeStrategy = "NAME".parse().unwrap();
//! let merged = merge_gedcoms(&target, &source, &strategy);
//!
//! assert_eq!(merged.individual_count(), 1);
//! let john = merged.record("I1").unwrap();
//! assert_eq!(merged.get_value(john, "SEX"), Some("M"));
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod export;
pub mod grammar;
pub mod graph;
pub mod merge;
pub mod parser;

// Re-export main types for convenience
pub use graph::{Graph, GraphError, GraphResult, Node, NodeId, Tag, XrefId};

pub use parser::{
    parse, LinkConfig, LinkPolicy, ParseConfig, ParseError, ParseResult, ParsedDocument, Parser,
};

pub use merge::{clone_indis, merge_gedcoms, merge_indis, MergeStrategy};

pub use export::{to_gedcom, to_json, ExportFormat};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
