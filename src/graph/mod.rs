//! GEDCOM node/graph model
//!
//! This module implements the record graph with:
//! - Identified records in insertion-ordered typed collections
//! - Nested fields as an ordered tag -> children multimap
//! - Arena-indexed references, back-references and parent links
//! - Path queries in dotted, numeric and `items[n]` notation

pub mod fragment;
pub mod node;
pub mod path;
pub mod store;
pub mod types;

// Re-export main types
pub use fragment::Fragment;
pub use node::Node;
pub use store::{Graph, GraphError, GraphResult, HeaderMeta, MemberGroup, PendingPointer};
pub use types::{tags, NodeId, Tag, XrefId};
