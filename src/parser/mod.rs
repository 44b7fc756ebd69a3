//! GEDCOM tree builder
//!
//! Turns level-prefixed text into a [`Graph`]:
//! 1. split into logical lines (continuations joined) and normalise the trailer
//! 2. pre-scan top-level record ids
//! 3. purge bulky substructures from oversized input
//! 4. expand packed multi-reference values
//! 5. walk lines into records and nested fields, resolve references
//! 6. finalize: ignored members, optional linking pass, validation

pub mod builder;
pub mod config;
pub mod expand;
pub mod lines;
pub mod purge;

pub use builder::TreeBuilder;
pub use config::{LinkConfig, LinkPolicy, ParseConfig, DEFAULT_PURGE_THRESHOLD};

use crate::graph::{Graph, GraphError};
use thiserror::Error;
use tracing::{debug, info};

/// Parser errors
#[derive(Error, Debug)]
pub enum ParseError {
    /// A line could not be processed; parsing stops here
    #[error("Line {index}: {source} (in {line:?})")]
    Line {
        /// Zero-based line index
        index: usize,
        /// Raw text of the offending line
        line: String,
        #[source]
        source: LineError,
    },

    /// An invariant check failed while finalizing the graph
    #[error("Malformed graph: {0}")]
    MalformedGraph(#[source] GraphError),
}

/// Cause of a line-level failure
#[derive(Error, Debug, PartialEq)]
pub enum LineError {
    #[error("continuation line with no preceding line")]
    OrphanContinuation,

    #[error(transparent)]
    Graph(#[from] GraphError),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parse output: the graph and the normalised document text
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub graph: Graph,
    /// Input with `\n` line endings, one trailer, and purge applied
    pub raw: String,
}

/// Stateless parser carrying its configuration
#[derive(Debug, Clone, Default)]
pub struct Parser {
    config: ParseConfig,
}

impl Parser {
    /// Create a parser with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ParseConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    /// Parse a GEDCOM document
    pub fn parse(&self, text: &str) -> ParseResult<ParsedDocument> {
        let mut lines = lines::logical_lines(text)?;
        if lines.is_empty() {
            return Ok(ParsedDocument {
                graph: Graph::new(),
                raw: String::new(),
            });
        }
        lines::ensure_trailer(&mut lines);

        let known = lines::prescan(text);

        if text.len() > self.config.purge_threshold && !purge::is_marked(&lines) {
            info!(
                bytes = text.len(),
                threshold = self.config.purge_threshold,
                "purging oversized document"
            );
            lines = purge::purge(lines);
        }
        let raw = lines::render(&lines);

        let before = lines.len();
        let lines = expand::expand_packed(lines);
        debug!(records = known.len(), lines = lines.len(), expanded = lines.len().saturating_sub(before), "parsing");

        let graph = TreeBuilder::new(&self.config, known).build(&lines)?;
        Ok(ParsedDocument { graph, raw })
    }
}

/// Parse with the default configuration
pub fn parse(text: &str) -> ParseResult<ParsedDocument> {
    Parser::new().parse(text)
}
