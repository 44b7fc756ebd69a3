//! GEDCOM reference grammar using Pest
//!
//! Recognises the line grammar (`LEVEL [@ID@] TAG [VALUE]`), single
//! cross-reference tokens (`@id@`), packed comma-separated token lists and
//! the dotted path expressions used by [`crate::graph::Graph::get`].

use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

#[derive(Parser)]
#[grammar = "grammar/gedcom.pest"]
struct GedcomGrammar;

/// Grammar errors
#[derive(Error, Debug)]
pub enum GrammarError {
    /// Pest parsing error
    #[error("Parse error: {0}")]
    PestError(#[from] Box<pest::error::Error<Rule>>),

    /// Numeric component out of range
    #[error("Number out of range: {0}")]
    NumberOutOfRange(String),
}

pub type GrammarResult<T> = Result<T, GrammarError>;

/// The parts of one syntactically valid GEDCOM line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineParts<'a> {
    pub level: usize,
    /// Record id without the surrounding `@`
    pub xref: Option<&'a str>,
    pub tag: &'a str,
    /// Free text to end of line; `None` when absent or empty
    pub value: Option<&'a str>,
}

/// One step of a path expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Select the children carrying this tag
    Tag(String),
    /// Select the n-th entry of the current selection (`0` or `items[0]`)
    Index(usize),
}

/// Match a line against `LEVEL [@ID@] TAG [VALUE]`.
///
/// Returns `None` for anything else; the caller treats such a line as a
/// continuation of the previous one.
pub fn parse_line(input: &str) -> Option<LineParts<'_>> {
    let line = GedcomGrammar::parse(Rule::line, input).ok()?.next()?;

    let mut level = None;
    let mut xref = None;
    let mut tag = None;
    let mut value = None;

    for inner in line.into_inner() {
        match inner.as_rule() {
            Rule::level => level = inner.as_str().parse::<usize>().ok(),
            Rule::xref => xref = inner.into_inner().next().map(|id| id.as_str()),
            Rule::tag => tag = Some(inner.as_str()),
            Rule::value => {
                let text = inner.as_str();
                if !text.trim().is_empty() {
                    value = Some(text);
                }
            }
            _ => {}
        }
    }

    Some(LineParts {
        level: level?,
        xref,
        tag: tag?,
        value,
    })
}

/// If `value` is exactly one `@id@` token, return the id.
pub fn parse_xref(value: &str) -> Option<&str> {
    let token = GedcomGrammar::parse(Rule::xref_token, value.trim()).ok()?.next()?;
    token
        .into_inner()
        .find(|p| p.as_rule() == Rule::xref)
        .and_then(|x| x.into_inner().next())
        .map(|id| id.as_str())
}

/// True when `value` is a single cross-reference token.
pub fn is_xref(value: &str) -> bool {
    parse_xref(value).is_some()
}

/// Split a packed `@A@,@B@` value into its ids.
///
/// Only values made of two or more tokens separated by commas qualify; a
/// single token or anything that reads like prose yields `None`.
pub fn split_xref_list(value: &str) -> Option<Vec<&str>> {
    let list = GedcomGrammar::parse(Rule::xref_list, value.trim()).ok()?.next()?;
    let ids: Vec<&str> = list
        .into_inner()
        .filter(|p| p.as_rule() == Rule::xref)
        .filter_map(|x| x.into_inner().next())
        .map(|id| id.as_str())
        .collect();

    if ids.len() >= 2 {
        Some(ids)
    } else {
        None
    }
}

/// Wrap an id as an `@id@` token
pub fn format_xref(id: &str) -> String {
    format!("@{}@", id)
}

/// Parse a path expression into segments.
///
/// `BIRT.DATE`, `BIRT.0.DATE.0` and `BIRT.items[0].DATE` all produce the
/// same addressing; tag segments are upper-cased.
pub fn parse_path(input: &str) -> GrammarResult<Vec<PathSegment>> {
    let pairs = GedcomGrammar::parse(Rule::path, input.trim()).map_err(Box::new)?;

    let mut segments = Vec::new();
    for pair in pairs {
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::path_tag => segments.push(PathSegment::Tag(inner.as_str().to_uppercase())),
                Rule::path_index => segments.push(PathSegment::Index(parse_index(inner.as_str())?)),
                Rule::items_index => {
                    if let Some(index) = inner.into_inner().next() {
                        segments.push(PathSegment::Index(parse_index(index.as_str())?));
                    }
                }
                _ => {}
            }
        }
    }

    Ok(segments)
}

fn parse_index(text: &str) -> GrammarResult<usize> {
    text.parse::<usize>()
        .map_err(|_| GrammarError::NumberOutOfRange(text.to_string()))
}
