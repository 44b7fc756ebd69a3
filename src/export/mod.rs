//! Output formats for a [`Graph`]
//!
//! - GEDCOM text (`.ged`), readable by the parser again
//! - JSON (`.json`), a structural dump used for comparisons

pub mod gedcom;
pub mod json;

pub use gedcom::{node_to_gedcom, to_gedcom, write_gedcom};
pub use json::{node_json, to_json};

use crate::graph::Graph;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Export format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// GEDCOM text (.ged)
    Gedcom,
    /// Pretty-printed JSON (.json)
    Json,
}

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

pub type ExportResult<T> = Result<T, ExportError>;

impl ExportFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        ext.parse().ok()
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ged" | "gedcom" => Ok(ExportFormat::Gedcom),
            "json" => Ok(ExportFormat::Json),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Render `graph` in `format`
pub fn render(graph: &Graph, format: ExportFormat) -> ExportResult<String> {
    match format {
        ExportFormat::Gedcom => Ok(to_gedcom(graph)),
        ExportFormat::Json => Ok(serde_json::to_string_pretty(&to_json(graph))?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_str_and_path() {
        assert_eq!("GED".parse::<ExportFormat>().unwrap(), ExportFormat::Gedcom);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!(matches!(
            "csv".parse::<ExportFormat>(),
            Err(ExportError::UnsupportedFormat(f)) if f == "csv"
        ));
        assert_eq!(ExportFormat::from_path(Path::new("tree.ged")), Some(ExportFormat::Gedcom));
        assert_eq!(ExportFormat::from_path(Path::new("tree")), None);
    }

    #[test]
    fn test_render_json_is_valid() {
        let graph = crate::parser::parse("0 @I1@ INDI\n1 NAME Ann\n").unwrap().graph;
        let text = render(&graph, ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["records"]["INDI"]["I1"]["tag"], "INDI");
    }
}
