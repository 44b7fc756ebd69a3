//! Core type definitions for the GEDCOM graph

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Well-known GEDCOM tags
pub mod tags {
    pub const HEAD: &str = "HEAD";
    pub const TRLR: &str = "TRLR";
    pub const INDI: &str = "INDI";
    pub const FAM: &str = "FAM";
    pub const SOUR: &str = "SOUR";
    pub const REPO: &str = "REPO";
    pub const SUBM: &str = "SUBM";
    pub const OBJE: &str = "OBJE";
    pub const NOTE: &str = "NOTE";
    pub const NAME: &str = "NAME";
    pub const HUSB: &str = "HUSB";
    pub const WIFE: &str = "WIFE";
    pub const CHIL: &str = "CHIL";
    pub const FAMS: &str = "FAMS";
    pub const FAMC: &str = "FAMC";
    pub const GEDC: &str = "GEDC";
    pub const VERS: &str = "VERS";
    pub const CHAR: &str = "CHAR";
    /// Header marker stamped on purged output
    pub const PURGED: &str = "_PURGED";
}

/// Arena index of a node inside its owning [`super::Graph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn new(index: usize) -> Self {
        NodeId(index as u32)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Cross-reference id of a record, stored without the surrounding `@`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct XrefId(String);

impl XrefId {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        match id.strip_prefix('@').and_then(|s| s.strip_suffix('@')) {
            Some(inner) => XrefId(inner.to_string()),
            None => XrefId(id),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `@id@` token form
    pub fn token(&self) -> String {
        crate::grammar::format_xref(&self.0)
    }
}

impl fmt::Display for XrefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}@", self.0)
    }
}

impl Borrow<str> for XrefId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for XrefId {
    fn from(s: &str) -> Self {
        XrefId::new(s)
    }
}

impl From<String> for XrefId {
    fn from(s: String) -> Self {
        XrefId::new(s)
    }
}

/// GEDCOM tag (e.g. `INDI`, `NAME`, `_MEMBER`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
    pub fn new(tag: impl Into<String>) -> Self {
        Tag(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Private/extension tags start with `_`
    pub fn is_private(&self) -> bool {
        self.0.starts_with('_')
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for Tag {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Tag {
    fn from(s: &str) -> Self {
        Tag(s.to_string())
    }
}

impl From<String> for Tag {
    fn from(s: String) -> Self {
        Tag(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id() {
        let id = NodeId::new(42);
        assert_eq!(id.index(), 42);
        assert_eq!(format!("{}", id), "NodeId(42)");
    }

    #[test]
    fn test_xref_strips_delimiters() {
        let plain = XrefId::new("I1");
        let token = XrefId::new("@I1@");
        assert_eq!(plain, token);
        assert_eq!(plain.as_str(), "I1");
        assert_eq!(plain.token(), "@I1@");
        assert_eq!(format!("{}", plain), "@I1@");
    }

    #[test]
    fn test_tag() {
        let tag = Tag::new("NAME");
        assert_eq!(tag.as_str(), "NAME");
        assert!(!tag.is_private());

        let private: Tag = "_MEMBER".into();
        assert!(private.is_private());
    }

    #[test]
    fn test_id_ordering() {
        assert!(NodeId::new(1) < NodeId::new(2));
        assert!(XrefId::new("I1") < XrefId::new("I2"));
    }
}
