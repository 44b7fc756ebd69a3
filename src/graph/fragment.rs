//! Owned, graph-independent copies of node subtrees
//!
//! Fragments carry pointers by xref id rather than by arena slot, so a
//! subtree taken from one graph can be rewritten and grafted into another.

use super::types::{Tag, XrefId};

/// Detached copy of a node and its descendants
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub tag: Tag,
    pub value: Option<String>,
    /// Target record when the source node held a resolved reference
    pub pointer: Option<XrefId>,
    pub children: Vec<Fragment>,
}

impl Fragment {
    pub fn new(tag: impl Into<Tag>, value: Option<String>) -> Self {
        Fragment {
            tag: tag.into(),
            value,
            pointer: None,
            children: Vec::new(),
        }
    }

    /// A field pointing at `target`
    pub fn pointer(tag: impl Into<Tag>, target: XrefId) -> Self {
        Fragment {
            tag: tag.into(),
            value: Some(target.token()),
            pointer: Some(target),
            children: Vec::new(),
        }
    }

    /// Map every pointer in this subtree through `remap`.
    ///
    /// A pointer `remap` has no entry for is dropped and its value kept as
    /// plain text, so it can never resolve to an unrelated record.
    pub fn rewrite_pointers<F>(&mut self, remap: &F)
    where
        F: Fn(&XrefId) -> Option<XrefId>,
    {
        if let Some(target) = self.pointer.take() {
            if let Some(mapped) = remap(&target) {
                self.value = Some(mapped.token());
                self.pointer = Some(mapped);
            }
        }
        for child in &mut self.children {
            child.rewrite_pointers(remap);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_pointers() {
        let mut fams = Fragment::pointer("FAMS", XrefId::new("F2"));
        fams.children.push(Fragment::new("NOTE", Some("@F2@ is not a pointer here".into())));

        fams.rewrite_pointers(&|x: &XrefId| {
            (x.as_str() == "F2").then(|| XrefId::new("F1"))
        });

        assert_eq!(fams.pointer, Some(XrefId::new("F1")));
        assert_eq!(fams.value.as_deref(), Some("@F1@"));
        assert_eq!(fams.children[0].value.as_deref(), Some("@F2@ is not a pointer here"));
        assert_eq!(fams.children.len(), 1);
    }

    #[test]
    fn test_unmapped_pointer_becomes_text() {
        let mut husb = Fragment::pointer("HUSB", XrefId::new("I9"));
        husb.rewrite_pointers(&|_: &XrefId| None);
        assert_eq!(husb.value.as_deref(), Some("@I9@"));
        assert_eq!(husb.pointer, None);
    }
}
