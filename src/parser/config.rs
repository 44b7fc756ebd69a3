//! Parser configuration

use crate::graph::Tag;
use serde::Deserialize;

/// Inputs larger than this many bytes are purged (20 MiB)
pub const DEFAULT_PURGE_THRESHOLD: usize = 20 * 1024 * 1024;

/// What to do with an individual whose link field names another individual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkPolicy {
    /// Unify both into the linked individual and drop the linking one
    Merge,
    /// Copy the linked individual's fields onto the linking one, keep both
    Clone,
}

/// Linking pass configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LinkConfig {
    /// Field under an individual that points at its counterpart
    pub tag: Tag,
    pub policy: LinkPolicy,
}

/// Parser configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Size in bytes above which bulky substructures are stripped
    pub purge_threshold: usize,

    /// Individual field naming an ad hoc group
    pub member_tag: Option<Tag>,

    /// Individual field marking a pure reference placeholder
    pub ignore_tag: Option<Tag>,

    /// Optional linking pass run after the structural walk
    pub link: Option<LinkConfig>,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            purge_threshold: DEFAULT_PURGE_THRESHOLD,
            member_tag: Some(Tag::new("_MEMBER")),
            ignore_tag: Some(Tag::new("_IGNORE")),
            link: None,
        }
    }
}

impl ParseConfig {
    pub fn with_purge_threshold(mut self, bytes: usize) -> Self {
        self.purge_threshold = bytes;
        self
    }

    pub fn with_link(mut self, tag: impl Into<Tag>, policy: LinkPolicy) -> Self {
        self.link = Some(LinkConfig {
            tag: tag.into(),
            policy,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ParseConfig::default();
        assert_eq!(config.purge_threshold, 20_971_520);
        assert_eq!(config.member_tag, Some(Tag::new("_MEMBER")));
        assert!(config.link.is_none());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ParseConfig = serde_json::from_str(
            r#"{"purge_threshold": 1024, "link": {"tag": "_LINK", "policy": "clone"}}"#,
        )
        .unwrap();
        assert_eq!(config.purge_threshold, 1024);
        assert_eq!(config.ignore_tag, Some(Tag::new("_IGNORE")));
        assert_eq!(
            config.link,
            Some(LinkConfig {
                tag: Tag::new("_LINK"),
                policy: LinkPolicy::Clone
            })
        );
    }

    #[test]
    fn test_deserialize_yaml() {
        let config: ParseConfig =
            serde_yaml::from_str("member_tag: _GROUP\nlink:\n  tag: _SAME\n  policy: merge\n").unwrap();
        assert_eq!(config.member_tag, Some(Tag::new("_GROUP")));
        assert_eq!(config.link.unwrap().policy, LinkPolicy::Merge);
    }
}
