//! Logical line splitting
//!
//! Physical lines are matched against the line grammar. A line that does
//! not match continues the previous one: its text is appended verbatim
//! after a newline.

use super::{LineError, ParseError, ParseResult};
use crate::grammar::{self, LineParts};
use crate::graph::{tags, Tag};
use regex::Regex;
use rustc_hash::FxHashMap;
use std::sync::LazyLock;

static RECORD_LINE: LazyLock<Regex> = LazyLock::new(|| {
    // Same separators as the line grammar: runs of spaces, level `0` or `00`
    Regex::new(r"(?m)^ *0+ +@([^@\s]+)@ +([A-Z_][A-Z0-9_]*)(?:[ \r]|$)").expect("record line pattern is valid")
});

/// One logical line of a GEDCOM document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Zero-based index of the first physical line
    pub index: usize,
    /// Raw text, continuations included
    pub raw: String,
    pub level: usize,
    pub xref: Option<String>,
    pub tag: String,
    pub value: Option<String>,
}

impl Line {
    fn from_parts(index: usize, raw: &str, parts: LineParts<'_>) -> Self {
        Line {
            index,
            raw: raw.to_string(),
            level: parts.level,
            xref: parts.xref.map(str::to_string),
            tag: parts.tag.to_string(),
            value: parts.value.map(str::to_string),
        }
    }

    /// Build a line that did not come from the source text
    pub fn synthetic(index: usize, level: usize, tag: &str, value: Option<&str>) -> Self {
        let raw = match value {
            Some(v) => format!("{} {} {}", level, tag, v),
            None => format!("{} {}", level, tag),
        };
        Line {
            index,
            raw,
            level,
            xref: None,
            tag: tag.to_string(),
            value: value.map(str::to_string),
        }
    }

    fn continue_with(&mut self, text: &str) {
        self.raw.push('\n');
        self.raw.push_str(text);
        self.value = Some(match self.value.take() {
            Some(mut v) => {
                v.push('\n');
                v.push_str(text);
                v
            }
            None => text.to_string(),
        });
    }

    pub fn is_trailer(&self) -> bool {
        self.level == 0 && self.xref.is_none() && self.tag == tags::TRLR
    }
}

/// Split `text` into logical lines, joining continuations.
///
/// Blank lines and a leading byte order mark are dropped. A continuation
/// with nothing before it is an error.
pub fn logical_lines(text: &str) -> ParseResult<Vec<Line>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines: Vec<Line> = Vec::new();

    for (index, physical) in text.lines().enumerate() {
        if physical.trim().is_empty() {
            continue;
        }
        match grammar::parse_line(physical) {
            Some(parts) => lines.push(Line::from_parts(index, physical, parts)),
            None => match lines.last_mut() {
                Some(prev) => prev.continue_with(physical),
                None => {
                    return Err(ParseError::Line {
                        index,
                        line: physical.to_string(),
                        source: LineError::OrphanContinuation,
                    })
                }
            },
        }
    }

    Ok(lines)
}

/// Make the document end with exactly one `0 TRLR`
pub fn ensure_trailer(lines: &mut Vec<Line>) {
    while lines.last().is_some_and(Line::is_trailer) {
        lines.pop();
    }
    let index = lines.last().map_or(0, |l| l.index + l.raw.matches('\n').count() + 1);
    lines.push(Line::synthetic(index, 0, tags::TRLR, None));
}

/// Join lines back into document text
pub fn render(lines: &[Line]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&line.raw);
        out.push('\n');
    }
    out
}

/// Map every top-level record id in `text` to its tag
pub fn prescan(text: &str) -> FxHashMap<String, Tag> {
    RECORD_LINE
        .captures_iter(text)
        .map(|caps| (caps[1].to_string(), Tag::new(&caps[2])))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines() {
        let lines = logical_lines("0 HEAD\r\n1 CHAR UTF-8\r\n\r\n0 @I1@ INDI\n").unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].tag, "CHAR");
        assert_eq!(lines[1].value.as_deref(), Some("UTF-8"));
        assert_eq!(lines[2].xref.as_deref(), Some("I1"));
        assert_eq!(lines[2].index, 3);
    }

    #[test]
    fn test_continuation_joins_previous() {
        let text = "0 @N1@ NOTE first part\nsecond part\n1 CONC more";
        let lines = logical_lines(text).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].raw, "0 @N1@ NOTE first part\nsecond part");
        assert_eq!(lines[0].value.as_deref(), Some("first part\nsecond part"));
    }

    #[test]
    fn test_orphan_continuation_fails() {
        let err = logical_lines("\nnot a line\n0 HEAD").unwrap_err();
        match err {
            ParseError::Line { index, line, .. } => {
                assert_eq!(index, 1);
                assert_eq!(line, "not a line");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_bom_is_dropped() {
        let lines = logical_lines("\u{feff}0 HEAD").unwrap();
        assert_eq!(lines[0].tag, "HEAD");
    }

    #[test]
    fn test_exactly_one_trailer() {
        let mut lines = logical_lines("0 HEAD\n0 TRLR\n0 TRLR\n").unwrap();
        ensure_trailer(&mut lines);
        assert_eq!(render(&lines), "0 HEAD\n0 TRLR\n");

        let mut lines = logical_lines("0 HEAD\n").unwrap();
        ensure_trailer(&mut lines);
        assert_eq!(lines.iter().filter(|l| l.is_trailer()).count(), 1);
    }

    #[test]
    fn test_prescan() {
        let known = prescan("0 HEAD\n0 @I1@ INDI\n1 FAMS @F1@\n0 @F1@ FAM\r\n  0 @S1@ SOUR\n");
        assert_eq!(known.len(), 3);
        assert_eq!(known.get("I1"), Some(&Tag::new("INDI")));
        assert_eq!(known.get("F1"), Some(&Tag::new("FAM")));
        assert_eq!(known.get("S1"), Some(&Tag::new("SOUR")));
    }

    #[test]
    fn test_prescan_accepts_grammar_spacing() {
        let known = prescan("0  @I1@   INDI
00 @F1@ FAM
0 @X1@ Indi
1 @I9@ INDI
");
        assert_eq!(known.len(), 2);
        assert_eq!(known.get("I1"), Some(&Tag::new("INDI")));
        assert_eq!(known.get("F1"), Some(&Tag::new("FAM")));

        // Every record the walk accepts is known to the pre-scan
        let lines = logical_lines("0  @I1@   INDI
00 @F1@ FAM
").unwrap();
        for line in &lines {
            assert!(known.contains_key(line.xref.as_deref().unwrap()));
        }
    }
}
