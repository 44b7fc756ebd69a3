//! Multi-value line expansion
//!
//! `1 FAMS @F1@,@F2@` becomes `1 FAMS @F1@` and `1 FAMS @F2@`. Lines
//! nested under the packed line are repeated under every sibling.

use super::lines::Line;
use crate::grammar;
use tracing::trace;

/// Expand packed cross-reference lists into sibling lines
pub fn expand_packed(lines: Vec<Line>) -> Vec<Line> {
    expand_within(lines, None)
}

fn expand_within(lines: Vec<Line>, mut record_level: Option<usize>) -> Vec<Line> {
    let mut out = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        let line = &lines[i];
        if line.xref.is_some() && line.level == 0 {
            record_level = Some(line.level);
        }

        let ids = match (&line.value, record_level) {
            (Some(value), Some(level)) if line.level > level && line.xref.is_none() => {
                grammar::split_xref_list(value)
            }
            _ => None,
        };

        let Some(ids) = ids else {
            out.push(line.clone());
            i += 1;
            continue;
        };

        let end = subtree_end(&lines, i);
        let nested = expand_within(lines[i + 1..end].to_vec(), record_level);
        trace!(line = line.index, count = ids.len(), "expanding packed {} value", line.tag);

        for id in ids {
            let token = grammar::format_xref(id);
            out.push(Line::synthetic(line.index, line.level, &line.tag, Some(&token)));
            out.extend(nested.iter().cloned());
        }
        i = end;
    }

    out
}

/// Index one past the last line nested under `lines[start]`
fn subtree_end(lines: &[Line], start: usize) -> usize {
    let level = lines[start].level;
    lines[start + 1..]
        .iter()
        .position(|l| l.level <= level)
        .map_or(lines.len(), |offset| start + 1 + offset)
}
