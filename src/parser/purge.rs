//! Size guard for oversized documents
//!
//! Strips every `NOTE`/`OBJE`/`SOUR` subtree below level 0 and every
//! top-level `SOUR` record, then stamps `HEAD` with `1 _PURGED Y`.

use super::lines::Line;
use crate::graph::tags;

const STRIPPED_FIELDS: [&str; 3] = [tags::NOTE, tags::OBJE, tags::SOUR];

/// True when the header already carries the purge marker
pub fn is_marked(lines: &[Line]) -> bool {
    let mut in_header = false;
    for line in lines {
        if line.level == 0 {
            if in_header {
                return false;
            }
            in_header = line.tag == tags::HEAD;
        } else if in_header && line.level == 1 && line.tag == tags::PURGED {
            return true;
        }
    }
    false
}

fn is_stripped(line: &Line) -> bool {
    if line.level == 0 {
        line.tag == tags::SOUR && line.xref.is_some()
    } else {
        STRIPPED_FIELDS.contains(&line.tag.as_str())
    }
}

/// Drop bulky subtrees and stamp the header
pub fn purge(lines: Vec<Line>) -> Vec<Line> {
    let mut kept = Vec::with_capacity(lines.len());
    let mut skip_below: Option<usize> = None;

    for line in lines {
        if let Some(level) = skip_below {
            if line.level > level {
                continue;
            }
            skip_below = None;
        }
        if is_stripped(&line) {
            skip_below = Some(line.level);
            continue;
        }
        kept.push(line);
    }

    stamp(&mut kept);
    kept
}

fn stamp(lines: &mut Vec<Line>) {
    let head = lines
        .iter()
        .position(|l| l.level == 0 && l.tag == tags::HEAD);
    match head {
        Some(pos) => {
            let index = lines[pos].index;
            lines.insert(pos + 1, Line::synthetic(index, 1, tags::PURGED, Some("Y")));
        }
        None => {
            lines.insert(0, Line::synthetic(0, 0, tags::HEAD, None));
            lines.insert(1, Line::synthetic(0, 1, tags::PURGED, Some("Y")));
        }
    }
}
