//! Layer 2: Line reduction, recombining and re-wrapping text under a line ceiling.
//!
//! Only line breaks move; words and timing are untouched. Joining two lines
//! inserts one space, so the character count may grow by one per join.

use sf_core::Entry;

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte offset of the space nearest to char position `target` (ties go to
/// the earlier space). `None` if the text has no space.
fn nearest_break(s: &str, target: usize) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (pos, (byte, c)) in s.char_indices().enumerate() {
        if c != ' ' {
            continue;
        }
        let dist = pos.abs_diff(target);
        match best {
            Some((d, _)) if d <= dist => {}
            _ => best = Some((dist, byte)),
        }
    }
    best.map(|(_, byte)| byte)
}

/// Wrap text into at most `max_lines` balanced lines.
///
/// Text that fits `soft_width` stays on one line. Otherwise it is split into
/// `ceil(len / soft_width)` lines (capped at `max_lines`), each break at the
/// space nearest the ideal position. Without a space the rest stays on one
/// over-long line.
pub fn reflow(text: &str, max_lines: usize, soft_width: usize) -> Vec<String> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return Vec::new();
    }
    let total = char_len(&normalized);
    let soft_width = soft_width.max(1);
    if max_lines <= 1 || total <= soft_width {
        return vec![normalized];
    }

    let wanted = total.div_ceil(soft_width).min(max_lines);
    let mut out = Vec::with_capacity(wanted);
    let mut rest = normalized.as_str();
    for remaining in (2..=wanted).rev() {
        let target = char_len(rest) / remaining;
        match nearest_break(rest, target) {
            Some(byte) => {
                out.push(rest[..byte].to_string());
                rest = &rest[byte + 1..];
            }
            None => break,
        }
    }
    out.push(rest.to_string());
    out
}

/// Bring `lines` down to `max_lines`.
///
/// Adjacent lines are joined top-down while the join fits `soft_width`. If
/// that cannot reach the ceiling, the whole text is re-wrapped with [`reflow`].
pub fn reduce_lines(lines: &[String], max_lines: usize, soft_width: usize) -> Vec<String> {
    let mut lines: Vec<String> = lines
        .iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    let max_lines = max_lines.max(1);

    while lines.len() > max_lines {
        let fit = (0..lines.len() - 1)
            .find(|&i| char_len(&lines[i]) + 1 + char_len(&lines[i + 1]) <= soft_width);
        match fit {
            Some(i) => {
                let next = lines.remove(i + 1);
                lines[i].push(' ');
                lines[i].push_str(&next);
            }
            None => return reflow(&lines.join(" "), max_lines, soft_width),
        }
    }
    lines
}

/// Text of two adjacent entries combined under the line ceiling.
pub fn merge_lines(first: &[String], second: &[String], max_lines: usize, soft_width: usize) -> Vec<String> {
    let combined: Vec<String> = first.iter().chain(second.iter()).cloned().collect();
    if combined.len() <= max_lines {
        return combined;
    }
    reduce_lines(&combined, max_lines, soft_width)
}

/// Reduce an entry's lines in place. Returns whether anything changed.
pub fn reduce_entry(entry: &mut Entry, max_lines: usize, soft_width: usize) -> bool {
    if entry.line_count() <= max_lines {
        return false;
    }
    let lines = reduce_lines(&entry.lines, max_lines, soft_width);
    if lines == entry.lines {
        return false;
    }
    entry.set_lines(lines);
    true
}
