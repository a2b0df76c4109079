//! SubRip (`.srt`) reader and writer.

use regex::Regex;
use sf_core::{Entry, Result, SubFitError, Timestamp};
use std::sync::LazyLock;

use crate::decode::normalize_line_endings;
use crate::traits::SubtitleFormat;

/// Timing line; anything after the end time (position hints) is ignored.
static RE_TIMING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\S+)\s*-->\s*(\S+)").unwrap());

/// SubRip format: blocks of index, timing line, text lines, blank line.
pub struct SrtFormat;

impl SrtFormat {
    pub fn new() -> Self { Self }
}

impl Default for SrtFormat {
    fn default() -> Self { Self::new() }
}

impl SubtitleFormat for SrtFormat {
    fn parse_content(&self, content: &str) -> Result<Vec<Entry>> {
        let content = normalize_line_endings(content.trim_start_matches('\u{FEFF}'));
        let lines: Vec<&str> = content.split('\n').collect();
        let mut entries = Vec::new();
        let mut i = 0;

        loop {
            while i < lines.len() && lines[i].trim().is_empty() {
                i += 1;
            }
            if i >= lines.len() {
                break;
            }

            let index_line = lines[i].trim();
            let index: usize = index_line.parse().map_err(|_| {
                SubFitError::parse(i + 1, format!("expected subtitle index, found '{}'", index_line))
            })?;
            i += 1;

            let timing = lines
                .get(i)
                .ok_or_else(|| SubFitError::parse(i + 1, format!("missing timing line for entry {}", index)))?;
            let (start, end) = parse_timing(timing, i + 1)?;
            i += 1;

            let mut text = Vec::new();
            while i < lines.len() && !lines[i].trim().is_empty() {
                if starts_next_block(&lines, i) {
                    break;
                }
                text.push(lines[i].trim_end().to_string());
                i += 1;
            }

            entries.push(Entry::new(index, start, end, text));
        }

        tracing::debug!(count = entries.len(), "parsed srt entries");
        Ok(entries)
    }

    fn serialize(&self, entries: &[Entry]) -> String {
        let blocks: Vec<String> = entries
            .iter()
            .map(|e| {
                let mut block = format!("{}\n{} --> {}\n", e.index, e.start, e.end);
                for line in &e.lines {
                    block.push_str(line);
                    block.push('\n');
                }
                block
            })
            .collect();
        blocks.join("\n")
    }

    fn supported_extensions(&self) -> Vec<String> {
        vec![".srt".into()]
    }
}

fn parse_timing(line: &str, line_no: usize) -> Result<(Timestamp, Timestamp)> {
    let caps = RE_TIMING
        .captures(line)
        .ok_or_else(|| SubFitError::parse(line_no, format!("expected timing line, found '{}'", line.trim())))?;
    let start = Timestamp::parse(&caps[1])
        .ok_or_else(|| SubFitError::parse(line_no, format!("unreadable start time '{}'", &caps[1])))?;
    let end = Timestamp::parse(&caps[2])
        .ok_or_else(|| SubFitError::parse(line_no, format!("unreadable end time '{}'", &caps[2])))?;
    if end < start {
        return Err(SubFitError::parse(line_no, format!("end time {} precedes start time {}", end, start)));
    }
    Ok((start, end))
}

/// A numeric line directly followed by a timing line opens a new block even
/// without the blank separator.
fn starts_next_block(lines: &[&str], i: usize) -> bool {
    let is_number = {
        let t = lines[i].trim();
        !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit())
    };
    is_number && lines.get(i + 1).is_some_and(|next| RE_TIMING.is_match(next))
}
