//! Layer 0: Sequence normalization.
//!
//! Orders entries by start time and removes overlaps so every later phase can
//! rely on `start[i + 1] >= end[i]`.

use crate::layer2_lines::merge_lines;
use sf_core::{Entry, OptimizerConfig};

#[derive(Debug, Clone, Default)]
pub struct NormalizeOutcome {
    pub entries: Vec<Entry>,
    pub clipped: usize,
    pub merged: usize,
}

/// Sort entries by start (stable) and clip overlapping ends to the next
/// start. Entries sharing a start time are combined into one.
pub fn normalize(mut entries: Vec<Entry>, config: &OptimizerConfig) -> NormalizeOutcome {
    entries.sort_by_key(|e| e.start);

    let mut out: Vec<Entry> = Vec::with_capacity(entries.len());
    let mut clipped = 0;
    let mut merged = 0;

    for entry in entries {
        if let Some(last) = out.last_mut() {
            if entry.start == last.start {
                tracing::warn!(first = last.index, second = entry.index, "entries share a start time, combining");
                let lines = merge_lines(&last.lines, &entry.lines, config.max_lines, config.soft_line_width());
                let end = last.end.max(entry.end);
                last.lines = lines;
                last.end = end;
                last.recompute();
                merged += 1;
                continue;
            }
            if entry.start < last.end {
                tracing::warn!(index = last.index, next = entry.index, "overlapping entries, clipping end");
                last.end = entry.start;
                last.recompute();
                clipped += 1;
            }
        }
        out.push(entry);
    }

    sf_core::renumber(&mut out);
    NormalizeOutcome { entries: out, clipped, merged }
}
