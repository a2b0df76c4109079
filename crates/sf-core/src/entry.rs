//! The timed-text record and its derived readability metrics.

use crate::time::Timestamp;

/// CPS is computed over at least one frame (25 fps) so zero-length entries
/// never divide by zero.
pub const CPS_FRAME_FLOOR_MS: u64 = 40;

/// Metrics derived from an entry's text and timing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Metrics {
    pub duration_ms: u64,
    pub char_count: usize,
    pub line_count: usize,
    pub cps: f64,
}

/// One timed text unit.
///
/// Metrics are cached. Every mutation of `start`, `end` or `lines` must be
/// followed by [`Entry::recompute`]; the helpers on this type do so already.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub index: usize,
    pub start: Timestamp,
    pub end: Timestamp,
    pub lines: Vec<String>,
    metrics: Metrics,
}

impl Entry {
    pub fn new(index: usize, start: Timestamp, end: Timestamp, lines: Vec<String>) -> Self {
        let mut entry = Self { index, start, end, lines, metrics: Metrics::default() };
        entry.recompute();
        entry
    }

    /// Build from newline-separated text.
    pub fn from_text(index: usize, start: Timestamp, end: Timestamp, text: &str) -> Self {
        Self::new(index, start, end, split_lines(text))
    }

    pub fn recompute(&mut self) {
        let duration_ms = self.end.since(self.start);
        let char_count = self.lines.iter().map(|l| l.chars().count()).sum();
        let cps = char_count as f64 * 1000.0 / duration_ms.max(CPS_FRAME_FLOOR_MS) as f64;
        self.metrics = Metrics { duration_ms, char_count, line_count: self.lines.len(), cps };
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics
    }

    pub fn duration_ms(&self) -> u64 {
        self.metrics.duration_ms
    }

    pub fn char_count(&self) -> usize {
        self.metrics.char_count
    }

    pub fn line_count(&self) -> usize {
        self.metrics.line_count
    }

    pub fn cps(&self) -> f64 {
        self.metrics.cps
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }

    pub fn set_lines(&mut self, lines: Vec<String>) {
        self.lines = lines;
        self.recompute();
    }

    pub fn set_text(&mut self, text: &str) {
        self.set_lines(split_lines(text));
    }

    pub fn set_timing(&mut self, start: Timestamp, end: Timestamp) {
        self.start = start;
        self.end = end;
        self.recompute();
    }

    /// Shortest duration at which the text reads at or below `max_cps`.
    pub fn required_duration_ms(&self, max_cps: f64) -> u64 {
        if self.metrics.char_count == 0 || max_cps <= 0.0 {
            return 0;
        }
        // Epsilon absorbs float noise so exact ratios are not rounded up.
        ((self.metrics.char_count as f64 * 1000.0 / max_cps) - 1e-9).ceil() as u64
    }

    pub fn exceeds_cps(&self, max_cps: f64) -> bool {
        self.metrics.duration_ms.max(CPS_FRAME_FLOOR_MS) < self.required_duration_ms(max_cps)
    }

    /// Characters the text may hold at its current duration, capped at `max_chars`.
    pub fn char_budget(&self, max_cps: f64, max_chars: usize) -> usize {
        let by_cps = (max_cps * self.metrics.duration_ms as f64 / 1000.0).floor() as usize;
        by_cps.min(max_chars)
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.replace("\r\n", "\n")
        .split('\n')
        .map(|l| l.to_string())
        .filter(|l| !l.trim().is_empty())
        .collect()
}

/// Re-assign 1-based indices in sequence order.
pub fn renumber(entries: &mut [Entry]) {
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.index = i + 1;
    }
}
