//! Layer 3: CPS optimization.
//!
//! Extends durations into free gaps and merges neighbours until every entry
//! reads at or below the target CPS, or nothing improves it any more.
//!
//! The sequence is held as a linked list over fixed slots so merges never
//! shift the positions queued for work. Each sweep drains a worklist; sweeps
//! repeat until one changes nothing. Every change either consumes free gap
//! or removes an entry, so the loop terminates.

use crate::layer2_lines::merge_lines;
use sf_core::{Change, Entry, EntryState, OptimizerConfig, Phase, Timestamp};
use std::collections::VecDeque;

/// Split `budget` ms between the leading and trailing gap.
///
/// The side with more free gap is consumed first. Equal gaps are shared
/// evenly, the odd millisecond going to the trailing side. A zero gap
/// disables its side.
pub fn split_extension(leading_gap: u64, trailing_gap: u64, budget: u64) -> (u64, u64) {
    if leading_gap == trailing_gap {
        let lead = budget / 2;
        let trail = budget - lead;
        (lead.min(leading_gap), trail.min(trailing_gap))
    } else if trailing_gap > leading_gap {
        let trail = budget.min(trailing_gap);
        ((budget - trail).min(leading_gap), trail)
    } else {
        let lead = budget.min(leading_gap);
        (lead, (budget - lead).min(trailing_gap))
    }
}

/// Result of one optimizer pass. `states[i]` belongs to `entries[i]`.
#[derive(Debug, Clone)]
pub struct CpsOutcome {
    pub entries: Vec<Entry>,
    pub states: Vec<EntryState>,
    pub changes: Vec<Change>,
    pub extended: usize,
    pub merged: usize,
}

impl CpsOutcome {
    pub fn unresolved_positions(&self) -> Vec<usize> {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == EntryState::Unresolved)
            .map(|(i, _)| i)
            .collect()
    }
}

struct Slot {
    entry: Entry,
    cps_before: f64,
    was_candidate: bool,
    touched: bool,
}

struct Timeline {
    slots: Vec<Option<Slot>>,
    prev: Vec<Option<usize>>,
    next: Vec<Option<usize>>,
}

impl Timeline {
    fn new(entries: Vec<Entry>, max_cps: f64) -> Self {
        let n = entries.len();
        let slots = entries
            .into_iter()
            .map(|entry| {
                Some(Slot {
                    cps_before: entry.cps(),
                    was_candidate: entry.exceeds_cps(max_cps),
                    touched: false,
                    entry,
                })
            })
            .collect();
        let prev = (0..n).map(|i| i.checked_sub(1)).collect();
        let next = (0..n).map(|i| if i + 1 < n { Some(i + 1) } else { None }).collect();
        Self { slots, prev, next }
    }

    fn entry(&self, i: usize) -> Option<&Entry> {
        self.slots[i].as_ref().map(|s| &s.entry)
    }

    fn live(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.slots.len()).filter(|&i| self.slots[i].is_some())
    }

    fn into_parts(self) -> Vec<Slot> {
        self.slots.into_iter().flatten().collect()
    }
}

/// CPS optimizer over a full ordered sequence.
pub struct CpsOptimizer<'a> {
    config: &'a OptimizerConfig,
}

impl<'a> CpsOptimizer<'a> {
    pub fn new(config: &'a OptimizerConfig) -> Self {
        Self { config }
    }

    /// Full pass: extend, then merge, for every entry over target.
    pub fn optimize(&self, entries: Vec<Entry>) -> CpsOutcome {
        let mut tl = Timeline::new(entries, self.config.max_cps);
        let mut extended = 0;
        let mut merged = 0;

        loop {
            let mut changed = false;
            let mut queue: VecDeque<usize> = tl
                .live()
                .filter(|&i| tl.entry(i).is_some_and(|e| self.needs_work(e)))
                .collect();

            while let Some(i) = queue.pop_front() {
                let Some(entry) = tl.entry(i) else { continue };
                if !self.needs_work(entry) {
                    continue;
                }
                if self.try_extend(&mut tl, i) {
                    extended += 1;
                    changed = true;
                }
                let still_over = tl.entry(i).is_some_and(|e| e.exceeds_cps(self.config.max_cps));
                if still_over {
                    if let Some(survivor) = self.try_merge(&mut tl, i) {
                        merged += 1;
                        changed = true;
                        queue.push_back(survivor);
                    }
                }
            }

            if !changed {
                break;
            }
        }

        self.finish(tl, Phase::Cps, extended, merged)
    }

    /// Single-entry pass over `positions` (indices into `entries`): extension
    /// only, no merging. Used after the gateway has rewritten text.
    pub fn recheck(&self, entries: Vec<Entry>, positions: &[usize]) -> CpsOutcome {
        let mut tl = Timeline::new(entries, self.config.max_cps);
        let mut extended = 0;
        for &i in positions {
            if i >= tl.slots.len() {
                continue;
            }
            if let Some(slot) = tl.slots[i].as_mut() {
                slot.was_candidate = true;
            }
            let needs = tl.entry(i).is_some_and(|e| self.needs_work(e));
            if needs && self.try_extend(&mut tl, i) {
                extended += 1;
            }
        }
        self.finish(tl, Phase::Recheck, extended, 0)
    }

    fn needs_work(&self, e: &Entry) -> bool {
        e.exceeds_cps(self.config.max_cps)
            || (e.char_count() > 0 && e.duration_ms() < self.config.min_duration_ms)
    }

    fn leading_gap(&self, tl: &Timeline, i: usize) -> u64 {
        match (tl.prev[i].and_then(|p| tl.entry(p)), tl.entry(i)) {
            (Some(prev), Some(cur)) => cur.start.since(prev.end).saturating_sub(self.config.min_gap_ms),
            _ => 0,
        }
    }

    fn trailing_gap(&self, tl: &Timeline, i: usize) -> u64 {
        match (tl.entry(i), tl.next[i].and_then(|n| tl.entry(n))) {
            (Some(cur), Some(next)) => next.start.since(cur.end).saturating_sub(self.config.min_gap_ms),
            _ => 0,
        }
    }

    fn try_extend(&self, tl: &mut Timeline, i: usize) -> bool {
        let Some(entry) = tl.entry(i) else { return false };
        let duration = entry.duration_ms();
        if duration >= self.config.max_duration_ms {
            return false;
        }
        let target = entry
            .required_duration_ms(self.config.max_cps)
            .max(self.config.min_duration_ms)
            .min(self.config.max_duration_ms);
        if target <= duration {
            return false;
        }

        let leading = self.leading_gap(tl, i);
        let trailing = self.trailing_gap(tl, i);
        let (lead, trail) = split_extension(leading, trailing, target - duration);
        if lead + trail == 0 {
            return false;
        }

        let Some(slot) = tl.slots[i].as_mut() else { return false };
        let start = slot.entry.start.saturating_sub(lead);
        let end = slot.entry.end.saturating_add(trail);
        tracing::trace!(index = slot.entry.index, lead, trail, "extending entry");
        slot.entry.set_timing(start, end);
        slot.touched = true;
        true
    }

    /// Merge entry `i` with its best neighbour. Returns the surviving slot.
    fn try_merge(&self, tl: &mut Timeline, i: usize) -> Option<usize> {
        let current = tl.entry(i)?;
        let mut options: Vec<(usize, bool)> = Vec::with_capacity(2);
        if let Some(p) = tl.prev[i] {
            options.push((p, true));
        }
        if let Some(n) = tl.next[i] {
            options.push((n, false));
        }
        // Lowest neighbour CPS first; on a tie the following entry wins.
        options.sort_by(|a, b| {
            let ca = tl.entry(a.0).map(|e| e.cps()).unwrap_or(f64::INFINITY);
            let cb = tl.entry(b.0).map(|e| e.cps()).unwrap_or(f64::INFINITY);
            ca.total_cmp(&cb).then(a.1.cmp(&b.1))
        });

        for (neighbour, is_prev) in options {
            let (first, second) = if is_prev { (neighbour, i) } else { (i, neighbour) };
            let (Some(a), Some(b)) = (tl.entry(first), tl.entry(second)) else { continue };
            let merged = self.merge_pair(a, b);
            if !self.can_merge(&merged, current) {
                continue;
            }

            let second_slot = tl.slots[second].take()?;
            let first_slot = tl.slots[first].as_mut()?;
            tracing::debug!(
                first = first_slot.entry.index,
                second = second_slot.entry.index,
                cps_after = merged.cps(),
                "merging entries"
            );
            first_slot.entry = merged;
            first_slot.touched = true;
            first_slot.was_candidate |= second_slot.was_candidate;
            first_slot.cps_before = first_slot.cps_before.max(second_slot.cps_before);

            let after = tl.next[second];
            tl.next[first] = after;
            if let Some(n) = after {
                tl.prev[n] = Some(first);
            }
            tl.prev[second] = None;
            tl.next[second] = None;
            return Some(first);
        }
        None
    }

    fn merge_pair(&self, a: &Entry, b: &Entry) -> Entry {
        let lines = merge_lines(&a.lines, &b.lines, self.config.max_lines, self.config.soft_line_width());
        let start: Timestamp = a.start.min(b.start);
        let end: Timestamp = a.end.max(b.end);
        Entry::new(a.index, start, end, lines)
    }

    /// A merge may keep the density unchanged but never raise it.
    fn can_merge(&self, merged: &Entry, current: &Entry) -> bool {
        merged.duration_ms() <= self.config.max_duration_ms
            && merged.char_count() <= self.config.max_chars
            && merged.line_count() <= self.config.max_lines
            && merged.cps() <= current.cps()
    }

    fn finish(&self, tl: Timeline, phase: Phase, extended: usize, merged: usize) -> CpsOutcome {
        let mut entries = Vec::new();
        let mut states = Vec::new();
        let mut changes = Vec::new();

        for slot in tl.into_parts() {
            let over = slot.entry.exceeds_cps(self.config.max_cps);
            let state = match (over, slot.was_candidate) {
                (true, _) => EntryState::Unresolved,
                (false, true) => EntryState::Resolved,
                (false, false) => EntryState::Ok,
            };
            if slot.touched {
                changes.push(Change {
                    phase,
                    index: slot.entry.index,
                    cps_before: slot.cps_before,
                    cps_after: slot.entry.cps(),
                });
            }
            entries.push(slot.entry);
            states.push(state);
        }

        sf_core::renumber(&mut entries);
        CpsOutcome { entries, states, changes, extended, merged }
    }
}
