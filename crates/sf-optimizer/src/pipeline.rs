//! Subtitle pipeline: runs the layers in fixed order and partitions the final
//! sequence into entries that meet the target and entries that do not.
//!
//! normalize → fillers → lines → CPS (extend + merge) → gateway → recheck

use crate::layer0_normalize::normalize;
use crate::layer1_fillers::{remove_fillers, FillerList, FillerOptions};
use crate::layer2_lines::reduce_entry;
use crate::layer3_cps::CpsOptimizer;
use sf_core::{
    Change, Entry, Flag, FlagKind, OptimizerConfig, Phase, PipelineCounts, PipelineResult, Result,
    ShortenRequest, Shortener, Shortening, SubFitError,
};
use tracing::{debug, info, warn};

const CONTEXT_CHARS: usize = 100;

/// Working state handed from phase to phase.
struct RunState {
    entries: Vec<Entry>,
    changes: Vec<Change>,
    counts: PipelineCounts,
}

impl RunState {
    fn new(entries: Vec<Entry>) -> Self {
        Self { entries, changes: Vec::new(), counts: PipelineCounts::default() }
    }

    fn record(&mut self, phase: Phase, index: usize, cps_before: f64, cps_after: f64) {
        debug!(%phase, index, cps_before, cps_after, "entry changed");
        self.changes.push(Change { phase, index, cps_before, cps_after });
    }
}

/// The main subtitle pipeline.
pub struct SubtitlePipeline {
    config: OptimizerConfig,
    fillers: FillerList,
}

impl SubtitlePipeline {
    /// Validate the configuration and load the filler list it names.
    pub fn new(config: OptimizerConfig) -> Result<Self> {
        config.validate()?;
        let fillers = match &config.filler.word_list {
            Some(path) => FillerList::load(path)?,
            None => FillerList::english(),
        };
        Ok(Self { config, fillers })
    }

    fn filler_options(&self) -> FillerOptions {
        FillerOptions {
            only_separated_lines: self.config.filler.only_separated_lines,
            capitalize_after_removal: self.config.filler.capitalize_after_removal,
        }
    }

    /// Local phases only; no gateway round-trip.
    pub fn run_local(&self, entries: Vec<Entry>) -> PipelineResult {
        let state = self.run_phases(entries);
        self.finish(state)
    }

    /// Full run. With a gateway, entries left over target after the local
    /// phases are sent for shortening and re-checked.
    pub async fn run(&self, entries: Vec<Entry>, gateway: Option<&dyn Shortener>) -> PipelineResult {
        let mut state = self.run_phases(entries);
        if let Some(gateway) = gateway {
            let requests = self.unresolved_requests(&state.entries);
            if !requests.is_empty() {
                self.gateway_phase(&mut state, &requests, gateway).await;
            }
        }
        self.finish(state)
    }

    /// Resume from a snapshot produced by an earlier run: upstream phases are
    /// skipped and only the entries at `indices` go through the gateway.
    pub async fn resume(
        &self,
        entries: Vec<Entry>,
        indices: &[usize],
        gateway: &dyn Shortener,
    ) -> Result<PipelineResult> {
        let mut requests = Vec::with_capacity(indices.len());
        for &index in indices {
            let pos = entries
                .iter()
                .position(|e| e.index == index)
                .ok_or_else(|| SubFitError::ManifestMismatch(format!("no entry with index {}", index)))?;
            requests.push(build_request(&entries, pos, &self.config));
        }
        let mut state = RunState::new(entries);
        if !requests.is_empty() {
            self.gateway_phase(&mut state, &requests, gateway).await;
        }
        Ok(self.finish(state))
    }

    fn run_phases(&self, entries: Vec<Entry>) -> RunState {
        let normalized = normalize(entries, &self.config);
        if normalized.clipped + normalized.merged > 0 {
            info!(clipped = normalized.clipped, merged = normalized.merged, "normalized overlapping entries");
        }
        let mut state = RunState::new(normalized.entries);
        state.counts.normalized = normalized.clipped + normalized.merged;

        if self.config.filler.enabled {
            self.filler_phase(&mut state);
        }
        self.line_phase(&mut state);
        if self.config.optimize_cps {
            self.cps_phase(&mut state);
        }
        state
    }

    fn filler_phase(&self, state: &mut RunState) {
        let opts = self.filler_options();
        let before = state.entries.len();
        let mut kept = Vec::with_capacity(before);

        for mut entry in std::mem::take(&mut state.entries) {
            let cps_before = entry.cps();
            if remove_fillers(&mut entry, &self.fillers, opts) {
                state.counts.fillers_removed += 1;
                state.record(Phase::Fillers, entry.index, cps_before, entry.cps());
            }
            if entry.is_empty() {
                debug!(index = entry.index, "dropping entry left empty");
                continue;
            }
            kept.push(entry);
        }

        state.counts.entries_dropped += before - kept.len();
        sf_core::renumber(&mut kept);
        state.entries = kept;
        info!(
            modified = state.counts.fillers_removed,
            dropped = state.counts.entries_dropped,
            "filler removal done"
        );
    }

    fn line_phase(&self, state: &mut RunState) {
        let max_lines = self.config.max_lines;
        let width = self.config.soft_line_width();
        let mut changed = Vec::new();
        for entry in state.entries.iter_mut() {
            let cps_before = entry.cps();
            if reduce_entry(entry, max_lines, width) {
                changed.push((entry.index, cps_before, entry.cps()));
            }
        }
        for (index, before, after) in changed {
            state.counts.lines_reduced += 1;
            state.record(Phase::Lines, index, before, after);
        }
        info!(reduced = state.counts.lines_reduced, max_lines, "line reduction done");
    }

    fn cps_phase(&self, state: &mut RunState) {
        let outcome = CpsOptimizer::new(&self.config).optimize(std::mem::take(&mut state.entries));
        for change in &outcome.changes {
            debug!(phase = %change.phase, index = change.index, cps_before = change.cps_before, cps_after = change.cps_after, "entry changed");
        }
        state.counts.extended += outcome.extended;
        state.counts.merged += outcome.merged;
        state.changes.extend(outcome.changes);
        state.entries = outcome.entries;
        info!(
            extended = outcome.extended,
            merged = outcome.merged,
            unresolved = outcome.states.iter().filter(|s| **s == sf_core::EntryState::Unresolved).count(),
            target = self.config.max_cps,
            "cps optimization done"
        );
    }

    async fn gateway_phase(&self, state: &mut RunState, requests: &[ShortenRequest], gateway: &dyn Shortener) {
        info!(gateway = gateway.name(), requests = requests.len(), "sending entries for shortening");
        let replies = gateway.shorten_batch(requests).await;
        let mut positions = Vec::new();

        for (index, reply) in replies {
            let Some(pos) = state.entries.iter().position(|e| e.index == index) else {
                warn!(index, "gateway replied for an unknown entry");
                continue;
            };
            match reply {
                Ok(Shortening::Shortened(text)) => {
                    if self.apply_shortened(state, pos, &text) {
                        positions.push(pos);
                    }
                }
                Ok(Shortening::Deferred) => debug!(index, "shortening deferred"),
                Ok(Shortening::NoSafeShortening) => info!(index, "no safe shortening found"),
                Err(e) => {
                    warn!(index, error = %e, "gateway failed for entry");
                    state.counts.gateway_failures += 1;
                }
            }
        }

        if positions.is_empty() {
            return;
        }
        let outcome = CpsOptimizer::new(&self.config).recheck(std::mem::take(&mut state.entries), &positions);
        state.counts.extended += outcome.extended;
        state.changes.extend(outcome.changes);
        state.entries = outcome.entries;
    }

    fn apply_shortened(&self, state: &mut RunState, pos: usize, text: &str) -> bool {
        let entry = &state.entries[pos];
        let index = entry.index;
        let mut updated = Entry::from_text(index, entry.start, entry.end, text.trim());
        if updated.is_empty() {
            warn!(index, "gateway returned empty text, keeping original");
            return false;
        }
        // Judged after fitting: joining surplus lines adds a space per join.
        reduce_entry(&mut updated, self.config.max_lines, self.config.soft_line_width());
        if updated.char_count() > entry.char_count() {
            warn!(index, before = entry.char_count(), after = updated.char_count(), "gateway text is longer, keeping original");
            return false;
        }

        let cps_before = entry.cps();
        let cps_after = updated.cps();
        state.entries[pos] = updated;
        state.counts.shortened += 1;
        state.record(Phase::Gateway, index, cps_before, cps_after);
        true
    }

    fn finish(&self, state: RunState) -> PipelineResult {
        let RunState { mut entries, changes, counts } = state;
        sf_core::renumber(&mut entries);
        let unresolved = self.unresolved_requests(&entries);
        let flags = self.flags(&entries);
        if !unresolved.is_empty() {
            info!(count = unresolved.len(), target = self.config.max_cps, "entries still exceed target cps");
        }
        PipelineResult { entries, unresolved, flags, changes, counts }
    }

    /// Shortening requests for every entry over target CPS.
    fn unresolved_requests(&self, entries: &[Entry]) -> Vec<ShortenRequest> {
        entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.exceeds_cps(self.config.max_cps))
            .map(|(pos, _)| build_request(entries, pos, &self.config))
            .collect()
    }

    fn flags(&self, entries: &[Entry]) -> Vec<Flag> {
        let mut flags = Vec::new();
        for e in entries {
            if e.duration_ms() < self.config.min_duration_ms {
                flags.push(Flag { index: e.index, kind: FlagKind::ShortDuration });
            }
            if e.duration_ms() > self.config.max_duration_ms {
                flags.push(Flag { index: e.index, kind: FlagKind::OverMaxDuration });
            }
            if e.char_count() > self.config.max_chars {
                flags.push(Flag { index: e.index, kind: FlagKind::OverMaxChars });
            }
        }
        flags
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn starts_uppercase(text: &str) -> bool {
    text.chars().find(|c| c.is_alphabetic()).map_or(true, |c| c.is_uppercase())
}

/// Describe the entry at `pos` for the shortening oracle.
pub fn build_request(entries: &[Entry], pos: usize, config: &OptimizerConfig) -> ShortenRequest {
    let entry = &entries[pos];
    let char_budget = entry.char_budget(config.max_cps, config.max_chars);
    let before = pos.checked_sub(1).and_then(|p| entries.get(p));
    let after = entries.get(pos + 1);
    ShortenRequest {
        index: entry.index,
        text: entry.text(),
        current_cps: entry.cps(),
        char_budget,
        target_cps: config.max_cps,
        chars_to_reduce: entry.char_count().saturating_sub(char_budget),
        context_before: before.map(|e| truncate_chars(&e.text(), CONTEXT_CHARS)).unwrap_or_default(),
        context_after: after.map(|e| truncate_chars(&e.text(), CONTEXT_CHARS)).unwrap_or_default(),
        next_is_uppercase: after.map_or(true, |e| starts_uppercase(&e.text())),
    }
}
