use crate::entry::Entry;
use crate::shorten::ShortenRequest;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of an entry inside the CPS optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// At or below target CPS.
    Ok,
    /// Over target and still eligible for extend/merge.
    Candidate,
    /// Was a candidate, fixed by this phase.
    Resolved,
    /// Still over target once extend and merge are exhausted.
    Unresolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Normalize,
    Fillers,
    Lines,
    Cps,
    Gateway,
    Recheck,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Normalize => "normalize",
            Self::Fillers => "fillers",
            Self::Lines => "lines",
            Self::Cps => "cps",
            Self::Gateway => "gateway",
            Self::Recheck => "recheck",
        };
        f.write_str(name)
    }
}

/// One entry changed by one phase. `index` is the numbering the phase saw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub phase: Phase,
    pub index: usize,
    pub cps_before: f64,
    pub cps_after: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    /// Below minimum duration and no gap to extend into.
    ShortDuration,
    /// More characters than `max_chars`.
    OverMaxChars,
    /// Source entry already longer than the duration ceiling.
    OverMaxDuration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    pub index: usize,
    pub kind: FlagKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineCounts {
    /// Entries clipped or combined because they overlapped.
    pub normalized: usize,
    pub fillers_removed: usize,
    pub entries_dropped: usize,
    pub lines_reduced: usize,
    pub extended: usize,
    pub merged: usize,
    pub shortened: usize,
    pub gateway_failures: usize,
}

/// Outcome of one run. Built fresh per run and not mutated afterwards.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub entries: Vec<Entry>,
    /// Entries still over target CPS, numbered as in `entries`.
    pub unresolved: Vec<ShortenRequest>,
    pub flags: Vec<Flag>,
    pub changes: Vec<Change>,
    pub counts: PipelineCounts,
}

impl PipelineResult {
    pub fn is_fully_resolved(&self) -> bool {
        self.unresolved.is_empty()
    }
}
