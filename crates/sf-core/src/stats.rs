use crate::entry::Entry;
use serde::Serialize;

/// CPS statistics over a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SubtitleStats {
    pub total: usize,
    pub min_cps: f64,
    pub max_cps: f64,
    pub avg_cps: f64,
    pub over_target: usize,
}

impl SubtitleStats {
    pub fn from_entries(entries: &[Entry], target_cps: f64) -> Self {
        if entries.is_empty() {
            return Self::default();
        }
        let cps: Vec<f64> = entries.iter().map(|e| e.cps()).collect();
        let min_cps = cps.iter().copied().fold(f64::INFINITY, f64::min);
        let max_cps = cps.iter().copied().fold(0.0, f64::max);
        let avg_cps = cps.iter().sum::<f64>() / cps.len() as f64;
        let over_target = entries.iter().filter(|e| e.exceeds_cps(target_cps)).count();
        Self { total: entries.len(), min_cps, max_cps, avg_cps, over_target }
    }
}
