use sf_core::{FlagKind, PipelineResult, SubtitleStats};
use std::path::Path;
use tracing::{debug, info, warn};

pub fn log_stats(label: &str, stats: &SubtitleStats, target: f64) {
    info!(
        label,
        total = stats.total,
        min_cps = %format!("{:.1}", stats.min_cps),
        max_cps = %format!("{:.1}", stats.max_cps),
        avg_cps = %format!("{:.1}", stats.avg_cps),
        over_target = stats.over_target,
        target,
        "statistics"
    );
}

/// Summary counts; per-entry changes are logged by the pipeline at debug level.
pub fn log_result(result: &PipelineResult) {
    let c = &result.counts;
    info!(
        normalized = c.normalized,
        fillers = c.fillers_removed,
        dropped = c.entries_dropped,
        lines = c.lines_reduced,
        extended = c.extended,
        merged = c.merged,
        shortened = c.shortened,
        gateway_failures = c.gateway_failures,
        "pipeline finished"
    );
    for flag in &result.flags {
        match flag.kind {
            FlagKind::ShortDuration => debug!(index = flag.index, "shorter than minimum duration"),
            FlagKind::OverMaxChars => debug!(index = flag.index, "over character limit"),
            FlagKind::OverMaxDuration => warn!(index = flag.index, "source entry longer than maximum duration"),
        }
    }
}

/// Final lines on stdout.
pub fn print_summary(result: &PipelineResult, output: &Path, target: f64, manifest: Option<&Path>) {
    println!("Saved: {} ({} entries)", output.display(), result.entries.len());
    if result.is_fully_resolved() {
        println!("All entries meet target CPS of {}", target);
        return;
    }
    println!("{} entries still exceed target CPS of {}", result.unresolved.len(), target);
    if let Some(manifest) = manifest {
        println!("Fill in shortened_text in {}, then run:", manifest.display());
        println!("  subfit {} --apply-json {}", output.display(), manifest.display());
    }
}
