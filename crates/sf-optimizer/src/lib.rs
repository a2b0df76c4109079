//! Subtitle readability optimizer.
//!
//! Layers:
//! 0. Normalize (order by start, remove overlaps)
//! 1. Filler removal (interjections against a word list)
//! 2. Line reduction (re-wrap to the line ceiling)
//! 3. CPS optimization (extend into gaps, merge neighbours)
//!
//! [`SubtitlePipeline`] runs the layers in order and hands entries still over
//! target to a [`sf_core::Shortener`].

pub mod layer0_normalize;
pub mod layer1_fillers;
pub mod layer2_lines;
pub mod layer3_cps;
pub mod pipeline;

pub use layer1_fillers::{FillerList, FillerOptions};
pub use layer3_cps::{CpsOptimizer, CpsOutcome};
pub use pipeline::{build_request, SubtitlePipeline};
