pub mod config;
pub mod entry;
pub mod error;
pub mod shorten;
pub mod stats;
pub mod time;
pub mod types;

pub use config::{FillerConfig, GatewayConfig, OptimizerConfig, MAX_GATEWAY_RETRIES};
pub use entry::{renumber, Entry, Metrics, CPS_FRAME_FLOOR_MS};
pub use error::{Result, SubFitError};
pub use shorten::{GatewayError, ShortenRequest, Shortener, Shortening};
pub use stats::SubtitleStats;
pub use time::Timestamp;
pub use types::{Change, EntryState, Flag, FlagKind, Phase, PipelineCounts, PipelineResult};
