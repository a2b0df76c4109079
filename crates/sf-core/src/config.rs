use crate::error::{Result, SubFitError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Upper bound on gateway attempts per batch.
pub const MAX_GATEWAY_RETRIES: u32 = 10;

/// Readability limits and phase settings for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub max_cps: f64,
    pub max_chars: usize,
    pub max_lines: usize,
    pub max_duration_ms: u64,
    pub min_duration_ms: u64,
    pub min_gap_ms: u64,
    pub optimize_cps: bool,
    pub filler: FillerConfig,
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillerConfig {
    pub enabled: bool,
    /// Only remove lines made entirely of filler tokens.
    pub only_separated_lines: bool,
    pub capitalize_after_removal: bool,
    /// One token per line; replaces the built-in English list.
    pub word_list: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl OptimizerConfig {
    /// Per-line width the line reducer aims for.
    pub fn soft_line_width(&self) -> usize {
        (self.max_chars / self.max_lines.max(1)).max(1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_cps <= 0.0 || !self.max_cps.is_finite() {
            return Err(SubFitError::InvalidConfig(format!("max_cps must be positive, got {}", self.max_cps)));
        }
        if self.max_chars == 0 {
            return Err(SubFitError::InvalidConfig("max_chars must be at least 1".into()));
        }
        if self.max_lines == 0 {
            return Err(SubFitError::InvalidConfig("max_lines must be at least 1".into()));
        }
        if self.max_duration_ms <= self.min_duration_ms {
            return Err(SubFitError::InvalidConfig(format!(
                "max_duration ({} ms) must exceed min_duration ({} ms)",
                self.max_duration_ms, self.min_duration_ms
            )));
        }
        if self.gateway.timeout_secs == 0 {
            return Err(SubFitError::InvalidConfig("gateway timeout must be at least 1 second".into()));
        }
        if self.gateway.max_retries > MAX_GATEWAY_RETRIES {
            return Err(SubFitError::InvalidConfig(format!(
                "gateway max_retries must be at most {}, got {}",
                MAX_GATEWAY_RETRIES, self.gateway.max_retries
            )));
        }
        Ok(())
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_cps: 21.0,
            max_chars: 90,
            max_lines: 2,
            max_duration_ms: 7_000,
            min_duration_ms: 833,
            min_gap_ms: 0,
            optimize_cps: true,
            filler: FillerConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

impl Default for FillerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            only_separated_lines: false,
            capitalize_after_removal: false,
            word_list: None,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".into(),
            timeout_secs: 60,
            max_retries: 3,
        }
    }
}
