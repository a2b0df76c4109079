//! Settings layering: defaults, then the `--config` TOML file, then flags.

use crate::args::Cli;
use anyhow::{bail, Context, Result};
use sf_core::OptimizerConfig;
use std::path::Path;

pub fn load_file(path: &Path) -> Result<OptimizerConfig> {
    let content = std::fs::read_to_string(path).with_context(|| format!("cannot read config {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("invalid config {}", path.display()))
}

fn secs_to_ms(secs: f64, flag: &str) -> Result<u64> {
    if !secs.is_finite() || secs < 0.0 {
        bail!("--{} must be a non-negative number of seconds, got {}", flag, secs);
    }
    Ok((secs * 1000.0).round() as u64)
}

pub fn resolve(cli: &Cli) -> Result<OptimizerConfig> {
    let mut config = match &cli.config {
        Some(path) => load_file(path)?,
        None => OptimizerConfig::default(),
    };

    if let Some(v) = cli.max_cps {
        config.max_cps = v;
    }
    if let Some(v) = cli.max_chars {
        config.max_chars = v;
    }
    if let Some(v) = cli.max_lines {
        config.max_lines = v;
    }
    if let Some(v) = cli.max_duration {
        config.max_duration_ms = secs_to_ms(v, "max-duration")?;
    }
    if let Some(v) = cli.min_duration {
        config.min_duration_ms = secs_to_ms(v, "min-duration")?;
    }
    if let Some(v) = cli.min_gap {
        config.min_gap_ms = secs_to_ms(v, "min-gap")?;
    }
    if let Some(path) = &cli.fillers {
        config.filler.word_list = Some(path.clone());
    }
    if cli.skip_fillers {
        config.filler.enabled = false;
    }
    if cli.skip_cps_opt {
        config.optimize_cps = false;
    }
    if let Some(model) = &cli.model {
        config.gateway.model = model.clone();
    }
    if let Some(secs) = cli.gateway_timeout {
        config.gateway.timeout_secs = secs;
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["subfit", "in.srt"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let config = resolve(&cli(&[])).unwrap();
        assert_eq!(config, OptimizerConfig::default());
    }

    #[test]
    fn test_flag_overrides() {
        let config = resolve(&cli(&["--max-cps", "17", "--max-duration", "6.5", "--min-gap", "0.08", "--skip-fillers"])).unwrap();
        assert_eq!(config.max_cps, 17.0);
        assert_eq!(config.max_duration_ms, 6_500);
        assert_eq!(config.min_gap_ms, 80);
        assert!(!config.filler.enabled);
    }

    #[test]
    fn test_toml_then_flags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_cps = 15.0\nmax_lines = 3\n\n[filler]\ncapitalize_after_removal = true\n\n[gateway]\nmodel = \"gemini-2.5-pro\"").unwrap();
        let path = file.path().to_string_lossy().into_owned();
        let config = resolve(&cli(&["--config", &path, "--max-lines", "2"])).unwrap();
        assert_eq!(config.max_cps, 15.0);
        assert_eq!(config.max_lines, 2);
        assert!(config.filler.capitalize_after_removal);
        assert_eq!(config.gateway.model, "gemini-2.5-pro");
        assert_eq!(config.max_chars, 90);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(resolve(&cli(&["--max-lines", "0"])).is_err());
        assert!(resolve(&cli(&["--max-duration", "0.5"])).is_err());
        assert!(resolve(&cli(&["--min-gap=-1"])).is_err());
    }

    #[test]
    fn test_default_output_path() {
        let c = Cli::parse_from(["subfit", "/data/movie.en.srt"]);
        assert_eq!(c.output_path(), std::path::PathBuf::from("/data/optimized_movie.en.srt"));
        let c = Cli::parse_from(["subfit", "in.srt", "-o", "out.srt"]);
        assert_eq!(c.output_path(), std::path::PathBuf::from("out.srt"));
    }
}
