mod args;
mod config;
mod report;

use anyhow::{Context, Result};
use args::Cli;
use clap::Parser;
use sf_core::{Entry, PipelineResult, Shortener, SubFitError, SubtitleStats};
use sf_gateway::{write_manifest, GeminiShortener, ManifestGateway};
use sf_optimizer::SubtitlePipeline;
use sf_srt::{SrtFormat, SubtitleFormat};
use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const CRATES: &[&str] = &["subfit", "sf_core", "sf_srt", "sf_optimizer", "sf_gateway"];

fn init_tracing(verbose: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::builder().from_env_lossy()
    } else {
        let level = if verbose { "debug" } else { "info" };
        let directives: Vec<String> = CRATES.iter().map(|c| format!("{}={}", c, level)).collect();
        EnvFilter::builder().parse_lossy(directives.join(","))
    };
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_env_filter(filter)
        .try_init();
}

/// Resume from a manifest. The input file is the snapshot; nothing upstream runs again.
async fn apply_manifest(pipeline: &SubtitlePipeline, entries: Vec<Entry>, manifest: &Path) -> sf_core::Result<PipelineResult> {
    let gateway = ManifestGateway::load(manifest)?;
    gateway.validate(&entries)?;
    info!(path = %manifest.display(), replies = gateway.len(), "applying manifest");
    pipeline.resume(entries, &gateway.indices(), &gateway).await
}

fn gemini(cli: &Cli, config: &sf_core::OptimizerConfig) -> Result<Option<GeminiShortener>> {
    let Some(key) = cli.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
        return Ok(None);
    };
    let shortener = GeminiShortener::new(key, &config.gateway).context("cannot set up Gemini client")?;
    info!(model = shortener.model(), "automated shortening enabled");
    Ok(Some(shortener))
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::resolve(&cli)?;
    let format = SrtFormat::new();
    if !format.can_parse(&cli.input) {
        warn!(path = %cli.input.display(), "input does not have an .srt extension, parsing as SubRip anyway");
    }
    let entries = format
        .parse_file(&cli.input)
        .with_context(|| format!("cannot read {}", cli.input.display()))?;
    info!(path = %cli.input.display(), entries = entries.len(), "loaded subtitles");
    report::log_stats("input", &SubtitleStats::from_entries(&entries, config.max_cps), config.max_cps);

    let pipeline = SubtitlePipeline::new(config.clone())?;
    let output = cli.output_path();

    let result = match &cli.apply_json {
        Some(manifest) => match apply_manifest(&pipeline, entries.clone(), manifest).await {
            Ok(result) => result,
            Err(e @ SubFitError::ManifestMismatch(_)) => {
                if cli.output.is_some() {
                    format.write_file(&entries, &output)?;
                    info!(path = %output.display(), "wrote input unchanged");
                }
                return Err(anyhow::Error::new(e).context(format!("cannot apply {}", manifest.display())));
            }
            Err(e) => return Err(anyhow::Error::new(e).context(format!("cannot apply {}", manifest.display()))),
        },
        None => {
            let gateway = gemini(&cli, &config)?;
            pipeline.run(entries, gateway.as_ref().map(|g| g as &dyn Shortener)).await
        }
    };

    report::log_result(&result);
    report::log_stats("output", &SubtitleStats::from_entries(&result.entries, config.max_cps), config.max_cps);

    format
        .write_file(&result.entries, &output)
        .with_context(|| format!("cannot write {}", output.display()))?;
    if let Some(manifest) = &cli.export_json {
        write_manifest(manifest, &result.unresolved).with_context(|| format!("cannot write {}", manifest.display()))?;
    }

    report::print_summary(&result, &output, config.max_cps, cli.export_json.as_deref());
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env is fine; the key may come from the environment or a flag.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
