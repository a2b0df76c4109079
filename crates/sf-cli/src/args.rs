use clap::Parser;
use std::path::PathBuf;

/// Rewrite subtitle timing and text so every entry can be read comfortably.
#[derive(Parser, Debug, Clone)]
#[command(name = "subfit", version, about, long_about = None)]
#[command(after_help = "Examples:
  subfit input.srt -o output.srt
  subfit input.srt -j high_cps.json --max-cps 18
  subfit optimized_input.srt --apply-json high_cps.json -o final.srt")]
pub struct Cli {
    /// Input SRT file
    pub input: PathBuf,

    /// Output SRT file [default: optimized_<input> next to the input]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write entries still over target CPS to a JSON manifest
    #[arg(short = 'j', long = "export-json", alias = "json")]
    pub export_json: Option<PathBuf>,

    /// Apply shortened text from a filled-in manifest; upstream phases are skipped
    #[arg(long)]
    pub apply_json: Option<PathBuf>,

    /// TOML file with optimizer settings; flags override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Target characters per second [default: 21]
    #[arg(long)]
    pub max_cps: Option<f64>,

    /// Maximum characters per entry [default: 90]
    #[arg(long)]
    pub max_chars: Option<usize>,

    /// Maximum lines per entry [default: 2]
    #[arg(long)]
    pub max_lines: Option<usize>,

    /// Maximum entry duration in seconds [default: 7]
    #[arg(long)]
    pub max_duration: Option<f64>,

    /// Minimum entry duration in seconds [default: 0.833]
    #[arg(long)]
    pub min_duration: Option<f64>,

    /// Minimum gap kept between entries in seconds [default: 0]
    #[arg(long)]
    pub min_gap: Option<f64>,

    /// Filler word list, one token per line (replaces the built-in English list)
    #[arg(long)]
    pub fillers: Option<PathBuf>,

    /// Skip filler removal
    #[arg(long)]
    pub skip_fillers: bool,

    /// Skip CPS optimization (extend and merge)
    #[arg(long)]
    pub skip_cps_opt: bool,

    /// Gemini API key; enables automated shortening
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Gemini model [default: gemini-2.5-flash]
    #[arg(long)]
    pub model: Option<String>,

    /// Gateway request timeout in seconds [default: 60]
    #[arg(long)]
    pub gateway_timeout: Option<u64>,

    /// Log every change with its phase and before/after CPS
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn output_path(&self) -> PathBuf {
        if let Some(path) = &self.output {
            return path.clone();
        }
        let name = self
            .input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output.srt".to_string());
        self.input.with_file_name(format!("optimized_{}", name))
    }
}
