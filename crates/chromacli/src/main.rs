//! chromacli - harmonic analysis of precomputed chroma matrices
//!
//! Subcommands:
//! - `chromacli analyze <input.json>` - Run the pipeline, print the report as JSON
//! - `chromacli config` - Print the effective configuration as TOML
//!
//! Logs go to stderr so stdout stays machine-readable.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chroma_understand::{ChromaMatrix, FrameTiming, HarmonyEngine};
use chromaconf::ChromaConfig;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "chromacli")]
#[command(about = "Key, chord and structure analysis of chroma matrices")]
#[command(version)]
struct Cli {
    /// Config file replacing ./chromaharmony.toml
    #[arg(short, long, global = true, env = "CHROMA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a chroma matrix stored as JSON ("-" reads stdin)
    Analyze {
        input: PathBuf,

        /// Pretty-print the report
        #[arg(short, long)]
        pretty: bool,
    },

    /// Print the effective configuration
    Config {
        /// Also list the files and env vars that contributed
        #[arg(long)]
        sources: bool,
    },
}

/// Analysis input as written by a feature extractor.
#[derive(Debug, Deserialize)]
struct ChromaInput {
    sample_rate: u32,
    hop_length: u32,
    /// Track length in seconds; derived from the frame count when absent
    #[serde(default)]
    duration: Option<f64>,
    /// 12 rows of per-frame pitch-class energy
    chroma: Vec<Vec<f64>>,
    /// Beat times in seconds, used for the tempo summary
    #[serde(default)]
    beats: Option<Vec<f64>>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, sources) = ChromaConfig::load_with_sources_from(cli.config.as_deref())
        .context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&config.telemetry.log_level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    debug!(files = ?sources.files, env = ?sources.env_overrides, "configuration loaded");

    match cli.command {
        Commands::Analyze { input, pretty } => analyze(&input, config, pretty),
        Commands::Config { sources: show } => {
            if show {
                for file in &sources.files {
                    println!("# file: {}", file.display());
                }
                for var in &sources.env_overrides {
                    println!("# env: {}", var);
                }
            }
            print!("{}", config.to_toml());
            Ok(())
        }
    }
}

fn analyze(input: &Path, config: ChromaConfig, pretty: bool) -> Result<()> {
    let raw = read_input(input)?;
    let parsed: ChromaInput = serde_json::from_str(&raw)
        .with_context(|| format!("parsing chroma input {}", input.display()))?;

    let chroma = ChromaMatrix::from_rows(&parsed.chroma).context("reading chroma matrix")?;
    let timing = match parsed.duration {
        Some(duration) => FrameTiming::new(parsed.sample_rate, parsed.hop_length, duration),
        None => FrameTiming::for_frames(parsed.sample_rate, parsed.hop_length, chroma.n_frames()),
    }
    .context("reading frame timing")?;

    info!(
        input = %input.display(),
        frames = chroma.n_frames(),
        "analyzing"
    );

    let engine = HarmonyEngine::new(config.analysis).context("building analysis engine")?;
    let report = engine
        .analyze(&chroma, &timing, parsed.beats.as_deref())
        .context("running analysis")?;

    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);

    Ok(())
}

fn read_input(input: &Path) -> Result<String> {
    if input.as_os_str() == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("reading chroma input from stdin")?;
        return Ok(raw);
    }
    std::fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))
}
