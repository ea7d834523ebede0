//! Command-line front end for the analysis pipelines. Prints the outcome as
//! JSON and exits non-zero when a run fails.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use trafficlens_core::{channels, helium, keywords, AnalysisConfig, AnalysisOutcome};

#[derive(Parser)]
#[command(
    name = "trafficlens",
    about = "Batch analysis of marketing CSV exports: charts, summaries, and processed data"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Traffic totals per acquisition channel, broken down by target site
    Channels(RunArgs),
    /// Monthly organic and paid SEO metrics from a Helium export
    Helium(RunArgs),
    /// Keyword intents and branded vs non-branded performance
    Keywords(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Input CSV export
    #[arg(long)]
    input: PathBuf,
    /// Directory receiving the chart images and processed CSV
    #[arg(long)]
    output_dir: PathBuf,
    /// TOML file with analysis overrides
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let success = match cli.command {
        Command::Channels(args) => {
            let config = load_config(args.config.as_deref())?;
            emit(&channels::run_analysis(&args.input, &args.output_dir, &config))?
        }
        Command::Helium(args) => {
            let config = load_config(args.config.as_deref())?;
            emit(&helium::run_analysis(&args.input, &args.output_dir, &config))?
        }
        Command::Keywords(args) => {
            let config = load_config(args.config.as_deref())?;
            emit(&keywords::run_analysis(&args.input, &args.output_dir, &config))?
        }
    };

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("failed to parse config {}", path.display()))
        }
        None => Ok(AnalysisConfig::default()),
    }
}

fn emit<S: Serialize>(outcome: &AnalysisOutcome<S>) -> Result<bool> {
    println!("{}", serde_json::to_string_pretty(outcome)?);
    Ok(outcome.success)
}
