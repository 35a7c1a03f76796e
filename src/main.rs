use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueHint};
use pumpwatch::cleaning::{TimeTagger, clean_file};
use pumpwatch::config::Config;
use pumpwatch::logging::init_logging;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(author, version = env!("APP_VERSION"), about = "Fuel price acquisition")]
struct Cli {
    /// YAML configuration file (default: pumpwatch.yaml or /etc/pumpwatch/config.yaml)
    #[arg(long, short, value_hint = ValueHint::FilePath, env = "PUMPWATCH_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Override output.dataset_path
    #[arg(long, short, value_hint = ValueHint::FilePath, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Sweep every configured coordinate and append new prices (default)
    Collect,

    /// Write the time-tagged, deduplicated copy of the dataset
    Clean,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };
    if let Some(output) = &cli.output {
        config.output.dataset_path = output.clone();
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[cfg(feature = "gasbuddy")]
async fn collect(config: &Config) -> Result<()> {
    let pipeline = pumpwatch::Pipeline::from_config(config)
        .map_err(|e| anyhow::anyhow!("Failed to create pipeline: {}", e))?;

    let summary = pipeline.run(&config.coordinates).await.map_err(|e| {
        tracing::error!("Sweep failed: {}", e);
        anyhow::anyhow!("Sweep failed: {}", e)
    })?;

    for outcome in &summary.outcomes {
        println!(
            "{} @ {}: {} stations, {} collected, {} written",
            outcome.coordinate,
            outcome.query_time,
            outcome.stations_discovered,
            outcome.records_collected,
            outcome.records_written
        );
    }
    info!(
        "Sweep complete: {} of {} collected records written to {}",
        summary.total_written(),
        summary.total_collected(),
        config.output.dataset_path.display()
    );
    Ok(())
}

#[cfg(not(feature = "gasbuddy"))]
async fn collect(_config: &Config) -> Result<()> {
    anyhow::bail!("built without a remote provider; enable the `gasbuddy` feature")
}

fn clean(config: &Config) -> Result<()> {
    let tagger = TimeTagger::from_config(&config.time_tags);
    let cleaned = clean_file(
        &config.output.dataset_path,
        &config.output.cleaned_path,
        &tagger,
    )
    .map_err(|e| anyhow::anyhow!("Cleaning failed: {}", e))?;

    println!(
        "{} rows written to {}",
        cleaned.len(),
        config.output.cleaned_path.display()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    init_logging(&config.logging).map_err(|e| anyhow::anyhow!("Failed to init logging: {}", e))?;
    info!("Pumpwatch {} starting up", env!("APP_VERSION"));

    match cli.cmd.unwrap_or(Command::Collect) {
        Command::Collect => collect(&config).await,
        Command::Clean => clean(&config),
    }
}
