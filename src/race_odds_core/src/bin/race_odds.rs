//! Command line forecast over exported season results.

use anyhow::{Context, Result};
use clap::Parser;
use race_odds_core::{
    forecast, format_performance, format_standings, win_interval, ForecastConfig, GridSlot, InMemorySource,
    ResultRecord, ResultStore,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Simulate race win odds from season form and the starting grid
#[derive(Parser)]
#[command(name = "race-odds")]
#[command(about = "Monte Carlo race win-probability forecast")]
struct Cli {
    /// Forecast config (TOML); defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Season results as a JSON array of result records
    #[arg(short, long)]
    results: PathBuf,

    /// Event grid as a JSON array of grid slots
    #[arg(short, long)]
    grid: PathBuf,

    /// Override the number of trials
    #[arg(long)]
    trials: Option<usize>,

    /// Override the base seed
    #[arg(long)]
    seed: Option<u64>,

    /// Print the full forecast as JSON instead of tables
    #[arg(long)]
    json: bool,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<T> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            ForecastConfig::from_toml_str(&text)?
        }
        None => ForecastConfig::default(),
    };
    if let Some(trials) = cli.trials {
        config.n_simulations = trials;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    let results: Vec<ResultRecord> = read_json(&cli.results)?;
    let grid: Vec<GridSlot> = read_json(&cli.grid)?;
    if config.target_round.is_none() {
        let latest = ResultStore::from_records(results.clone())?.latest_round();
        tracing::info!(?latest, "no target round configured, scoring every stored round");
    }

    let source = InMemorySource::new(config.season)
        .with_results(results)
        .with_grid(config.event.clone(), grid);
    let result = forecast(&config, &source)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Season {} form after rounds {:?}", result.season, result.scored_rounds);
    println!("{}", format_performance(&result.performance));
    println!("{} win probabilities", if result.event.is_empty() { "Race" } else { result.event.as_str() });
    println!("{}", format_standings(&result.outcome));

    for entry in result.outcome.ranked().iter().take(5) {
        let (lo, hi) = win_interval(entry.win_count, result.outcome.trials_run, 0.95)?;
        println!("{:<8} 95% interval {:>6.2}% - {:>6.2}%", entry.competitor_id, lo, hi);
    }

    Ok(())
}
