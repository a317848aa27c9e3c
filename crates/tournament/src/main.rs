//! Tournament CLI
//!
//! Compute Elo ratings from a match history and simulate tournaments with them.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rating_core::{sort_chronologically, MatchRecord, PeriodSplit, PeriodWindow, RatingEngine};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tournament::{
    leaderboard_report, MonteCarlo, MonteCarloConfig, OutcomeModel, SimulatorConfig,
    TournamentOrchestrator,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tournament")]
#[command(about = "Elo ratings and tournament simulation", long_about = None)]
struct Cli {
    /// Config file (TOML); built-in defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rating leaderboard, optionally for a recent window
    Ratings {
        /// Match history (JSON array of match records)
        #[arg(long)]
        matches: PathBuf,
        /// Window starting in this year
        #[arg(long, conflicts_with = "last")]
        since: Option<i32>,
        /// Window covering the last N years of data
        #[arg(long)]
        last: Option<u32>,
        /// Rows to print
        #[arg(long, default_value = "20")]
        top: usize,
        /// Write all final ratings to this JSON file
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// One team's rating after each of its matches
    Trend {
        #[arg(long)]
        matches: PathBuf,
        #[arg(long)]
        team: String,
        #[arg(long)]
        since: Option<i32>,
    },
    /// Simulate the configured tournament once
    Simulate {
        #[arg(long)]
        matches: PathBuf,
        /// Overrides the config seed
        #[arg(long)]
        seed: Option<u64>,
        /// Write the full run (tables and bracket trace) as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Title and stage odds from many simulated tournaments
    Odds {
        #[arg(long)]
        matches: PathBuf,
        #[arg(long)]
        runs: Option<u32>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value = "16")]
        top: usize,
    },
    /// Write the default configuration to a file
    InitConfig {
        path: PathBuf,
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Ratings {
            matches,
            since,
            last,
            top,
            out,
        } => show_ratings(
            &load_config(config_path)?,
            &matches,
            window(since, last),
            top,
            out.as_deref(),
        ),
        Commands::Trend {
            matches,
            team,
            since,
        } => show_trend(&load_config(config_path)?, &matches, &team, window(since, None)),
        Commands::Simulate {
            matches,
            seed,
            json,
        } => simulate(&load_config(config_path)?, &matches, seed, json.as_deref()),
        Commands::Odds {
            matches,
            runs,
            seed,
            top,
        } => odds(&load_config(config_path)?, &matches, runs, seed, top),
        Commands::InitConfig { path, force } => init_config(&path, force),
    }
}

fn window(since: Option<i32>, last: Option<u32>) -> PeriodWindow {
    match (since, last) {
        (Some(year), _) => PeriodWindow::Since(year),
        (None, Some(years)) => PeriodWindow::LastYears(years),
        (None, None) => PeriodWindow::AllHistory,
    }
}

fn load_config(path: Option<&Path>) -> Result<SimulatorConfig> {
    match path {
        Some(path) => SimulatorConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(SimulatorConfig::default()),
    }
}

fn load_matches(path: &Path) -> Result<Vec<MatchRecord>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut matches: Vec<MatchRecord> = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse match records in {}", path.display()))?;
    sort_chronologically(&mut matches);
    info!(matches = matches.len(), path = %path.display(), "match history loaded");
    Ok(matches)
}

fn split_for(config: &SimulatorConfig, path: &Path, window: PeriodWindow) -> Result<PeriodSplit> {
    let matches = load_matches(path)?;
    let base = RatingEngine::new(config.elo.clone())?;
    Ok(PeriodSplit::for_window(&base, &matches, window)?)
}

fn current_engine(config: &SimulatorConfig, path: &Path) -> Result<RatingEngine> {
    let matches = load_matches(path)?;
    let mut engine = RatingEngine::new(config.elo.clone())?;
    engine.replay(&matches)?;
    Ok(engine)
}

fn show_ratings(
    config: &SimulatorConfig,
    path: &Path,
    window: PeriodWindow,
    top: usize,
    out: Option<&Path>,
) -> Result<()> {
    let split = split_for(config, path, window)?;
    println!("{}", leaderboard_report(&split.ranking(), top));

    if window != PeriodWindow::AllHistory {
        let mut movers: Vec<(&str, f64)> = split
            .period
            .ratings()
            .keys()
            .map(|team| (team.as_str(), split.change_over_period(team)))
            .collect();
        movers.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        println!("Biggest gains since {}", split.cutoff_year);
        for (team, change) in movers.iter().take(5) {
            println!("  {team:<24} {change:>+8.1}");
        }
    }

    if let Some(out) = out {
        let ratings: BTreeMap<&String, &f64> = split.period.ratings().iter().collect();
        let json = serde_json::to_string_pretty(&ratings)?;
        std::fs::write(out, json).with_context(|| format!("failed to write {}", out.display()))?;
        println!("Ratings written to {}", out.display());
    }
    Ok(())
}

fn show_trend(
    config: &SimulatorConfig,
    path: &Path,
    team: &str,
    window: PeriodWindow,
) -> Result<()> {
    let split = split_for(config, path, window)?;
    let trend = split.trend(team);
    if trend.is_empty() {
        bail!("{team} has no matches from {} onward", split.cutoff_year);
    }
    println!("{team}: {:.1} at the start of the window", split.history.rating_of(team));
    for (date, rating) in &trend {
        println!("  {date}  {rating:>8.1}");
    }
    println!("Change: {:+.1}", split.change_over_period(team));
    Ok(())
}

fn orchestrator(config: &SimulatorConfig) -> Result<TournamentOrchestrator> {
    let model = OutcomeModel::new(config.outcome.clone())?;
    Ok(TournamentOrchestrator::new(
        model,
        config.format.clone(),
        config.elo.home_advantage,
    )?)
}

fn simulate(
    config: &SimulatorConfig,
    path: &Path,
    seed: Option<u64>,
    json: Option<&Path>,
) -> Result<()> {
    let ratings = current_engine(config, path)?.table();
    let seed = seed.unwrap_or(config.monte_carlo.seed);
    let run = orchestrator(config)?.run(&ratings, seed)?;
    run.print_report();

    if let Some(json) = json {
        let text = serde_json::to_string_pretty(&run)?;
        std::fs::write(json, text).with_context(|| format!("failed to write {}", json.display()))?;
        println!("Run written to {}", json.display());
    }
    Ok(())
}

fn odds(
    config: &SimulatorConfig,
    path: &Path,
    runs: Option<u32>,
    seed: Option<u64>,
    top: usize,
) -> Result<()> {
    let ratings = current_engine(config, path)?.table();
    let batch = MonteCarlo::new(MonteCarloConfig {
        runs: runs.unwrap_or(config.monte_carlo.runs),
        seed: seed.unwrap_or(config.monte_carlo.seed),
    })?;
    let odds = batch.simulate_many(&orchestrator(config)?, &ratings)?;
    println!("{}", odds.generate_report(top));
    Ok(())
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    SimulatorConfig::default()
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Created default config at {}", path.display());
    Ok(())
}
