mod advisor;
mod app;
mod config;
mod constants;
mod error;
mod event;
mod game;
mod orchestrator;
mod plan;
mod session;

use clap::{Parser, ValueEnum};
use config::{StrategyConfig, StrategyMode};
use constants::{ADVISOR_TIMEOUT_MS, DEFAULT_CACHE_DEPTH, MIN_INTERVAL_MS, PROFILES_DIR};
use orchestrator::Controller;
use std::path::PathBuf;

/// Which sides the advisor plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum AdvisedSides {
    White,
    Black,
    Both,
    #[value(name = "none")]
    Neither,
}

impl AdvisedSides {
    fn controllers(self) -> (Controller, Controller) {
        use Controller::{Advisory, Human};
        match self {
            AdvisedSides::White => (Advisory, Human),
            AdvisedSides::Black => (Human, Advisory),
            AdvisedSides::Both => (Advisory, Advisory),
            AdvisedSides::Neither => (Human, Human),
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// How advisory moves are obtained
    #[arg(long, value_enum, default_value_t = StrategyMode::MultiMoveCache)]
    strategy: StrategyMode,

    /// Number of moves requested per plan (1-10)
    #[arg(long, default_value_t = DEFAULT_CACHE_DEPTH)]
    cache_depth: u8,

    /// Minimum spacing between advisory moves
    #[arg(long, default_value_t = MIN_INTERVAL_MS)]
    min_interval_ms: u64,

    /// Upper bound on any single advisor call
    #[arg(long, default_value_t = ADVISOR_TIMEOUT_MS)]
    advisor_timeout_ms: u64,

    /// Sides played by the advisor
    #[arg(long, value_enum, default_value_t = AdvisedSides::Black)]
    advisor: AdvisedSides,

    /// Load the strategy from a saved profile instead of the flags above
    #[arg(long)]
    profile: Option<String>,

    /// Directory holding saved profiles
    #[arg(long, default_value = PROFILES_DIR)]
    profiles_dir: PathBuf,

    /// Seed for the local advisor
    #[arg(long)]
    seed: Option<u64>,
}

#[cfg(not(test))]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use crate::advisor::LocalAdvisor;
    use crate::app::App;
    use crate::session::{SessionRegistry, SessionSettings};
    use std::process;
    use std::sync::Arc;
    use std::time::Duration;
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    std::panic::set_hook(Box::new(tracing_panic::panic_hook));

    let args = Args::parse();

    let strategy = match &args.profile {
        Some(name) => config::load_profile(&args.profiles_dir, name)?,
        None => StrategyConfig {
            mode: args.strategy,
            cache_depth: args.cache_depth,
        },
    };
    let (white, black) = args.advisor.controllers();
    let min_interval = Duration::from_millis(args.min_interval_ms);
    let settings = SessionSettings {
        config: strategy,
        min_interval,
        advisor_timeout: Duration::from_millis(args.advisor_timeout_ms),
        white,
        black,
    };

    let registry = SessionRegistry::new(Arc::new(LocalAdvisor::new(args.seed)), settings);
    let mut app = App::new(registry, args.profiles_dir, min_interval)?;

    if let Err(err) = app.run_headless().await {
        eprintln!("Headless mode error: {err}");
        process::exit(1);
    }
    Ok(())
}
