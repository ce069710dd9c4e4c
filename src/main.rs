//! # Prio - Goal-driven Project Prioritisation
//!
//! A command-line tool that ranks your projects by the goals they serve,
//! with an interactive board for reordering.
//!
//! ## Key Features
//!
//! - **Goals, Projects, Tasks**: six-month goals, projects that advance exactly one goal,
//!   and ordered task lists inside each project
//! - **Computed Ranking**: every project gets a priority from its own ratings and position
//!   plus the score of its goal; only active projects are ranked
//! - **Manual Ordering**: move goals, projects and tasks up or down to change what matters
//! - **Local File Storage**: one JSON file, with an optional mirror store for syncing rows
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a goal and a project under it
//! prio goal add "Get hired in the tech industry" --complexity high --excitement high
//! prio project add "Build a portfolio site" --goal "get hired in the tech industry"
//!
//! # See what to work on
//! prio rank
//!
//! # Or open the board
//! prio ui
//! ```
//!
//! ## Scoring
//!
//! - Ratings weigh `low = 1`, `medium = 2`, `high = 3`; anything else counts as medium
//! - Position weighs `list length - index`, so the first entry in a list counts most
//! - `score = complexity + excitement + position`, for goals and projects alike
//! - `priority = project score + goal score`
//!
//! Data is stored in `~/.prio/` (or `$PRIO_HOME`). Set `offline = false` in
//! `config.toml` there to mirror every added or edited row to `mirror.json`.

use std::path::Path;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod cmd;
pub mod config;
pub mod db;
pub mod error;
pub mod fields;
pub mod goal;
pub mod persist;
pub mod planner;
pub mod project;
pub mod reorder;
pub mod scoring;
pub mod task;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod run;
}

use cli::Cli;
use cmd::*;
use config::*;
use error::AppResult;
use persist::{MirrorPersister, OfflinePersister, Persister};
use planner::Planner;

fn main() {
    let cli = Cli::parse();

    let data_dir = data_dir();
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        eprintln!("Failed to create data directory {}: {}", data_dir.display(), e);
        std::process::exit(1);
    }

    let config_path = cli.config.clone().unwrap_or_else(|| data_dir.join(CONFIG_FILE));
    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading {}: {}", config_path.display(), e);
            std::process::exit(1);
        }
    };

    // The board owns the terminal, so its logs go to a file.
    let log_dir = matches!(cli.command, Commands::Ui).then_some(data_dir.as_path());
    let _guard = init_logging(&config.log_level, log_dir);

    if let Err(e) = run(cli, &config, &data_dir) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli, config: &Config, data_dir: &Path) -> AppResult<()> {
    let db_path = cli.db.clone().unwrap_or_else(|| data_dir.join(DB_FILE));

    let persister: Box<dyn Persister> = if cli.offline || config.offline {
        Box::new(OfflinePersister)
    } else {
        let mirror = config.mirror_path(data_dir);
        tracing::info!(mirror = %mirror.display(), "syncing rows to mirror store");
        Box::new(MirrorPersister::new(&mirror))
    };
    let owner = config.owner.clone();

    let mut ctx = open_context(&db_path, |db| Planner::new(db, persister, owner))?;
    dispatch(&mut ctx, cli.command)
}

/// Install the tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. With a log directory the output
/// goes to a file there; the returned guard must live until exit.
fn init_logging(default_level: &str, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}
