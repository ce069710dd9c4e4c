use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Goal-driven project prioritisation.
/// Storage defaults to ~/.prio/board.json or a path passed via --db.
#[derive(Parser)]
#[command(name = "prio", version, about = "Rank your projects by the goals they serve")]
pub struct Cli {
    /// Path to the JSON database file.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Path to the config file (default: <data dir>/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Do not hand rows to the mirror store, whatever the config says.
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Commands,
}
