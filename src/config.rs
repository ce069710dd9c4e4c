//! Configuration file and data directory handling.
//!
//! Data lives in `$PRIO_HOME`, falling back to `~/.prio`. An optional
//! `config.toml` there sets the owner id stamped on stored rows, whether to
//! sync to the mirror store, and the default log level.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::AppResult;

pub const CONFIG_FILE: &str = "config.toml";
pub const DB_FILE: &str = "board.json";
pub const MIRROR_FILE: &str = "mirror.json";
pub const LOG_FILE: &str = "prio.log";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Owner id attached to every goal and project row.
    pub owner: Option<String>,
    /// When true, nothing is handed to the mirror store.
    pub offline: bool,
    /// Mirror store path; relative paths are taken from the data directory.
    pub mirror: Option<PathBuf>,
    /// Default tracing filter when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            owner: None,
            offline: true,
            mirror: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load a config file. A missing file gives the defaults.
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Where the mirror store lives for this data directory.
    pub fn mirror_path(&self, data_dir: &Path) -> PathBuf {
        match &self.mirror {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => data_dir.join(p),
            None => data_dir.join(MIRROR_FILE),
        }
    }
}

/// Resolve the data directory from `$PRIO_HOME` or `$HOME/.prio`.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PRIO_HOME") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".prio")
}
