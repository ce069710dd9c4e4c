//! Remote persistence boundary.
//!
//! The planner hands every added or edited row to a `Persister` after the
//! local state has changed. The outcome never feeds back into local state:
//! failures are reported to the caller to log and record, nothing is retried
//! and nothing is rolled back.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::goal::Goal;
use crate::project::Project;

/// A row handed to the backing store, keyed by the entity's id.
#[derive(Debug, Clone, Copy)]
pub enum Row<'a> {
    Goal(&'a Goal),
    Project(&'a Project),
}

impl Row<'_> {
    pub fn id(&self) -> &str {
        match self {
            Row::Goal(g) => &g.id,
            Row::Project(p) => &p.id,
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            Row::Goal(_) => "goals",
            Row::Project(_) => "projects",
        }
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{table} row {id} already exists")]
    Duplicate { table: &'static str, id: String },
    #[error("{table} row {id} does not exist")]
    Missing { table: &'static str, id: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Create-or-update sink for goal and project rows.
pub trait Persister {
    fn create(&mut self, row: Row<'_>) -> Result<(), SyncError>;
    fn update(&mut self, row: Row<'_>) -> Result<(), SyncError>;
}

/// Working offline: nothing leaves the machine.
#[derive(Debug, Default)]
pub struct OfflinePersister;

impl Persister for OfflinePersister {
    fn create(&mut self, _row: Row<'_>) -> Result<(), SyncError> {
        Ok(())
    }

    fn update(&mut self, _row: Row<'_>) -> Result<(), SyncError> {
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct MirrorTables {
    #[serde(default)]
    goals: BTreeMap<String, Goal>,
    #[serde(default)]
    projects: BTreeMap<String, Project>,
}

/// A JSON file acting as the backing store, with one table per entity kind.
///
/// Inserting an existing id or updating a missing one is rejected the way a
/// table with a primary key would reject it.
#[derive(Debug)]
pub struct MirrorPersister {
    path: PathBuf,
}

impl MirrorPersister {
    pub fn new(path: &Path) -> Self {
        MirrorPersister { path: path.to_path_buf() }
    }

    fn load(&self) -> Result<MirrorTables, SyncError> {
        if !self.path.exists() {
            return Ok(MirrorTables::default());
        }
        let data = fs::read_to_string(&self.path).map_err(|e| SyncError::Unavailable(e.to_string()))?;
        serde_json::from_str(&data).map_err(|e| SyncError::Unavailable(e.to_string()))
    }

    fn store(&self, tables: &MirrorTables) -> Result<(), SyncError> {
        let write = || -> std::io::Result<()> {
            let tmp = self.path.with_extension("json.tmp");
            let mut f = File::create(&tmp)?;
            let data = serde_json::to_string_pretty(tables)?;
            f.write_all(data.as_bytes())?;
            f.flush()?;
            fs::rename(tmp, &self.path)
        };
        write().map_err(|e| SyncError::Unavailable(e.to_string()))
    }

    fn write_row(&self, row: Row<'_>, must_exist: bool) -> Result<(), SyncError> {
        let mut tables = self.load()?;
        let exists = match row {
            Row::Goal(g) => tables.goals.contains_key(&g.id),
            Row::Project(p) => tables.projects.contains_key(&p.id),
        };
        match (must_exist, exists) {
            (false, true) => {
                return Err(SyncError::Duplicate { table: row.table(), id: row.id().to_string() })
            }
            (true, false) => {
                return Err(SyncError::Missing { table: row.table(), id: row.id().to_string() })
            }
            _ => {}
        }
        match row {
            Row::Goal(g) => {
                tables.goals.insert(g.id.clone(), g.clone());
            }
            Row::Project(p) => {
                tables.projects.insert(p.id.clone(), p.clone());
            }
        }
        self.store(&tables)
    }
}

impl Persister for MirrorPersister {
    fn create(&mut self, row: Row<'_>) -> Result<(), SyncError> {
        self.write_row(row, false)
    }

    fn update(&mut self, row: Row<'_>) -> Result<(), SyncError> {
        self.write_row(row, true)
    }
}
