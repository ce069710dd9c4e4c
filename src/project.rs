//! Project data structure.
//!
//! A project is a concrete deliverable advancing exactly one goal. It owns an
//! ordered list of tasks and carries two derived values: its own `score` and
//! the `priority_score` it is ranked by.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fields::*;
use crate::task::Task;

/// Planned start and end of a project.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Timeframe {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A deliverable linked to a goal by id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub motivation: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub complexity: Rating,
    #[serde(default)]
    pub excitement: Rating,
    pub timeframe: Option<Timeframe>,
    /// Id of the goal this project advances. May dangle.
    pub goal_id: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub score: u32,
    /// Own score plus the goal's score; only meaningful after a ranking pass.
    #[serde(default)]
    pub priority_score: u32,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub created_at_utc: i64,
    #[serde(default)]
    pub updated_at_utc: i64,
}

impl Project {
    /// Get a task by id.
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Number of tasks with the given status.
    pub fn count_tasks(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status == status).count()
    }
}

/// Field values submitted when adding or editing a project.
#[derive(Debug, Clone, Default)]
pub struct ProjectDraft {
    pub description: String,
    pub motivation: String,
    pub status: Status,
    pub complexity: Rating,
    pub excitement: Rating,
    pub timeframe: Option<Timeframe>,
    pub goal_id: String,
}
