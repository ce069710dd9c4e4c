//! Goal data structure.
//!
//! A goal is a six-month aspiration. Projects point at a goal by id; the goal
//! never holds its projects.

use serde::{Deserialize, Serialize};

use crate::fields::*;

/// Colour given to goals created without one.
pub const DEFAULT_GOAL_COLOR: &str = "#075985";

/// A long-horizon aspiration that projects work towards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Goal {
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
    #[serde(default = "default_color")]
    pub color: String,
    /// Derived; recomputed on every ranking pass.
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub created_at_utc: i64,
    #[serde(default)]
    pub updated_at_utc: i64,
}

fn default_color() -> String {
    DEFAULT_GOAL_COLOR.to_string()
}

/// Field values submitted when adding or editing a goal.
#[derive(Debug, Clone, Default)]
pub struct GoalDraft {
    pub description: String,
    pub motivation: String,
    pub status: Status,
    pub complexity: Rating,
    pub excitement: Rating,
    pub color: Option<String>,
}
