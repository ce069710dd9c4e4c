//! Enumerations and field types for goals, projects and tasks.
//!
//! This module defines the qualitative scales users rate their work with, the
//! lifecycle statuses, and the small value types shared by the CLI and the TUI.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Qualitative three-level rating used for complexity and excitement.
///
/// Stored data may carry values this version does not know about, including
/// `null` or numbers. Those load as `Unrated`, are weighted like `Medium`, and
/// are written back exactly as they were read.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(from = "Value", into = "Value")]
pub enum Rating {
    Low,
    #[default]
    Medium,
    High,
    #[value(skip)]
    Unrated(Value),
}

impl From<Value> for Rating {
    fn from(value: Value) -> Self {
        match value.as_str() {
            Some(label) => Rating::from_label(label),
            None => Rating::Unrated(value),
        }
    }
}

impl From<Rating> for Value {
    fn from(rating: Rating) -> Self {
        match rating {
            Rating::Low => Value::from("low"),
            Rating::Medium => Value::from("medium"),
            Rating::High => Value::from("high"),
            Rating::Unrated(raw) => raw,
        }
    }
}

impl Rating {
    /// Parse a rating label. Only the exact lowercase labels are recognised.
    pub fn from_label(label: &str) -> Self {
        match label {
            "low" => Rating::Low,
            "medium" => Rating::Medium,
            "high" => Rating::High,
            other => Rating::Unrated(Value::from(other)),
        }
    }

    /// Ordinal weight of the rating. Unrecognised ratings sit in the middle.
    pub fn weight(&self) -> u32 {
        match self {
            Rating::Low => 1,
            Rating::Medium => 2,
            Rating::High => 3,
            Rating::Unrated(_) => 2,
        }
    }
}

/// Map a qualitative label straight to its ordinal weight.
pub fn map_weight(label: &str) -> u32 {
    Rating::from_label(label).weight()
}

/// Lifecycle status of a goal or project.
///
/// Statuses other than `active` and `completed` are kept as written, so a
/// board edited elsewhere round-trips unchanged. Only `Active` is ever ranked.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(from = "String", into = "String")]
pub enum Status {
    #[default]
    Active,
    Completed,
    #[value(skip)]
    Other(String),
}

impl From<String> for Status {
    fn from(label: String) -> Self {
        match label.as_str() {
            "active" => Status::Active,
            "completed" => Status::Completed,
            _ => Status::Other(label),
        }
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        match status {
            Status::Active => "active".to_string(),
            Status::Completed => "completed".to_string(),
            Status::Other(label) => label,
        }
    }
}

/// Task completion status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Active,
    Completed,
}

impl TaskStatus {
    pub fn toggled(self) -> Self {
        match self {
            TaskStatus::Active => TaskStatus::Completed,
            TaskStatus::Completed => TaskStatus::Active,
        }
    }
}

/// Direction of a manual reorder step.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Index offset applied by the move: up is towards the front of the list.
    pub fn offset(self) -> isize {
        match self {
            Direction::Up => -1,
            Direction::Down => 1,
        }
    }
}

/// Format a rating for display.
pub fn format_rating(r: &Rating) -> &'static str {
    match r {
        Rating::Low => "low",
        Rating::Medium => "medium",
        Rating::High => "high",
        Rating::Unrated(_) => "?",
    }
}

/// Format a goal or project status for display.
pub fn format_status(s: &Status) -> &str {
    match s {
        Status::Active => "Active",
        Status::Completed => "Completed",
        Status::Other(label) => label.as_str(),
    }
}

/// Format a task status for display.
pub fn format_task_status(s: TaskStatus) -> &'static str {
    match s {
        TaskStatus::Active => "Active",
        TaskStatus::Completed => "Completed",
    }
}
