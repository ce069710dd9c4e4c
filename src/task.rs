//! Task data structure.
//!
//! Tasks live inside their project's ordered task list. The `project_id`
//! back-reference is informational; containment is what owns the task.

use serde::{Deserialize, Serialize};

use crate::fields::TaskStatus;

/// An actionable unit of work within a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    pub project_id: String,
}
