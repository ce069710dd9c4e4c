//! Local storage and utility functions for goals, projects and tasks.
//!
//! This module provides the `Database` struct holding the authoritative goal and
//! project lists, along with identifier resolution, date parsing, input
//! validation and the table printers used by the CLI.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::fields::*;
use crate::goal::Goal;
use crate::project::Project;
use crate::scoring::{rescore, Ranking};
use crate::task::Task;

/// Shortest accepted goal or project description.
pub const MIN_DESCRIPTION_LEN: usize = 10;
/// Longest accepted goal or project description.
pub const MAX_DESCRIPTION_LEN: usize = 120;

/// In-memory database of goals and projects. Tasks are nested in projects.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl Database {
    /// Load the database from a JSON file. A missing file is an empty database.
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Database::default());
        }
        let buf = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&buf)?)
    }

    /// Save database to JSON file using atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> AppResult<()> {
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        let data = serde_json::to_string_pretty(self)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    /// Recompute every stored score and priority from the current list order.
    ///
    /// Returns the ids of projects whose goal is missing.
    pub fn refresh_scores(&mut self) -> Vec<String> {
        rescore(&mut self.projects, &mut self.goals)
    }

    pub fn goal(&self, id: &str) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == id)
    }

    pub fn goal_index(&self, id: &str) -> Option<usize> {
        self.goals.iter().position(|g| g.id == id)
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn project_index(&self, id: &str) -> Option<usize> {
        self.projects.iter().position(|p| p.id == id)
    }
}

/// Something that can be looked up by id or by its description.
pub trait Identified {
    const KIND: &'static str;
    fn ident(&self) -> &str;
    fn label(&self) -> &str;
}

impl Identified for Goal {
    const KIND: &'static str = "goal";
    fn ident(&self) -> &str {
        &self.id
    }
    fn label(&self) -> &str {
        &self.description
    }
}

impl Identified for Project {
    const KIND: &'static str = "project";
    fn ident(&self) -> &str {
        &self.id
    }
    fn label(&self) -> &str {
        &self.description
    }
}

impl Identified for Task {
    const KIND: &'static str = "task";
    fn ident(&self) -> &str {
        &self.id
    }
    fn label(&self) -> &str {
        &self.description
    }
}

/// Resolve an identifier to an item id.
///
/// Tries, in order: exact id, unique id prefix, case-insensitive description.
/// Multiple matches are an error listing the candidates.
pub fn resolve_identifier<T: Identified>(identifier: &str, items: &[T]) -> AppResult<String> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(AppError::Invalid(format!("{} identifier cannot be empty", T::KIND)));
    }
    if let Some(item) = items.iter().find(|i| i.ident() == identifier) {
        return Ok(item.ident().to_string());
    }

    let by_prefix: Vec<&T> = items.iter().filter(|i| i.ident().starts_with(identifier)).collect();
    let matches = if by_prefix.is_empty() {
        let wanted = identifier.to_lowercase();
        items.iter().filter(|i| i.label().to_lowercase() == wanted).collect()
    } else {
        by_prefix
    };

    match matches.len() {
        0 => Err(AppError::NotFound(format!("no {} matches '{}'", T::KIND, identifier))),
        1 => Ok(matches[0].ident().to_string()),
        _ => {
            let mut msg = format!("Multiple {}s match '{}':\n", T::KIND, identifier);
            for item in matches {
                msg.push_str(&format!("  {}  {}\n", short_id(item.ident()), item.label()));
            }
            msg.push_str("Please use a longer id prefix instead.");
            Err(AppError::Ambiguous(msg))
        }
    }
}

/// Trim a goal or project description and check its length.
pub fn validate_description(s: &str) -> AppResult<String> {
    let s = s.trim();
    let len = s.chars().count();
    if len < MIN_DESCRIPTION_LEN {
        return Err(AppError::Invalid(format!(
            "description must be at least {MIN_DESCRIPTION_LEN} characters"
        )));
    }
    if len > MAX_DESCRIPTION_LEN {
        return Err(AppError::Invalid(format!("{MAX_DESCRIPTION_LEN} character limit")));
    }
    Ok(s.to_string())
}

/// Trim a task description; it must not be empty.
pub fn validate_task_description(s: &str) -> AppResult<String> {
    let s = s.trim();
    if s.is_empty() {
        return Err(AppError::Invalid("task description cannot be empty".into()));
    }
    Ok(s.to_string())
}

/// Check a colour is a `#rrggbb` hex string.
pub fn validate_color(s: &str) -> AppResult<String> {
    let s = s.trim();
    let ok = s.len() == 7 && s.starts_with('#') && s[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !ok {
        return Err(AppError::Invalid(format!("colour '{s}' is not of the form #rrggbb")));
    }
    Ok(s.to_lowercase())
}

/// Parse human-readable date input.
///
/// Supports "today", "tomorrow", "in 3d", "in 2w", "in 1m" and "YYYY-MM-DD".
pub fn parse_date_input(s: &str) -> Option<NaiveDate> {
    parse_date_from(s, Local::now().date_naive())
}

fn parse_date_from(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(nd) = rest.strip_suffix("d") {
            if let Ok(days) = nd.trim().parse::<i64>() {
                return Some(today + Duration::days(days));
            }
        }
        if let Some(nw) = rest.strip_suffix("w") {
            if let Ok(weeks) = nw.trim().parse::<i64>() {
                return Some(today + Duration::weeks(weeks));
            }
        }
        if let Some(nm) = rest.strip_suffix("m") {
            if let Ok(months) = nm.trim().parse::<i64>() {
                // Approximate: 30 days per month
                return Some(today + Duration::days(months * 30));
            }
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// First eight characters of an id, enough to type back as a prefix.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((i, _)) => &id[..i],
        None => id,
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

/// Print goals in list order with their current scores.
pub fn print_goals(goals: &[Goal]) {
    println!(
        "{:<4} {:<9} {:<10} {:<7} {:<7} {:<6} {}",
        "#", "ID", "Status", "Cplx", "Excite", "Score", "Description"
    );
    for (i, g) in goals.iter().enumerate() {
        println!(
            "{:<4} {:<9} {:<10} {:<7} {:<7} {:<6} {}",
            i + 1,
            short_id(&g.id),
            format_status(&g.status),
            format_rating(&g.complexity),
            format_rating(&g.excitement),
            g.score,
            g.description
        );
    }
}

/// Print projects in list order with score, priority and goal.
pub fn print_projects(projects: &[Project], goals: &[Goal]) {
    println!(
        "{:<4} {:<9} {:<10} {:<7} {:<7} {:<6} {:<6} {:<22} {}",
        "#", "ID", "Status", "Cplx", "Excite", "Score", "Prio", "Goal", "Description"
    );
    for (i, p) in projects.iter().enumerate() {
        println!(
            "{:<4} {:<9} {:<10} {:<7} {:<7} {:<6} {:<6} {:<22} {}",
            i + 1,
            short_id(&p.id),
            format_status(&p.status),
            format_rating(&p.complexity),
            format_rating(&p.excitement),
            p.score,
            p.priority_score,
            truncate(&goal_label(&p.goal_id, goals), 22),
            p.description
        );
    }
}

/// Print a project's tasks in order.
pub fn print_tasks(project: &Project) {
    println!("{}", project.description);
    println!("{:<4} {:<9} {:<10} {}", "#", "ID", "Status", "Description");
    for (i, t) in project.tasks.iter().enumerate() {
        println!(
            "{:<4} {:<9} {:<10} {}",
            i + 1,
            short_id(&t.id),
            format_task_status(t.status),
            t.description
        );
    }
}

/// Print the ranking, highest priority first.
pub fn print_ranking(ranking: &Ranking, goals: &[Goal], limit: Option<usize>) {
    println!(
        "{:<5} {:<6} {:<9} {:<22} {:<9} {}",
        "Rank", "Prio", "ID", "Goal", "Tasks", "Description"
    );
    let limit = limit.unwrap_or(usize::MAX);
    for (i, p) in ranking.entries.iter().take(limit).enumerate() {
        let open = p.count_tasks(TaskStatus::Active);
        let done = p.count_tasks(TaskStatus::Completed);
        let unlinked = if ranking.unlinked.contains(&p.id) { " (unlinked)" } else { "" };
        println!(
            "{:<5} {:<6} {:<9} {:<22} {:<9} {}{}",
            i + 1,
            p.priority_score,
            short_id(&p.id),
            truncate(&goal_label(&p.goal_id, goals), 22),
            format!("{open}/{}", open + done),
            p.description,
            unlinked
        );
    }
}

/// Description of the goal with `goal_id`, or a marker when it is missing.
pub fn goal_label(goal_id: &str, goals: &[Goal]) -> String {
    goals
        .iter()
        .find(|g| g.id == goal_id)
        .map(|g| g.description.clone())
        .unwrap_or_else(|| "<missing goal>".to_string())
}
