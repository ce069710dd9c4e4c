//! Owner of the authoritative goal, project and task lists.
//!
//! All reads and writes from the CLI and the TUI go through `Planner`. Writes
//! change local state first and then hand the affected row to the configured
//! `Persister`. A failed hand-off is logged and recorded, never rolled back.

use std::collections::HashMap;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::{validate_color, validate_description, validate_task_description, Database};
use crate::error::{AppError, AppResult};
use crate::fields::{Direction, TaskStatus};
use crate::goal::{Goal, GoalDraft, DEFAULT_GOAL_COLOR};
use crate::persist::{Persister, Row, SyncError};
use crate::project::{Project, ProjectDraft};
use crate::reorder::reorder;
use crate::scoring::{compute_ranking, score_entity, Ranking, Scorable};
use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOp {
    Create,
    Update,
}

/// A row the persister refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub op: SyncOp,
    pub table: &'static str,
    pub id: String,
    pub error: String,
}

pub struct Planner {
    db: Database,
    persister: Box<dyn Persister>,
    owner: Option<String>,
    sync_failures: Vec<SyncFailure>,
}

impl Planner {
    pub fn new(db: Database, persister: Box<dyn Persister>, owner: Option<String>) -> Self {
        Planner {
            db,
            persister,
            owner,
            sync_failures: Vec::new(),
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn goals(&self) -> &[Goal] {
        &self.db.goals
    }

    pub fn projects(&self) -> &[Project] {
        &self.db.projects
    }

    pub fn goal(&self, id: &str) -> Option<&Goal> {
        self.db.goal(id)
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.db.project(id)
    }

    /// Active projects ranked from the current lists.
    pub fn ranking(&self) -> Ranking {
        compute_ranking(&self.db.projects, &self.db.goals)
    }

    /// Write fresh scores into the stored entities. Returns unlinked project ids.
    pub fn refresh_scores(&mut self) -> Vec<String> {
        self.db.refresh_scores()
    }

    /// Rows the persister refused since this planner was created.
    pub fn sync_failures(&self) -> &[SyncFailure] {
        &self.sync_failures
    }

    /// Append a new goal and return its id.
    pub fn add_goal(&mut self, draft: GoalDraft) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let goal = Goal {
            id: Uuid::new_v4().to_string(),
            description: validate_description(&draft.description)?,
            motivation: draft.motivation.trim().to_string(),
            status: draft.status,
            complexity: draft.complexity,
            excitement: draft.excitement,
            color: match draft.color {
                Some(c) => validate_color(&c)?,
                None => DEFAULT_GOAL_COLOR.to_string(),
            },
            score: 0,
            owner_id: self.owner.clone(),
            created_at_utc: now,
            updated_at_utc: now,
        };
        let id = goal.id.clone();
        self.db.goals.push(goal);
        let idx = self.db.goals.len() - 1;
        rescore_at(&mut self.db.goals, idx);
        info!(goal = %id, score = self.db.goals[idx].score, "added goal");

        hand_off(
            self.persister.as_mut(),
            &mut self.sync_failures,
            SyncOp::Create,
            Row::Goal(&self.db.goals[idx]),
        );
        Ok(id)
    }

    /// Replace a goal's editable fields, keeping its place in the list.
    pub fn update_goal(&mut self, id: &str, draft: GoalDraft) -> AppResult<()> {
        let idx = self
            .db
            .goal_index(id)
            .ok_or_else(|| AppError::NotFound(format!("goal {id}")))?;
        let description = validate_description(&draft.description)?;
        let color = draft.color.as_deref().map(validate_color).transpose()?;

        let goal = &mut self.db.goals[idx];
        goal.description = description;
        goal.motivation = draft.motivation.trim().to_string();
        goal.status = draft.status;
        goal.complexity = draft.complexity;
        goal.excitement = draft.excitement;
        if let Some(c) = color {
            goal.color = c;
        }
        if goal.owner_id.is_none() {
            goal.owner_id = self.owner.clone();
        }
        goal.updated_at_utc = Utc::now().timestamp();
        rescore_at(&mut self.db.goals, idx);
        info!(goal = %id, score = self.db.goals[idx].score, "updated goal");

        hand_off(
            self.persister.as_mut(),
            &mut self.sync_failures,
            SyncOp::Update,
            Row::Goal(&self.db.goals[idx]),
        );
        Ok(())
    }

    /// Append a new project and return its id. The goal must exist.
    pub fn add_project(&mut self, draft: ProjectDraft) -> AppResult<String> {
        self.check_project_draft(&draft)?;
        let now = Utc::now().timestamp();
        let project = Project {
            id: Uuid::new_v4().to_string(),
            description: validate_description(&draft.description)?,
            motivation: draft.motivation.trim().to_string(),
            status: draft.status,
            complexity: draft.complexity,
            excitement: draft.excitement,
            timeframe: draft.timeframe,
            goal_id: draft.goal_id,
            tasks: Vec::new(),
            score: 0,
            priority_score: 0,
            owner_id: self.owner.clone(),
            created_at_utc: now,
            updated_at_utc: now,
        };
        let id = project.id.clone();
        self.db.projects.push(project);
        let idx = self.db.projects.len() - 1;
        rescore_at(&mut self.db.projects, idx);
        info!(project = %id, score = self.db.projects[idx].score, "added project");

        hand_off(
            self.persister.as_mut(),
            &mut self.sync_failures,
            SyncOp::Create,
            Row::Project(&self.db.projects[idx]),
        );
        Ok(id)
    }

    /// Replace a project's editable fields, keeping its tasks and list position.
    pub fn update_project(&mut self, id: &str, draft: ProjectDraft) -> AppResult<()> {
        let idx = self
            .db
            .project_index(id)
            .ok_or_else(|| AppError::NotFound(format!("project {id}")))?;
        self.check_project_draft(&draft)?;
        let description = validate_description(&draft.description)?;

        let project = &mut self.db.projects[idx];
        project.description = description;
        project.motivation = draft.motivation.trim().to_string();
        project.status = draft.status;
        project.complexity = draft.complexity;
        project.excitement = draft.excitement;
        project.timeframe = draft.timeframe;
        project.goal_id = draft.goal_id;
        if project.owner_id.is_none() {
            project.owner_id = self.owner.clone();
        }
        project.updated_at_utc = Utc::now().timestamp();
        rescore_at(&mut self.db.projects, idx);
        info!(project = %id, score = self.db.projects[idx].score, "updated project");

        self.sync_project(idx, SyncOp::Update);
        Ok(())
    }

    /// Append a task to a project and return the task id.
    pub fn add_task(&mut self, project_id: &str, description: &str) -> AppResult<String> {
        let description = validate_task_description(description)?;
        let idx = self.project_idx(project_id)?;
        let project = &mut self.db.projects[idx];
        let task = Task {
            id: Uuid::new_v4().to_string(),
            description,
            status: TaskStatus::Active,
            project_id: project.id.clone(),
        };
        let id = task.id.clone();
        project.tasks.push(task);
        project.updated_at_utc = Utc::now().timestamp();
        info!(project = %project_id, task = %id, "added task");

        self.sync_project(idx, SyncOp::Update);
        Ok(id)
    }

    pub fn set_task_status(&mut self, project_id: &str, task_id: &str, status: TaskStatus) -> AppResult<()> {
        let idx = self.project_idx(project_id)?;
        let project = &mut self.db.projects[idx];
        let task = project
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| AppError::NotFound(format!("task {task_id}")))?;
        task.status = status;
        project.updated_at_utc = Utc::now().timestamp();
        info!(project = %project_id, task = %task_id, ?status, "set task status");

        self.sync_project(idx, SyncOp::Update);
        Ok(())
    }

    /// Flip a task between active and completed; returns the new status.
    pub fn toggle_task(&mut self, project_id: &str, task_id: &str) -> AppResult<TaskStatus> {
        let current = self
            .project(project_id)
            .and_then(|p| p.task(task_id))
            .map(|t| t.status)
            .ok_or_else(|| AppError::NotFound(format!("task {task_id}")))?;
        let next = current.toggled();
        self.set_task_status(project_id, task_id, next)?;
        Ok(next)
    }

    /// Move a goal one place. Returns whether the order changed.
    pub fn move_goal(&mut self, id: &str, direction: Direction) -> AppResult<bool> {
        let idx = self
            .db
            .goal_index(id)
            .ok_or_else(|| AppError::NotFound(format!("goal {id}")))?;
        let moved = reorder(&mut self.db.goals, idx, direction.offset());
        debug!(goal = %id, ?direction, moved, "move goal");
        if moved {
            self.sync_rescored();
        }
        Ok(moved)
    }

    /// Move a project one place. Returns whether the order changed.
    pub fn move_project(&mut self, id: &str, direction: Direction) -> AppResult<bool> {
        let idx = self.project_idx(id)?;
        let moved = reorder(&mut self.db.projects, idx, direction.offset());
        debug!(project = %id, ?direction, moved, "move project");
        if moved {
            self.sync_rescored();
        }
        Ok(moved)
    }

    /// Move a task one place within its project's full task list.
    ///
    /// The parent project row is re-synced when the order changes.
    pub fn move_task(&mut self, project_id: &str, task_id: &str, direction: Direction) -> AppResult<bool> {
        let idx = self.project_idx(project_id)?;
        let project = &mut self.db.projects[idx];
        let task_idx = project
            .tasks
            .iter()
            .position(|t| t.id == task_id)
            .ok_or_else(|| AppError::NotFound(format!("task {task_id}")))?;
        let moved = reorder(&mut project.tasks, task_idx, direction.offset());
        debug!(project = %project_id, task = %task_id, ?direction, moved, "move task");
        if moved {
            project.updated_at_utc = Utc::now().timestamp();
            self.sync_project(idx, SyncOp::Update);
        }
        Ok(moved)
    }

    fn project_idx(&self, id: &str) -> AppResult<usize> {
        self.db
            .project_index(id)
            .ok_or_else(|| AppError::NotFound(format!("project {id}")))
    }

    fn check_project_draft(&self, draft: &ProjectDraft) -> AppResult<()> {
        if self.db.goal(&draft.goal_id).is_none() {
            return Err(AppError::NotFound(format!("goal {}", draft.goal_id)));
        }
        if let Some(tf) = draft.timeframe {
            if tf.end < tf.start {
                return Err(AppError::Invalid("timeframe ends before it starts".into()));
            }
        }
        Ok(())
    }

    /// Refresh stored scores after a reorder and re-sync every row whose
    /// score or priority changed.
    fn sync_rescored(&mut self) {
        let goal_scores: HashMap<String, u32> =
            self.db.goals.iter().map(|g| (g.id.clone(), g.score)).collect();
        let project_scores: HashMap<String, (u32, u32)> = self
            .db
            .projects
            .iter()
            .map(|p| (p.id.clone(), (p.score, p.priority_score)))
            .collect();
        self.db.refresh_scores();

        for goal in &self.db.goals {
            if goal_scores.get(&goal.id) != Some(&goal.score) {
                hand_off(
                    self.persister.as_mut(),
                    &mut self.sync_failures,
                    SyncOp::Update,
                    Row::Goal(goal),
                );
            }
        }
        for project in &self.db.projects {
            if project_scores.get(&project.id) != Some(&(project.score, project.priority_score)) {
                hand_off(
                    self.persister.as_mut(),
                    &mut self.sync_failures,
                    SyncOp::Update,
                    Row::Project(project),
                );
            }
        }
    }

    fn sync_project(&mut self, idx: usize, op: SyncOp) {
        hand_off(
            self.persister.as_mut(),
            &mut self.sync_failures,
            op,
            Row::Project(&self.db.projects[idx]),
        );
    }
}

/// Score the entry at `idx` against its own list and store the result.
fn rescore_at<E: Scorable + Clone>(items: &mut [E], idx: usize) {
    let mut entity = items[idx].clone();
    score_entity(&mut entity, items);
    items[idx] = entity;
}

fn hand_off(persister: &mut dyn Persister, failures: &mut Vec<SyncFailure>, op: SyncOp, row: Row<'_>) {
    let result: Result<(), SyncError> = match op {
        SyncOp::Create => persister.create(row),
        SyncOp::Update => persister.update(row),
    };
    if let Err(e) = result {
        warn!(table = row.table(), id = row.id(), ?op, error = %e, "sync failed; local state kept");
        failures.push(SyncFailure {
            op,
            table: row.table(),
            id: row.id().to_string(),
            error: e.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Rating, Status};
    use crate::persist::testing::RecordingPersister;
    use crate::persist::OfflinePersister;
    use crate::project::Timeframe;
    use chrono::NaiveDate;

    fn goal_draft(desc: &str, c: Rating, x: Rating) -> GoalDraft {
        GoalDraft {
            description: desc.into(),
            motivation: "  because  ".into(),
            status: Status::Active,
            complexity: c,
            excitement: x,
            color: None,
        }
    }

    fn project_draft(desc: &str, goal_id: &str, c: Rating, x: Rating) -> ProjectDraft {
        ProjectDraft {
            description: desc.into(),
            motivation: String::new(),
            status: Status::Active,
            complexity: c,
            excitement: x,
            timeframe: None,
            goal_id: goal_id.into(),
        }
    }

    fn offline() -> Planner {
        Planner::new(Database::default(), Box::new(OfflinePersister), Some("owner-1".into()))
    }

    #[test]
    fn test_add_goal_scores_new_tail_entry() {
        let mut planner = offline();
        let g1 = planner.add_goal(goal_draft("Get hired in tech", Rating::High, Rating::High)).unwrap();
        let g2 = planner.add_goal(goal_draft("Run a half marathon", Rating::Low, Rating::Low)).unwrap();

        assert_eq!(planner.goal(&g1).unwrap().score, 7);
        // Appended last, so importance 1.
        assert_eq!(planner.goal(&g2).unwrap().score, 3);
        let g = planner.goal(&g1).unwrap();
        assert_eq!(g.motivation, "because");
        assert_eq!(g.color, DEFAULT_GOAL_COLOR);
        assert_eq!(g.owner_id.as_deref(), Some("owner-1"));
    }

    #[test]
    fn test_add_goal_rejects_short_description() {
        let mut planner = offline();
        assert!(matches!(
            planner.add_goal(goal_draft("short", Rating::Low, Rating::Low)),
            Err(AppError::Invalid(_))
        ));
        assert!(planner.goals().is_empty());
    }

    #[test]
    fn test_update_goal_keeps_position() {
        let mut planner = offline();
        let g1 = planner.add_goal(goal_draft("Get hired in tech", Rating::Low, Rating::Low)).unwrap();
        let g2 = planner.add_goal(goal_draft("Run a half marathon", Rating::Low, Rating::Low)).unwrap();

        planner
            .update_goal(&g2, goal_draft("Run a full marathon", Rating::High, Rating::Medium))
            .unwrap();
        let ids: Vec<&str> = planner.goals().iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec![g1.as_str(), g2.as_str()]);
        assert_eq!(planner.goal(&g2).unwrap().description, "Run a full marathon");
        assert_eq!(planner.goal(&g2).unwrap().score, 3 + 2 + 1);
    }

    #[test]
    fn test_add_project_requires_known_goal_and_valid_timeframe() {
        let mut planner = offline();
        let g = planner.add_goal(goal_draft("Get hired in tech", Rating::High, Rating::High)).unwrap();

        let missing = project_draft("Build a portfolio site", "nope", Rating::Low, Rating::Low);
        assert!(matches!(planner.add_project(missing), Err(AppError::NotFound(_))));

        let mut backwards = project_draft("Build a portfolio site", &g, Rating::Low, Rating::Low);
        backwards.timeframe = Some(Timeframe {
            start: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
        });
        assert!(matches!(planner.add_project(backwards), Err(AppError::Invalid(_))));
        assert!(planner.projects().is_empty());
    }

    #[test]
    fn test_ranking_through_planner() {
        let mut planner = offline();
        let g = planner.add_goal(goal_draft("Get hired in tech", Rating::High, Rating::High)).unwrap();
        let p = planner
            .add_project(project_draft("Build a portfolio site", &g, Rating::Low, Rating::Low))
            .unwrap();

        let ranking = planner.ranking();
        assert_eq!(ranking.entries[0].id, p);
        assert_eq!(ranking.entries[0].priority_score, 10);

        planner.refresh_scores();
        planner.refresh_scores();
        assert_eq!(planner.project(&p).unwrap().priority_score, 10);
    }

    #[test]
    fn test_moving_a_goal_changes_the_ranking() {
        let mut planner = offline();
        let g1 = planner.add_goal(goal_draft("Get hired in tech", Rating::Medium, Rating::Medium)).unwrap();
        let g2 = planner.add_goal(goal_draft("Run a half marathon", Rating::Medium, Rating::Medium)).unwrap();
        let p1 = planner
            .add_project(project_draft("Build a portfolio site", &g1, Rating::Medium, Rating::Medium))
            .unwrap();
        let p2 = planner
            .add_project(project_draft("Follow a training plan", &g2, Rating::Medium, Rating::Medium))
            .unwrap();
        let ids = |r: Ranking| r.entries.into_iter().map(|p| p.id).collect::<Vec<_>>();
        assert_eq!(ids(planner.ranking()), vec![p1.clone(), p2.clone()]);

        assert!(planner.move_goal(&g2, Direction::Up).unwrap());
        assert!(planner.move_project(&p2, Direction::Up).unwrap());
        assert_eq!(ids(planner.ranking()), vec![p2, p1]);

        assert!(!planner.move_goal(&g2, Direction::Up).unwrap());
    }

    #[test]
    fn test_tasks_add_toggle_and_move() {
        let (persister, calls) = RecordingPersister::new(false);
        let mut planner = Planner::new(Database::default(), Box::new(persister), None);
        let g = planner.add_goal(goal_draft("Get hired in tech", Rating::High, Rating::High)).unwrap();
        let p = planner
            .add_project(project_draft("Build a portfolio site", &g, Rating::Low, Rating::Low))
            .unwrap();
        let t1 = planner.add_task(&p, "Pick a framework").unwrap();
        let t2 = planner.add_task(&p, "Write the about page").unwrap();
        assert!(matches!(planner.add_task(&p, "   "), Err(AppError::Invalid(_))));

        assert_eq!(planner.toggle_task(&p, &t1).unwrap(), TaskStatus::Completed);
        assert_eq!(planner.toggle_task(&p, &t1).unwrap(), TaskStatus::Active);

        assert!(planner.move_task(&p, &t2, Direction::Up).unwrap());
        assert!(!planner.move_task(&p, &t2, Direction::Up).unwrap());
        let order: Vec<&str> = planner.project(&p).unwrap().tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(order, vec![t2.as_str(), t1.as_str()]);

        let calls = calls.borrow();
        let ops: Vec<(&str, &str)> = calls.iter().map(|(op, table, _)| (*op, *table)).collect();
        assert_eq!(
            ops,
            vec![
                ("create", "goals"),
                ("create", "projects"),
                ("update", "projects"),
                ("update", "projects"),
                ("update", "projects"),
                ("update", "projects"),
                ("update", "projects"),
            ]
        );
    }

    #[test]
    fn test_moves_resync_rows_whose_scores_changed() {
        let (persister, calls) = RecordingPersister::new(false);
        let mut planner = Planner::new(Database::default(), Box::new(persister), None);
        let g1 = planner.add_goal(goal_draft("Get hired in tech", Rating::Medium, Rating::Medium)).unwrap();
        let g2 = planner.add_goal(goal_draft("Run a half marathon", Rating::Medium, Rating::Medium)).unwrap();
        let p1 = planner
            .add_project(project_draft("Build a portfolio site", &g1, Rating::Medium, Rating::Medium))
            .unwrap();
        let p2 = planner
            .add_project(project_draft("Follow a training plan", &g2, Rating::Medium, Rating::Medium))
            .unwrap();
        planner.refresh_scores();
        calls.borrow_mut().clear();

        // Goals 6/5 become 5/6; both projects' priorities follow their goal.
        assert!(planner.move_goal(&g2, Direction::Up).unwrap());
        let updated: Vec<(&str, String)> =
            calls.borrow().iter().map(|(op, table, id)| (*table, format!("{op}:{id}"))).collect();
        assert_eq!(
            updated,
            vec![
                ("goals", format!("update:{g2}")),
                ("goals", format!("update:{g1}")),
                ("projects", format!("update:{p1}")),
                ("projects", format!("update:{p2}")),
            ]
        );
        assert_eq!(planner.goal(&g2).unwrap().score, 6);
        assert_eq!(planner.project(&p2).unwrap().priority_score, 5 + 6);

        calls.borrow_mut().clear();
        assert!(!planner.move_goal(&g2, Direction::Up).unwrap());
        assert!(calls.borrow().is_empty());

        // Only the two swapped projects change.
        assert!(planner.move_project(&p2, Direction::Up).unwrap());
        let tables: Vec<&str> = calls.borrow().iter().map(|(_, table, _)| *table).collect();
        assert_eq!(tables, vec!["projects", "projects"]);
        assert_eq!(planner.project(&p2).unwrap().priority_score, 6 + 6);
        assert_eq!(planner.project(&p1).unwrap().priority_score, 5 + 5);
    }

    #[test]
    fn test_failed_sync_keeps_local_state_and_is_recorded() {
        let (persister, calls) = RecordingPersister::new(true);
        let mut planner = Planner::new(Database::default(), Box::new(persister), None);
        let g = planner.add_goal(goal_draft("Get hired in tech", Rating::High, Rating::High)).unwrap();
        planner
            .update_goal(&g, goal_draft("Get hired in fintech", Rating::High, Rating::Low))
            .unwrap();

        assert_eq!(planner.goals().len(), 1);
        assert_eq!(planner.goal(&g).unwrap().description, "Get hired in fintech");
        assert_eq!(calls.borrow().len(), 2);

        let failures = planner.sync_failures();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].op, SyncOp::Create);
        assert_eq!(failures[1].op, SyncOp::Update);
        assert_eq!(failures[1].id, g);
        assert_eq!(failures[1].table, "goals");
    }

    #[test]
    fn test_unknown_ids_are_not_found() {
        let mut planner = offline();
        assert!(matches!(planner.move_goal("x", Direction::Up), Err(AppError::NotFound(_))));
        assert!(matches!(planner.move_project("x", Direction::Up), Err(AppError::NotFound(_))));
        assert!(matches!(planner.add_task("x", "Do the thing"), Err(AppError::NotFound(_))));
        assert!(matches!(planner.toggle_task("x", "y"), Err(AppError::NotFound(_))));
    }
}
