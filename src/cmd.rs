//! Command implementations for the CLI interface.
//!
//! This module contains the subcommand definitions and their handlers: adding
//! and editing goals, projects and tasks, manual reordering, the ranking view
//! and the TUI launcher.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, TimeZone, Utc};
use clap::Subcommand;
use clap_complete::{generate, Shell};
use serde::Serialize;
use tracing::warn;

use crate::db::*;
use crate::error::{AppError, AppResult};
use crate::fields::*;
use crate::goal::GoalDraft;
use crate::planner::Planner;
use crate::project::{ProjectDraft, Timeframe};
use crate::tui::run::run_tui;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive board.
    Ui,

    /// Show active projects ranked by priority.
    Rank {
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
        /// Print the ranking as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Manage goals.
    Goal {
        #[command(subcommand)]
        action: GoalAction,
    },

    /// Manage projects.
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Manage a project's tasks.
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum GoalAction {
    /// Add a goal at the bottom of the goal list.
    Add {
        /// What you want to accomplish in the next six months (10-120 characters).
        description: String,
        /// Why it matters.
        #[arg(long, default_value = "")]
        motivation: String,
        /// Complexity: low | medium | high.
        #[arg(long, value_enum, default_value_t = Rating::Medium)]
        complexity: Rating,
        /// Excitement: low | medium | high.
        #[arg(long, value_enum, default_value_t = Rating::Medium)]
        excitement: Rating,
        /// Display colour as #rrggbb.
        #[arg(long)]
        color: Option<String>,
        /// Status: active | completed.
        #[arg(long, value_enum, default_value_t = Status::Active)]
        status: Status,
    },
    /// Edit fields on a goal.
    Edit {
        /// Goal id, id prefix or description.
        goal: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        motivation: Option<String>,
        #[arg(long, value_enum)]
        complexity: Option<Rating>,
        #[arg(long, value_enum)]
        excitement: Option<Rating>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long, value_enum)]
        status: Option<Status>,
    },
    /// List goals in order.
    List,
    /// Show a single goal and its projects.
    View {
        /// Goal id, id prefix or description.
        goal: String,
    },
    /// Move a goal up or down one place.
    Move {
        /// Goal id, id prefix or description.
        goal: String,
        #[arg(value_enum)]
        direction: Direction,
    },
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Add a project at the bottom of the project list.
    Add {
        /// What the project delivers (10-120 characters).
        description: String,
        /// Goal id, id prefix or description this project advances.
        #[arg(long)]
        goal: String,
        #[arg(long, default_value = "")]
        motivation: String,
        /// Complexity: low | medium | high.
        #[arg(long, value_enum, default_value_t = Rating::Medium)]
        complexity: Rating,
        /// Excitement: low | medium | high.
        #[arg(long, value_enum, default_value_t = Rating::Medium)]
        excitement: Rating,
        /// Start date: YYYY-MM-DD, "today", "tomorrow", or "in Nd".
        #[arg(long)]
        start: Option<String>,
        /// End date: YYYY-MM-DD, "today", "tomorrow", or "in Nd".
        #[arg(long)]
        end: Option<String>,
        /// Status: active | completed.
        #[arg(long, value_enum, default_value_t = Status::Active)]
        status: Status,
    },
    /// Edit fields on a project.
    Edit {
        /// Project id, id prefix or description.
        project: String,
        #[arg(long)]
        description: Option<String>,
        /// Move the project under another goal.
        #[arg(long)]
        goal: Option<String>,
        #[arg(long)]
        motivation: Option<String>,
        #[arg(long, value_enum)]
        complexity: Option<Rating>,
        #[arg(long, value_enum)]
        excitement: Option<Rating>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        /// Remove the timeframe.
        #[arg(long)]
        clear_timeframe: bool,
        #[arg(long, value_enum)]
        status: Option<Status>,
    },
    /// List projects in order.
    List,
    /// Show a single project with its tasks.
    View {
        /// Project id, id prefix or description.
        project: String,
    },
    /// Move a project up or down one place.
    Move {
        /// Project id, id prefix or description.
        project: String,
        #[arg(value_enum)]
        direction: Direction,
    },
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task at the end of a project's task list.
    Add {
        /// Project id, id prefix or description.
        project: String,
        description: String,
    },
    /// Mark a task completed.
    Done {
        project: String,
        /// Task id, id prefix or description.
        task: String,
    },
    /// Mark a task active again.
    Reopen {
        project: String,
        /// Task id, id prefix or description.
        task: String,
    },
    /// Move a task up or down one place.
    Move {
        project: String,
        /// Task id, id prefix or description.
        task: String,
        #[arg(value_enum)]
        direction: Direction,
    },
    /// List a project's tasks in order.
    List { project: String },
}

/// Loaded planner plus the file it is saved to.
pub struct Context {
    pub planner: Planner,
    pub db_path: PathBuf,
}

impl Context {
    /// Refresh stored scores and write the database.
    pub fn save(&mut self) -> AppResult<()> {
        let unlinked = self.planner.refresh_scores();
        if !unlinked.is_empty() {
            warn!(count = unlinked.len(), "saving projects that reference missing goals");
        }
        self.planner.database().save(&self.db_path)
    }

    fn report_sync(&self) {
        for f in self.planner.sync_failures() {
            eprintln!("Warning: could not sync {} {}: {}", f.table, short_id(&f.id), f.error);
        }
    }
}

/// Dispatch a parsed command.
pub fn dispatch(ctx: &mut Context, command: Commands) -> AppResult<()> {
    match command {
        Commands::Ui => cmd_ui(ctx),
        Commands::Rank { limit, json } => cmd_rank(&ctx.planner, limit, json),
        Commands::Goal { action } => cmd_goal(ctx, action),
        Commands::Project { action } => cmd_project(ctx, action),
        Commands::Task { action } => cmd_task(ctx, action),
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
    }
}

/// Launch the terminal user interface.
pub fn cmd_ui(ctx: &mut Context) -> AppResult<()> {
    run_tui(ctx)?;
    ctx.report_sync();
    Ok(())
}

#[derive(Serialize)]
struct RankRow<'a> {
    rank: usize,
    id: &'a str,
    description: &'a str,
    priority_score: u32,
    score: u32,
    goal_id: &'a str,
    goal: String,
    unlinked: bool,
}

/// Print the ranking of active projects.
pub fn cmd_rank(planner: &Planner, limit: Option<usize>, json: bool) -> AppResult<()> {
    let ranking = planner.ranking();
    let goals = planner.goals();
    if json {
        let rows: Vec<RankRow> = ranking
            .entries
            .iter()
            .take(limit.unwrap_or(usize::MAX))
            .enumerate()
            .map(|(i, p)| RankRow {
                rank: i + 1,
                id: &p.id,
                description: &p.description,
                priority_score: p.priority_score,
                score: p.score,
                goal_id: &p.goal_id,
                goal: goal_label(&p.goal_id, goals),
                unlinked: ranking.unlinked.contains(&p.id),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else if ranking.entries.is_empty() {
        println!("No active projects.");
    } else {
        print_ranking(&ranking, goals, limit);
    }
    Ok(())
}

/// Handle goal subcommands.
pub fn cmd_goal(ctx: &mut Context, action: GoalAction) -> AppResult<()> {
    match action {
        GoalAction::Add { description, motivation, complexity, excitement, color, status } => {
            let id = ctx.planner.add_goal(GoalDraft {
                description,
                motivation,
                status,
                complexity,
                excitement,
                color,
            })?;
            ctx.save()?;
            ctx.report_sync();
            println!("Added goal {}", short_id(&id));
        }
        GoalAction::Edit { goal, description, motivation, complexity, excitement, color, status } => {
            let id = resolve_identifier(&goal, ctx.planner.goals())?;
            let Some(current) = ctx.planner.goal(&id) else {
                return Err(AppError::NotFound(format!("goal {id}")));
            };
            let draft = GoalDraft {
                description: description.unwrap_or_else(|| current.description.clone()),
                motivation: motivation.unwrap_or_else(|| current.motivation.clone()),
                status: status.unwrap_or_else(|| current.status.clone()),
                complexity: complexity.unwrap_or_else(|| current.complexity.clone()),
                excitement: excitement.unwrap_or_else(|| current.excitement.clone()),
                color,
            };
            ctx.planner.update_goal(&id, draft)?;
            ctx.save()?;
            ctx.report_sync();
            println!("Updated goal {}", short_id(&id));
        }
        GoalAction::List => {
            ctx.planner.refresh_scores();
            if ctx.planner.goals().is_empty() {
                println!("No goals yet. Add one with `prio goal add`.");
            } else {
                print_goals(ctx.planner.goals());
            }
        }
        GoalAction::View { goal } => {
            ctx.planner.refresh_scores();
            let id = resolve_identifier(&goal, ctx.planner.goals())?;
            let Some(g) = ctx.planner.goal(&id) else {
                return Err(AppError::NotFound(format!("goal {id}")));
            };
            println!("ID:           {}", g.id);
            println!("Description:  {}", g.description);
            println!("Motivation:   {}", if g.motivation.is_empty() { "-" } else { g.motivation.as_str() });
            println!("Status:       {}", format_status(&g.status));
            println!("Complexity:   {}", format_rating(&g.complexity));
            println!("Excitement:   {}", format_rating(&g.excitement));
            println!("Colour:       {}", g.color);
            println!("Score:        {}", g.score);
            println!("Owner:        {}", g.owner_id.as_deref().unwrap_or("-"));
            println!("Created UTC:  {}", format_timestamp(g.created_at_utc));
            println!("Updated UTC:  {}", format_timestamp(g.updated_at_utc));
            let projects: Vec<_> = ctx
                .planner
                .projects()
                .iter()
                .filter(|p| p.goal_id == id)
                .cloned()
                .collect();
            if !projects.is_empty() {
                println!();
                print_projects(&projects, ctx.planner.goals());
            }
        }
        GoalAction::Move { goal, direction } => {
            let id = resolve_identifier(&goal, ctx.planner.goals())?;
            if ctx.planner.move_goal(&id, direction)? {
                ctx.save()?;
                println!("Moved goal {}", short_id(&id));
            } else {
                println!("Goal {} is already at the {}", short_id(&id), edge(direction));
            }
        }
    }
    Ok(())
}

/// Handle project subcommands.
pub fn cmd_project(ctx: &mut Context, action: ProjectAction) -> AppResult<()> {
    match action {
        ProjectAction::Add { description, goal, motivation, complexity, excitement, start, end, status } => {
            let goal_id = resolve_identifier(&goal, ctx.planner.goals())?;
            let timeframe = build_timeframe(start.as_deref(), end.as_deref(), None)?;
            let id = ctx.planner.add_project(ProjectDraft {
                description,
                motivation,
                status,
                complexity,
                excitement,
                timeframe,
                goal_id,
            })?;
            ctx.save()?;
            ctx.report_sync();
            println!("Added project {}", short_id(&id));
        }
        ProjectAction::Edit {
            project, description, goal, motivation, complexity, excitement, start, end,
            clear_timeframe, status,
        } => {
            let id = resolve_identifier(&project, ctx.planner.projects())?;
            let goal_id = goal
                .map(|g| resolve_identifier(&g, ctx.planner.goals()))
                .transpose()?;
            let Some(current) = ctx.planner.project(&id) else {
                return Err(AppError::NotFound(format!("project {id}")));
            };
            let timeframe = if clear_timeframe {
                None
            } else {
                build_timeframe(start.as_deref(), end.as_deref(), current.timeframe)?
            };
            let draft = ProjectDraft {
                description: description.unwrap_or_else(|| current.description.clone()),
                motivation: motivation.unwrap_or_else(|| current.motivation.clone()),
                status: status.unwrap_or_else(|| current.status.clone()),
                complexity: complexity.unwrap_or_else(|| current.complexity.clone()),
                excitement: excitement.unwrap_or_else(|| current.excitement.clone()),
                timeframe,
                goal_id: goal_id.unwrap_or_else(|| current.goal_id.clone()),
            };
            ctx.planner.update_project(&id, draft)?;
            ctx.save()?;
            ctx.report_sync();
            println!("Updated project {}", short_id(&id));
        }
        ProjectAction::List => {
            ctx.planner.refresh_scores();
            if ctx.planner.projects().is_empty() {
                println!("No projects yet. Add one with `prio project add`.");
            } else {
                print_projects(ctx.planner.projects(), ctx.planner.goals());
            }
        }
        ProjectAction::View { project } => {
            ctx.planner.refresh_scores();
            let id = resolve_identifier(&project, ctx.planner.projects())?;
            let Some(p) = ctx.planner.project(&id) else {
                return Err(AppError::NotFound(format!("project {id}")));
            };
            println!("ID:           {}", p.id);
            println!("Description:  {}", p.description);
            println!("Motivation:   {}", if p.motivation.is_empty() { "-" } else { p.motivation.as_str() });
            println!("Goal:         {}", goal_label(&p.goal_id, ctx.planner.goals()));
            println!("Status:       {}", format_status(&p.status));
            println!("Complexity:   {}", format_rating(&p.complexity));
            println!("Excitement:   {}", format_rating(&p.excitement));
            println!("Timeframe:    {}", match p.timeframe {
                Some(tf) => format!("{} to {}", tf.start, tf.end),
                None => "-".into(),
            });
            println!("Score:        {}", p.score);
            println!("Priority:     {}", p.priority_score);
            println!("Owner:        {}", p.owner_id.as_deref().unwrap_or("-"));
            println!("Created UTC:  {}", format_timestamp(p.created_at_utc));
            println!("Updated UTC:  {}", format_timestamp(p.updated_at_utc));
            if !p.tasks.is_empty() {
                println!();
                print_tasks(p);
            }
        }
        ProjectAction::Move { project, direction } => {
            let id = resolve_identifier(&project, ctx.planner.projects())?;
            if ctx.planner.move_project(&id, direction)? {
                ctx.save()?;
                println!("Moved project {}", short_id(&id));
            } else {
                println!("Project {} is already at the {}", short_id(&id), edge(direction));
            }
        }
    }
    Ok(())
}

/// Handle task subcommands.
pub fn cmd_task(ctx: &mut Context, action: TaskAction) -> AppResult<()> {
    match action {
        TaskAction::Add { project, description } => {
            let project_id = resolve_identifier(&project, ctx.planner.projects())?;
            let id = ctx.planner.add_task(&project_id, &description)?;
            ctx.save()?;
            ctx.report_sync();
            println!("Added task {}", short_id(&id));
        }
        TaskAction::Done { project, task } => {
            let (project_id, task_id) = resolve_task(ctx, &project, &task)?;
            ctx.planner.set_task_status(&project_id, &task_id, TaskStatus::Completed)?;
            ctx.save()?;
            ctx.report_sync();
            println!("Completed task {}", short_id(&task_id));
        }
        TaskAction::Reopen { project, task } => {
            let (project_id, task_id) = resolve_task(ctx, &project, &task)?;
            ctx.planner.set_task_status(&project_id, &task_id, TaskStatus::Active)?;
            ctx.save()?;
            ctx.report_sync();
            println!("Reopened task {}", short_id(&task_id));
        }
        TaskAction::Move { project, task, direction } => {
            let (project_id, task_id) = resolve_task(ctx, &project, &task)?;
            if ctx.planner.move_task(&project_id, &task_id, direction)? {
                ctx.save()?;
                ctx.report_sync();
                println!("Moved task {}", short_id(&task_id));
            } else {
                println!("Task {} is already at the {}", short_id(&task_id), edge(direction));
            }
        }
        TaskAction::List { project } => {
            let project_id = resolve_identifier(&project, ctx.planner.projects())?;
            if let Some(p) = ctx.planner.project(&project_id) {
                print_tasks(p);
            }
        }
    }
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

fn resolve_task(ctx: &Context, project: &str, task: &str) -> AppResult<(String, String)> {
    let project_id = resolve_identifier(project, ctx.planner.projects())?;
    let tasks = ctx
        .planner
        .project(&project_id)
        .map(|p| p.tasks.as_slice())
        .unwrap_or_default();
    let task_id = resolve_identifier(task, tasks)?;
    Ok((project_id, task_id))
}

fn parse_date_arg(s: &str) -> AppResult<NaiveDate> {
    parse_date_input(s).ok_or_else(|| AppError::Invalid(format!("could not parse date '{s}'")))
}

/// Combine optional start/end arguments with an existing timeframe.
///
/// With nothing given the existing timeframe is kept. A missing start falls
/// back to the existing one or today; a missing end falls back to the existing
/// one or the start.
fn build_timeframe(
    start: Option<&str>,
    end: Option<&str>,
    existing: Option<Timeframe>,
) -> AppResult<Option<Timeframe>> {
    if start.is_none() && end.is_none() {
        return Ok(existing);
    }
    let start = match start {
        Some(s) => parse_date_arg(s)?,
        None => existing.map(|tf| tf.start).unwrap_or_else(|| Local::now().date_naive()),
    };
    let end = match end {
        Some(s) => parse_date_arg(s)?,
        None => existing.map(|tf| tf.end).unwrap_or(start),
    };
    Ok(Some(Timeframe { start, end }))
}

fn format_timestamp(ts: i64) -> String {
    Utc.timestamp_opt(ts, 0)
        .single()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "-".into())
}

fn edge(direction: Direction) -> &'static str {
    match direction {
        Direction::Up => "top",
        Direction::Down => "bottom",
    }
}

/// Open the database and planner for a path, used by tests and the TUI.
pub fn open_context(db_path: &Path, planner_for: impl FnOnce(Database) -> Planner) -> AppResult<Context> {
    let db = Database::load(db_path)?;
    Ok(Context {
        planner: planner_for(db),
        db_path: db_path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::OfflinePersister;

    fn context(dir: &Path) -> Context {
        open_context(&dir.join("board.json"), |db| {
            Planner::new(db, Box::new(OfflinePersister), None)
        })
        .unwrap()
    }

    #[test]
    fn test_build_timeframe() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(build_timeframe(None, None, None).unwrap(), None);

        let tf = build_timeframe(Some("2026-01-01"), None, None).unwrap().unwrap();
        assert_eq!((tf.start, tf.end), (d(2026, 1, 1), d(2026, 1, 1)));

        let existing = Some(Timeframe { start: d(2026, 1, 1), end: d(2026, 2, 1) });
        let tf = build_timeframe(None, Some("2026-03-01"), existing).unwrap().unwrap();
        assert_eq!((tf.start, tf.end), (d(2026, 1, 1), d(2026, 3, 1)));

        assert!(matches!(build_timeframe(Some("soon"), None, None), Err(AppError::Invalid(_))));
    }

    #[test]
    fn test_commands_persist_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path());

        cmd_goal(&mut ctx, GoalAction::Add {
            description: "Get hired in the tech industry".into(),
            motivation: String::new(),
            complexity: Rating::High,
            excitement: Rating::High,
            color: None,
            status: Status::Active,
        })
        .unwrap();
        cmd_project(&mut ctx, ProjectAction::Add {
            description: "Build a portfolio site".into(),
            goal: "get hired in the tech industry".into(),
            motivation: String::new(),
            complexity: Rating::Low,
            excitement: Rating::Low,
            start: None,
            end: None,
            status: Status::Active,
        })
        .unwrap();
        cmd_task(&mut ctx, TaskAction::Add {
            project: "build a portfolio site".into(),
            description: "Pick a framework".into(),
        })
        .unwrap();
        cmd_task(&mut ctx, TaskAction::Done {
            project: "build a portfolio site".into(),
            task: "pick a framework".into(),
        })
        .unwrap();

        let reloaded = context(dir.path());
        let p = &reloaded.planner.projects()[0];
        assert_eq!(p.priority_score, 10);
        assert_eq!(p.tasks[0].status, TaskStatus::Completed);
        assert_eq!(reloaded.planner.goals()[0].score, 7);
    }

    #[test]
    fn test_edit_keeps_unspecified_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path());
        cmd_goal(&mut ctx, GoalAction::Add {
            description: "Get hired in the tech industry".into(),
            motivation: "Pay rent".into(),
            complexity: Rating::High,
            excitement: Rating::Low,
            color: Some("#115E59".into()),
            status: Status::Active,
        })
        .unwrap();
        cmd_goal(&mut ctx, GoalAction::Edit {
            goal: "get hired in the tech industry".into(),
            description: None,
            motivation: None,
            complexity: None,
            excitement: Some(Rating::High),
            color: None,
            status: None,
        })
        .unwrap();

        let g = &ctx.planner.goals()[0];
        assert_eq!(g.motivation, "Pay rent");
        assert_eq!(g.complexity, Rating::High);
        assert_eq!(g.excitement, Rating::High);
        assert_eq!(g.color, "#115e59");
    }
}
