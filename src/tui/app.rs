//! Main application logic for the terminal user interface.
//!
//! This module contains the `App` struct which shows the ranked board, lets
//! the user reorder goals, projects and tasks by hand, and toggles task
//! status. Every change is saved straight away, and the ranking is
//! recomputed on every frame.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction as LayoutDirection, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};

use crate::cmd::Context;
use crate::db::{goal_label, short_id};
use crate::fields::*;
use crate::tui::colors::{goal_color, text_on, DEEP_BLUE, MUTED};
use crate::tui::enums::{AppState, Pane};

/// State of the board view.
pub struct App<'a> {
    ctx: &'a mut Context,
    state: AppState,
    pane: Pane,
    tables: [TableState; 4],
    focus_project: Option<String>,
    status_message: String,
    seen_sync_failures: usize,
}

impl<'a> App<'a> {
    /// Create the board, focusing the top-ranked project's tasks.
    pub fn new(ctx: &'a mut Context) -> Self {
        ctx.planner.refresh_scores();
        let focus_project = ctx
            .planner
            .ranking()
            .entries
            .first()
            .map(|p| p.id.clone())
            .or_else(|| ctx.planner.projects().first().map(|p| p.id.clone()));
        let seen_sync_failures = ctx.planner.sync_failures().len();

        let mut app = App {
            ctx,
            state: AppState::Board,
            pane: Pane::Ranking,
            tables: Default::default(),
            focus_project,
            status_message: String::new(),
            seen_sync_failures,
        };
        for pane in Pane::ALL {
            app.clamp_selection(pane);
        }
        app
    }

    /// Ids listed in a pane, in display order.
    fn pane_ids(&self, pane: Pane) -> Vec<String> {
        let planner = &self.ctx.planner;
        match pane {
            Pane::Ranking => planner.ranking().entries.into_iter().map(|p| p.id).collect(),
            Pane::Goals => planner.goals().iter().map(|g| g.id.clone()).collect(),
            Pane::Projects => planner.projects().iter().map(|p| p.id.clone()).collect(),
            Pane::Tasks => self
                .focus_project
                .as_deref()
                .and_then(|id| planner.project(id))
                .map(|p| p.tasks.iter().map(|t| t.id.clone()).collect())
                .unwrap_or_default(),
        }
    }

    fn selected_id(&self) -> Option<String> {
        let ids = self.pane_ids(self.pane);
        self.tables[self.pane.index()]
            .selected()
            .and_then(|i| ids.get(i).cloned())
    }

    fn clamp_selection(&mut self, pane: Pane) {
        let len = self.pane_ids(pane).len();
        let state = &mut self.tables[pane.index()];
        match state.selected() {
            _ if len == 0 => state.select(None),
            Some(i) if i >= len => state.select(Some(len - 1)),
            None => state.select(Some(0)),
            _ => {}
        }
    }

    fn select_id(&mut self, pane: Pane, id: &str) {
        if let Some(i) = self.pane_ids(pane).iter().position(|x| x == id) {
            self.tables[pane.index()].select(Some(i));
        }
    }

    fn step_selection(&mut self, forward: bool) {
        let len = self.pane_ids(self.pane).len();
        let state = &mut self.tables[self.pane.index()];
        match state.selected() {
            Some(i) if forward && i + 1 < len => state.select(Some(i + 1)),
            Some(i) if !forward && i > 0 => state.select(Some(i - 1)),
            None if len > 0 => state.select(Some(0)),
            _ => {}
        }
    }

    fn set_status_message(&mut self, msg: String) {
        self.status_message = msg;
    }

    /// Save to disk and surface any new sync failures.
    fn persist(&mut self, msg: String) {
        if let Err(e) = self.ctx.save() {
            self.set_status_message(format!("Save failed: {e}"));
            return;
        }
        let failures = self.ctx.planner.sync_failures();
        if failures.len() > self.seen_sync_failures {
            let last = &failures[failures.len() - 1];
            let warning = format!("{msg} (sync failed: {})", last.error);
            self.seen_sync_failures = failures.len();
            self.set_status_message(warning);
        } else {
            self.set_status_message(msg);
        }
    }

    fn switch_pane(&mut self, pane: Pane) {
        self.pane = pane;
        self.clamp_selection(pane);
    }

    /// Show the selected project's tasks.
    fn open_tasks(&mut self) {
        if !matches!(self.pane, Pane::Ranking | Pane::Projects) {
            return;
        }
        if let Some(id) = self.selected_id() {
            self.focus_project = Some(id);
            self.tables[Pane::Tasks.index()] = TableState::default();
            self.switch_pane(Pane::Tasks);
        }
    }

    fn move_selected(&mut self, direction: Direction) {
        if !self.pane.reorderable() {
            self.set_status_message("Ranking order is computed; reorder goals or projects instead".into());
            return;
        }
        let Some(id) = self.selected_id() else { return };
        let result = match self.pane {
            Pane::Goals => self.ctx.planner.move_goal(&id, direction),
            Pane::Projects => self.ctx.planner.move_project(&id, direction),
            Pane::Tasks => match self.focus_project.clone() {
                Some(project_id) => self.ctx.planner.move_task(&project_id, &id, direction),
                None => return,
            },
            Pane::Ranking => return,
        };
        match result {
            Ok(true) => {
                self.select_id(self.pane, &id);
                self.persist(format!("Moved {} {}", self.pane.title().to_lowercase(), short_id(&id)));
            }
            Ok(false) => {
                let edge = if direction == Direction::Up { "top" } else { "bottom" };
                self.set_status_message(format!("Already at the {edge}"));
            }
            Err(e) => self.set_status_message(e.to_string()),
        }
    }

    fn toggle_selected_task(&mut self) {
        if self.pane != Pane::Tasks {
            return;
        }
        let (Some(project_id), Some(task_id)) = (self.focus_project.clone(), self.selected_id()) else {
            return;
        };
        match self.ctx.planner.toggle_task(&project_id, &task_id) {
            Ok(status) => self.persist(format!("Task marked {}", format_task_status(status).to_lowercase())),
            Err(e) => self.set_status_message(e.to_string()),
        }
    }

    /// Apply a key press. Returns true when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        if self.state == AppState::Help {
            self.state = AppState::Board;
            return false;
        }
        let shift = modifiers.contains(KeyModifiers::SHIFT);
        match key {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('h') | KeyCode::F(1) => self.state = AppState::Help,
            KeyCode::Tab => self.switch_pane(self.pane.next()),
            KeyCode::BackTab => self.switch_pane(self.pane.prev()),
            KeyCode::Char(c @ '1'..='4') => {
                let idx = c as usize - '1' as usize;
                self.switch_pane(Pane::ALL[idx]);
            }
            KeyCode::Up if shift => self.move_selected(Direction::Up),
            KeyCode::Down if shift => self.move_selected(Direction::Down),
            KeyCode::Char('K') => self.move_selected(Direction::Up),
            KeyCode::Char('J') => self.move_selected(Direction::Down),
            KeyCode::Up | KeyCode::Char('k') => self.step_selection(false),
            KeyCode::Down | KeyCode::Char('j') => self.step_selection(true),
            KeyCode::Enter => self.open_tasks(),
            KeyCode::Char(' ') | KeyCode::Char('c') => self.toggle_selected_task(),
            KeyCode::Char('r') => self.persist("Scores refreshed".into()),
            _ => {}
        }
        false
    }

    /// Poll for one input event and apply it.
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                self.status_message.clear();
                return Ok(self.handle_key(key.code, key.modifiers));
            }
        }
        Ok(false)
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled("PRIORITIZER", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("   "),
        ];
        for (i, pane) in Pane::ALL.iter().enumerate() {
            let label = format!(" {} {} ", i + 1, pane.title());
            let style = if *pane == self.pane {
                Style::default().bg(DEEP_BLUE).fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Cyan)
            };
            spans.push(Span::styled(label, style));
            spans.push(Span::raw(" "));
        }
        let header = Paragraph::new(vec![Line::from(spans)])
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header, area);
    }

    fn header_row(cells: &[&'static str]) -> Row<'static> {
        Row::new(cells.iter().map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD))))
            .style(Style::default().bg(DEEP_BLUE).fg(Color::White))
            .height(1)
    }

    fn table<'t>(rows: Vec<Row<'t>>, widths: Vec<Constraint>, header: Row<'t>, title: String) -> Table<'t> {
        Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ")
    }

    fn render_ranking(&mut self, f: &mut Frame, area: Rect) {
        let planner = &self.ctx.planner;
        let ranking = planner.ranking();
        let goals = planner.goals();
        let rows: Vec<Row> = ranking
            .entries
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let unlinked = ranking.unlinked.contains(&p.id);
                let style = match goals.iter().find(|g| g.id == p.goal_id) {
                    Some(g) => Style::default().fg(goal_color(&g.color)),
                    None => Style::default().fg(Color::Red),
                };
                let open = p.count_tasks(TaskStatus::Active);
                let total = p.tasks.len();
                Row::new(vec![
                    Cell::from((i + 1).to_string()),
                    Cell::from(if unlinked { "-".to_string() } else { p.priority_score.to_string() }),
                    Cell::from(p.score.to_string()),
                    Cell::from(goal_label(&p.goal_id, goals)),
                    Cell::from(format!("{open}/{total}")),
                    Cell::from(p.description.clone()),
                ])
                .style(style)
            })
            .collect();
        let count = rows.len();
        let table = Self::table(
            rows,
            vec![
                Constraint::Length(5),
                Constraint::Length(6),
                Constraint::Length(6),
                Constraint::Length(28),
                Constraint::Length(7),
                Constraint::Min(20),
            ],
            Self::header_row(&["Rank", "Prio", "Score", "Goal", "Tasks", "Project"]),
            format!("Ranking ({count} active) - Enter shows tasks, h for help"),
        );
        f.render_stateful_widget(table, area, &mut self.tables[Pane::Ranking.index()]);
    }

    fn render_goals(&mut self, f: &mut Frame, area: Rect) {
        let goals = self.ctx.planner.goals();
        let rows: Vec<Row> = goals
            .iter()
            .enumerate()
            .map(|(i, g)| {
                let color = goal_color(&g.color);
                let style = match g.status {
                    Status::Active => Style::default().fg(Color::White),
                    _ => Style::default().fg(MUTED),
                };
                Row::new(vec![
                    Cell::from((i + 1).to_string()),
                    Cell::from("  ").style(Style::default().bg(color)),
                    Cell::from(g.score.to_string()),
                    Cell::from(format_rating(&g.complexity)),
                    Cell::from(format_rating(&g.excitement)),
                    Cell::from(format_status(&g.status)),
                    Cell::from(g.description.clone()),
                ])
                .style(style)
            })
            .collect();
        let count = rows.len();
        let table = Self::table(
            rows,
            vec![
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Length(6),
                Constraint::Length(7),
                Constraint::Length(7),
                Constraint::Length(10),
                Constraint::Min(20),
            ],
            Self::header_row(&["#", "", "Score", "Cplx", "Excite", "Status", "Goal"]),
            format!("Goals ({count}) - Shift+Up/Down to reorder"),
        );
        f.render_stateful_widget(table, area, &mut self.tables[Pane::Goals.index()]);
    }

    fn render_projects(&mut self, f: &mut Frame, area: Rect) {
        let planner = &self.ctx.planner;
        let goals = planner.goals();
        let rows: Vec<Row> = planner
            .projects()
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let style = match p.status {
                    Status::Active => Style::default().fg(Color::White),
                    _ => Style::default().fg(MUTED),
                };
                let swatch = goals
                    .iter()
                    .find(|g| g.id == p.goal_id)
                    .map(|g| goal_color(&g.color))
                    .unwrap_or(Color::Red);
                Row::new(vec![
                    Cell::from((i + 1).to_string()),
                    Cell::from("  ").style(Style::default().bg(swatch)),
                    Cell::from(p.priority_score.to_string()),
                    Cell::from(p.score.to_string()),
                    Cell::from(format_status(&p.status)),
                    Cell::from(goal_label(&p.goal_id, goals)),
                    Cell::from(p.description.clone()),
                ])
                .style(style)
            })
            .collect();
        let count = rows.len();
        let table = Self::table(
            rows,
            vec![
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Length(6),
                Constraint::Length(6),
                Constraint::Length(10),
                Constraint::Length(28),
                Constraint::Min(20),
            ],
            Self::header_row(&["#", "", "Prio", "Score", "Status", "Goal", "Project"]),
            format!("Projects ({count}) - Shift+Up/Down to reorder, Enter shows tasks"),
        );
        f.render_stateful_widget(table, area, &mut self.tables[Pane::Projects.index()]);
    }

    fn render_tasks(&mut self, f: &mut Frame, area: Rect) {
        let planner = &self.ctx.planner;
        let project = self.focus_project.as_deref().and_then(|id| planner.project(id));
        let bg = project
            .and_then(|p| planner.goal(&p.goal_id))
            .map(|g| goal_color(&g.color))
            .unwrap_or(DEEP_BLUE);
        let title = match project {
            Some(p) => format!(
                "Tasks for '{}' ({} active, {} completed) - Space toggles, Shift+Up/Down reorders",
                p.description,
                p.count_tasks(TaskStatus::Active),
                p.count_tasks(TaskStatus::Completed)
            ),
            None => "Tasks - select a project and press Enter".to_string(),
        };
        let rows: Vec<Row> = project
            .map(|p| {
                p.tasks
                    .iter()
                    .enumerate()
                    .map(|(i, t)| {
                        let style = match t.status {
                            TaskStatus::Active => Style::default().fg(Color::White),
                            TaskStatus::Completed => Style::default().fg(MUTED).add_modifier(Modifier::CROSSED_OUT),
                        };
                        Row::new(vec![
                            Cell::from((i + 1).to_string()),
                            Cell::from(format_task_status(t.status)),
                            Cell::from(t.description.clone()),
                        ])
                        .style(style)
                    })
                    .collect()
            })
            .unwrap_or_default();
        let header = Row::new(["#", "Status", "Task"].iter().map(|h| {
            Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD))
        }))
        .style(Style::default().bg(bg).fg(text_on(bg)))
        .height(1);
        let table = Self::table(
            rows,
            vec![Constraint::Length(4), Constraint::Length(11), Constraint::Min(20)],
            header,
            title,
        );
        f.render_stateful_widget(table, area, &mut self.tables[Pane::Tasks.index()]);
    }

    /// Render the help screen with keyboard shortcuts.
    fn render_help(&mut self, f: &mut Frame, area: Rect) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let help_text = vec![
            Line::from(vec![Span::styled("Prioritizer Help", bold)]),
            Line::from(""),
            Line::from(vec![Span::styled("Board:", bold)]),
            Line::from("  Tab/Shift+Tab  Switch pane (or 1-4)"),
            Line::from("  Up/Down, k/j   Move selection"),
            Line::from("  Shift+Up/Down  Move selected goal, project or task (or K/J)"),
            Line::from("  Enter          Show tasks of the selected project"),
            Line::from("  Space/c        Toggle task active/completed"),
            Line::from("  r              Recompute and save scores"),
            Line::from("  h/F1           Show this help"),
            Line::from("  q/Esc/Ctrl+C   Quit"),
            Line::from(""),
            Line::from(vec![Span::styled("Scoring:", bold)]),
            Line::from("  score    = complexity + excitement + position (low=1, medium=2, high=3)"),
            Line::from("  position = list length - index, so the top entry counts most"),
            Line::from("  priority = project score + goal score; only active projects are ranked"),
        ];

        let paragraph = Paragraph::new(help_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Help - Press any key to return"),
            )
            .wrap(Wrap { trim: true });

        f.render_widget(paragraph, area);
    }

    /// Render the status bar at the bottom of the screen.
    fn render_status_bar(&mut self, f: &mut Frame, area: Rect) {
        let status_text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            match self.state {
                AppState::Board => format!(
                    "{} goals, {} projects | Press 'h' for help",
                    self.ctx.planner.goals().len(),
                    self.ctx.planner.projects().len()
                ),
                AppState::Help => "Help".to_string(),
            }
        };
        let status = Paragraph::new(status_text)
            .style(Style::default().bg(DEEP_BLUE).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    /// Main render function that dispatches to the pane renderers.
    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(LayoutDirection::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)].as_ref())
            .split(f.area());

        self.render_header(f, chunks[0]);
        match (self.state, self.pane) {
            (AppState::Help, _) => self.render_help(f, chunks[1]),
            (AppState::Board, Pane::Ranking) => self.render_ranking(f, chunks[1]),
            (AppState::Board, Pane::Goals) => self.render_goals(f, chunks[1]),
            (AppState::Board, Pane::Projects) => self.render_projects(f, chunks[1]),
            (AppState::Board, Pane::Tasks) => self.render_tasks(f, chunks[1]),
        }
        self.render_status_bar(f, chunks[2]);
    }

    /// Main event loop for the TUI application.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}
