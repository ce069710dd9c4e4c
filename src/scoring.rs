//! Scoring and ranking of goals and projects.
//!
//! Every entity gets a score from three terms: the weight of its complexity
//! rating, the weight of its excitement rating, and its positional importance
//! (entities nearer the front of their list matter more). A project's
//! priority is its own score plus the score of the goal it advances.
//!
//! All scores are recomputed from scratch on each pass, so ranking the same
//! lists twice gives the same answer.

use tracing::warn;

use crate::fields::{Rating, Status};
use crate::goal::Goal;
use crate::project::Project;

/// An entity that can be scored against the ordered list containing it.
pub trait Scorable {
    fn id(&self) -> &str;
    fn complexity(&self) -> &Rating;
    fn excitement(&self) -> &Rating;
    fn set_score(&mut self, score: u32);
}

impl Scorable for Goal {
    fn id(&self) -> &str {
        &self.id
    }
    fn complexity(&self) -> &Rating {
        &self.complexity
    }
    fn excitement(&self) -> &Rating {
        &self.excitement
    }
    fn set_score(&mut self, score: u32) {
        self.score = score;
    }
}

impl Scorable for Project {
    fn id(&self) -> &str {
        &self.id
    }
    fn complexity(&self) -> &Rating {
        &self.complexity
    }
    fn excitement(&self) -> &Rating {
        &self.excitement
    }
    fn set_score(&mut self, score: u32) {
        self.score = score;
    }
}

/// Importance of the entry at `index` in a list of `len` entries.
///
/// The front entry gets `len`, the last gets 1. An entity missing from its
/// list contributes nothing.
pub fn positional_importance(len: usize, index: Option<usize>) -> u32 {
    match index {
        Some(i) if i < len => u32::try_from(len - i).unwrap_or(u32::MAX),
        _ => 0,
    }
}

fn weighted_score<E: Scorable>(entity: &E, len: usize, index: Option<usize>) -> u32 {
    entity.complexity().weight() + entity.excitement().weight() + positional_importance(len, index)
}

/// Score of `entity` given the list it belongs to. Position is found by id.
pub fn base_score<E: Scorable>(entity: &E, sequence: &[E]) -> u32 {
    let index = sequence.iter().position(|e| e.id() == entity.id());
    weighted_score(entity, sequence.len(), index)
}

/// Score `entity` against `sequence`, store the result on it and return it.
pub fn score_entity<E: Scorable>(entity: &mut E, sequence: &[E]) -> u32 {
    let score = base_score(entity, sequence);
    entity.set_score(score);
    score
}

/// Rescore every entry of a list in place using its own position.
pub fn score_all<E: Scorable>(items: &mut [E]) {
    let len = items.len();
    for (i, item) in items.iter_mut().enumerate() {
        let score = weighted_score(item, len, Some(i));
        item.set_score(score);
    }
}

/// Outcome of composing a project's priority with its goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composition {
    Linked(u32),
    /// No goal with the project's `goal_id`; `priority_score` was left alone.
    Unlinked,
}

/// Set `priority_score` to the project's own score plus its goal's score.
///
/// The first goal whose id matches wins. Both scores must be current.
pub fn compose_priority(project: &mut Project, goals: &[Goal]) -> Composition {
    match goals.iter().find(|g| g.id == project.goal_id) {
        Some(goal) => {
            project.priority_score = project.score + goal.score;
            Composition::Linked(project.priority_score)
        }
        None => Composition::Unlinked,
    }
}

/// Active projects in display order.
#[derive(Debug, Clone, Default)]
pub struct Ranking {
    /// Rescored copies of the active projects, highest priority first.
    pub entries: Vec<Project>,
    /// Ids of projects (active or not) whose goal could not be found.
    pub unlinked: Vec<String>,
}

/// Rescore goals and projects in place and compose every project's priority.
///
/// Returns the ids of projects whose goal is missing.
pub fn rescore(projects: &mut [Project], goals: &mut [Goal]) -> Vec<String> {
    score_all(goals);
    score_all(projects);

    let mut unlinked = Vec::new();
    for project in projects.iter_mut() {
        if compose_priority(project, goals) == Composition::Unlinked {
            warn!(project = %project.id, goal = %project.goal_id, "project references a missing goal");
            unlinked.push(project.id.clone());
        }
    }
    unlinked
}

/// Rank active projects by descending priority.
///
/// Works on copies; the caller's entities are not touched. Ties keep their
/// relative order from `projects`.
pub fn compute_ranking(projects: &[Project], goals: &[Goal]) -> Ranking {
    let mut goals = goals.to_vec();
    let mut projects = projects.to_vec();
    let unlinked = rescore(&mut projects, &mut goals);

    let mut entries: Vec<Project> = projects
        .into_iter()
        .filter(|p| p.status == Status::Active)
        .collect();
    entries.sort_by(|a, b| b.priority_score.cmp(&a.priority_score));

    Ranking { entries, unlinked }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::TaskStatus;
    use serde_json::Value;

    fn goal(id: &str, complexity: Rating, excitement: Rating) -> Goal {
        Goal {
            id: id.to_string(),
            description: format!("goal {id}"),
            motivation: String::new(),
            status: Status::Active,
            complexity,
            excitement,
            color: "#075985".into(),
            score: 0,
            owner_id: None,
            created_at_utc: 0,
            updated_at_utc: 0,
        }
    }

    fn project(id: &str, goal_id: &str, complexity: Rating, excitement: Rating) -> Project {
        Project {
            id: id.to_string(),
            description: format!("project {id}"),
            motivation: String::new(),
            status: Status::Active,
            complexity,
            excitement,
            timeframe: None,
            goal_id: goal_id.to_string(),
            tasks: Vec::new(),
            score: 0,
            priority_score: 0,
            owner_id: None,
            created_at_utc: 0,
            updated_at_utc: 0,
        }
    }

    #[test]
    fn test_positional_importance() {
        assert_eq!(positional_importance(3, Some(0)), 3);
        assert_eq!(positional_importance(3, Some(2)), 1);
        assert_eq!(positional_importance(3, None), 0);
        assert_eq!(positional_importance(3, Some(7)), 0);
        assert_eq!(positional_importance(0, None), 0);
    }

    #[test]
    fn test_score_entity_formula_holds_for_every_position() {
        let ratings = [Rating::Low, Rating::Medium, Rating::High, Rating::Unrated(Value::Null)];
        let goals: Vec<Goal> = ratings
            .iter()
            .enumerate()
            .map(|(i, r)| goal(&format!("g{i}"), r.clone(), ratings[(i + 1) % 4].clone()))
            .collect();
        for (i, g) in goals.iter().enumerate() {
            let mut g = g.clone();
            let expected = g.complexity.weight() + g.excitement.weight() + (goals.len() - i) as u32;
            assert_eq!(score_entity(&mut g, &goals), expected);
            assert_eq!(g.score, expected);
        }
    }

    #[test]
    fn test_score_entity_not_in_sequence_has_no_importance() {
        let goals = vec![goal("a", Rating::Low, Rating::Low)];
        let mut stranger = goal("zzz", Rating::High, Rating::High);
        assert_eq!(score_entity(&mut stranger, &goals), 6);
    }

    #[test]
    fn test_single_goal_single_project_scenario() {
        let goals = vec![goal("g1", Rating::High, Rating::High)];
        let projects = vec![project("p1", "g1", Rating::Low, Rating::Low)];

        let ranking = compute_ranking(&projects, &goals);
        assert_eq!(ranking.entries.len(), 1);
        let p1 = &ranking.entries[0];
        assert_eq!(p1.score, 3);
        assert_eq!(p1.priority_score, 10);
        assert!(ranking.unlinked.is_empty());
    }

    #[test]
    fn test_compose_assigns_without_accumulating() {
        let goals = vec![Goal { score: 7, ..goal("g1", Rating::High, Rating::High) }];
        let mut p = Project { score: 3, ..project("p1", "g1", Rating::Low, Rating::Low) };

        assert_eq!(compose_priority(&mut p, &goals), Composition::Linked(10));
        assert_eq!(compose_priority(&mut p, &goals), Composition::Linked(10));
        assert_eq!(p.score, 3);
        assert_eq!(p.priority_score, 10);
    }

    #[test]
    fn test_compose_uses_first_matching_goal() {
        let goals = vec![
            Goal { score: 4, ..goal("dup", Rating::Low, Rating::Low) },
            Goal { score: 9, ..goal("dup", Rating::High, Rating::High) },
        ];
        let mut p = Project { score: 1, ..project("p1", "dup", Rating::Low, Rating::Low) };
        assert_eq!(compose_priority(&mut p, &goals), Composition::Linked(5));
    }

    #[test]
    fn test_dangling_goal_leaves_priority_untouched() {
        let goals = vec![goal("g1", Rating::High, Rating::High)];
        let projects = vec![Project {
            priority_score: 0,
            ..project("p1", "missing", Rating::High, Rating::High)
        }];

        let ranking = compute_ranking(&projects, &goals);
        assert_eq!(ranking.entries[0].priority_score, 0);
        assert_eq!(ranking.unlinked, vec!["p1".to_string()]);

        let stale = vec![Project { priority_score: 42, ..projects[0].clone() }];
        let ranking = compute_ranking(&stale, &goals);
        assert_eq!(ranking.entries[0].priority_score, 42);
    }

    #[test]
    fn test_ranking_excludes_inactive_and_sorts_descending() {
        // The completed project would outrank both active ones.
        let goals = vec![
            goal("big", Rating::High, Rating::High),
            goal("small", Rating::Low, Rating::Low),
        ];
        let projects = vec![
            Project { status: Status::Completed, ..project("p3", "big", Rating::High, Rating::High) },
            project("p1", "small", Rating::Low, Rating::Low),
            project("p2", "big", Rating::High, Rating::Medium),
        ];

        let ranking = compute_ranking(&projects, &goals);
        let ids: Vec<&str> = ranking.entries.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p2", "p1"]);
        assert!(ranking.entries.iter().all(|p| p.status == Status::Active));
        // big: 3+3+2 = 8, small: 1+1+1 = 3
        // p1: 1+1+2 = 4 (+3) = 7, p2: 3+2+1 = 6 (+8) = 14
        assert_eq!(ranking.entries[0].priority_score, 14);
        assert_eq!(ranking.entries[1].priority_score, 7);
    }

    #[test]
    fn test_ranking_is_stable_for_ties() {
        let goals = vec![goal("g", Rating::Medium, Rating::Medium)];
        // Each later project gains one weight point back from its lost position.
        let projects = vec![
            project("a", "g", Rating::Low, Rating::Low),
            project("b", "g", Rating::Low, Rating::Medium),
            project("c", "g", Rating::Medium, Rating::Medium),
        ];
        let ranking = compute_ranking(&projects, &goals);
        let scores: Vec<u32> = ranking.entries.iter().map(|p| p.priority_score).collect();
        assert_eq!(scores, vec![10, 10, 10]);
        let ids: Vec<&str> = ranking.entries.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_ranking_is_idempotent_and_does_not_touch_inputs() {
        let goals = vec![goal("g1", Rating::High, Rating::Low)];
        let projects = vec![
            project("p1", "g1", Rating::Low, Rating::High),
            project("p2", "g1", Rating::Medium, Rating::High),
        ];

        let first = compute_ranking(&projects, &goals);
        let second = compute_ranking(&projects, &goals);
        let firsts: Vec<u32> = first.entries.iter().map(|p| p.priority_score).collect();
        let seconds: Vec<u32> = second.entries.iter().map(|p| p.priority_score).collect();
        assert_eq!(firsts, seconds);
        assert!(projects.iter().all(|p| p.score == 0 && p.priority_score == 0));
        assert_eq!(goals[0].score, 0);
    }

    #[test]
    fn test_rescore_writes_back_into_lists() {
        let mut goals = vec![goal("g1", Rating::High, Rating::High)];
        let mut projects = vec![project("p1", "g1", Rating::Low, Rating::Low)];
        projects[0].tasks.push(crate::task::Task {
            id: "t1".into(),
            description: "write it".into(),
            status: TaskStatus::Active,
            project_id: "p1".into(),
        });

        let unlinked = rescore(&mut projects, &mut goals);
        assert!(unlinked.is_empty());
        assert_eq!(goals[0].score, 7);
        assert_eq!(projects[0].score, 3);
        assert_eq!(projects[0].priority_score, 10);

        rescore(&mut projects, &mut goals);
        assert_eq!(projects[0].priority_score, 10);
    }
}
