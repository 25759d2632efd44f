//! Shift eligibility and candidate ranking
//!
//! Decides which tasks implicated in a conflict may move, how far, and in
//! which order. Lower priority scores move first: non-critical, high-float,
//! short, not-yet-started work is the cheapest to disturb.

use crate::conflicts::Conflict;
use crate::dag::DependencyGraph;
use serde::Serialize;
use std::collections::BTreeSet;
use tasklevel_core::{LevelingConfig, LevelingStrategy, Task, TaskConstraint, TaskId};
use tracing::trace;

/// Direction of a shift
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftDirection {
    Forward,
    Backward,
}

impl ShiftDirection {
    /// Sign applied to probe offsets
    pub fn sign(self) -> i64 {
        match self {
            ShiftDirection::Forward => 1,
            ShiftDirection::Backward => -1,
        }
    }
}

impl From<LevelingStrategy> for ShiftDirection {
    fn from(strategy: LevelingStrategy) -> Self {
        match strategy {
            LevelingStrategy::Forward => ShiftDirection::Forward,
            LevelingStrategy::Backward => ShiftDirection::Backward,
        }
    }
}

/// Why a task may not be shifted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Ineligibility {
    /// Critical with no float left
    CriticalWithoutFloat,
    /// Moving it would push a critical successor
    CriticalSuccessor(TaskId),
    /// Pinned by a must-start/must-finish constraint
    PinnedConstraint(TaskConstraint),
    /// Float or configuration leave no room to move
    NoShiftWindow,
}

impl std::fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ineligibility::CriticalWithoutFloat => write!(f, "critical with no float"),
            Ineligibility::CriticalSuccessor(id) => write!(f, "successor '{}' is critical", id),
            Ineligibility::PinnedConstraint(c) => write!(f, "pinned by {:?}", c),
            Ineligibility::NoShiftWindow => write!(f, "no shift window"),
        }
    }
}

/// Eligibility assessment for one task
#[derive(Debug, Clone, PartialEq)]
pub struct Eligibility {
    /// `None` when the task may move
    pub blocked_by: Option<Ineligibility>,
    /// Lower = shifted first
    pub priority: f64,
    /// `min(config.max_shift_days, total_float)`
    pub max_shift_days: i64,
}

impl Eligibility {
    pub fn can_shift(&self) -> bool {
        self.blocked_by.is_none()
    }
}

/// A task selected for shifting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShiftCandidate {
    pub task_id: TaskId,
    /// Arena index of the task
    #[serde(skip)]
    pub index: usize,
    pub priority: f64,
    pub direction: ShiftDirection,
    pub max_shift_days: i64,
}

/// Priority score of a task (lower = shifted first).
///
/// `criticality + max(0, 10 - float) / 10 + 1 / duration + progress / 100`
pub fn priority_score(task: &Task, config: &LevelingConfig) -> f64 {
    let criticality = if task.is_critical {
        config.critical_path_priority
    } else {
        config.non_critical_path_priority
    };
    let float = 10i64.saturating_sub(task.total_float).max(0) as f64 / 10.0;
    let duration = 1.0 / task.duration_days() as f64;
    let progress = task.effective_progress() / 100.0;

    criticality + float + duration + progress
}

/// Assess whether the task at `index` may be shifted
pub fn assess(
    index: usize,
    tasks: &[Task],
    graph: &DependencyGraph,
    config: &LevelingConfig,
) -> Eligibility {
    let task = &tasks[index];
    let max_shift_days = config.max_shift_days.min(task.total_float);

    Eligibility {
        blocked_by: blocking_reason(index, tasks, graph, config, max_shift_days),
        priority: priority_score(task, config),
        max_shift_days,
    }
}

fn blocking_reason(
    index: usize,
    tasks: &[Task],
    graph: &DependencyGraph,
    config: &LevelingConfig,
    max_shift_days: i64,
) -> Option<Ineligibility> {
    let task = &tasks[index];

    if task.is_critical && task.total_float <= 0 {
        return Some(Ineligibility::CriticalWithoutFloat);
    }

    if config.respect_dependencies {
        if let Some(succ) = graph
            .successors(index)
            .map(|e| &tasks[e.to])
            .find(|s| s.is_critical)
        {
            return Some(Ineligibility::CriticalSuccessor(succ.id.clone()));
        }
    }

    if config.respect_constraints {
        if let Some(constraint) = task.constraint.filter(TaskConstraint::is_pinned) {
            return Some(Ineligibility::PinnedConstraint(constraint));
        }
    }

    if max_shift_days <= 0 {
        return Some(Ineligibility::NoShiftWindow);
    }

    None
}

/// Rank the shiftable tasks implicated in `conflicts`.
///
/// Only tasks that contribute to at least one conflict are considered, and
/// IDs shared by several tasks are never picked.
/// Candidates are ordered by ascending priority, ties by task ID.
pub fn rank_shift_candidates(
    tasks: &[Task],
    graph: &DependencyGraph,
    conflicts: &[Conflict],
    config: &LevelingConfig,
) -> Vec<ShiftCandidate> {
    let implicated: BTreeSet<&str> = conflicts
        .iter()
        .flat_map(|c| c.contributors.iter().map(|t| t.task_id.as_str()))
        .collect();

    let direction = ShiftDirection::from(config.strategy);

    let mut candidates: Vec<ShiftCandidate> = implicated
        .into_iter()
        .filter_map(|task_id| {
            if graph.is_ambiguous(task_id) {
                trace!(task = task_id, "duplicate task id, not shiftable");
                return None;
            }
            let index = graph.index_of(task_id)?;
            let eligibility = assess(index, tasks, graph, config);
            if let Some(reason) = &eligibility.blocked_by {
                trace!(task = task_id, %reason, "not shiftable");
                return None;
            }
            Some(ShiftCandidate {
                task_id: task_id.to_string(),
                index,
                priority: eligibility.priority,
                direction,
                max_shift_days: eligibility.max_shift_days,
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        a.priority
            .total_cmp(&b.priority)
            .then_with(|| a.task_id.cmp(&b.task_id))
    });

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::compute_allocations;
    use crate::conflicts::detect_conflicts;
    use chrono::NaiveDate;
    use tasklevel_core::Resource;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn five_day(id: &str) -> Task {
        Task::new(id, date(6), date(10)).effort(40.0).assign("dev")
    }

    fn rank(tasks: &[Task], config: &LevelingConfig) -> Vec<ShiftCandidate> {
        let resources = vec![Resource::new("dev").capacity(8.0)];
        let table = compute_allocations(tasks, &resources, config);
        let conflicts = detect_conflicts(&table, &resources, config);
        let graph = DependencyGraph::build(tasks);
        rank_shift_candidates(tasks, &graph, &conflicts, config)
    }

    #[test]
    fn priority_formula() {
        let config = LevelingConfig::default();

        // 0.5 + 0.5 + 0.2 + 0.0
        let task = five_day("a").float(5);
        assert!((priority_score(&task, &config) - 1.2).abs() < 1e-12);

        // 1.0 + 1.0 + 1.0 + 0.5
        let critical = Task::new("c", date(6), date(6)).critical().progress(50.0);
        assert!((priority_score(&critical, &config) - 3.5).abs() < 1e-12);

        // float beyond ten contributes nothing
        let loose = five_day("l").float(25);
        assert!((priority_score(&loose, &config) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn critical_without_float_is_blocked() {
        let tasks = vec![five_day("a").critical()];
        let graph = DependencyGraph::build(&tasks);
        let eligibility = assess(0, &tasks, &graph, &LevelingConfig::default());

        assert!(!eligibility.can_shift());
        assert_eq!(eligibility.blocked_by, Some(Ineligibility::CriticalWithoutFloat));
    }

    #[test]
    fn critical_successor_blocks_only_when_respecting_dependencies() {
        let tasks = vec![
            five_day("a").float(5),
            Task::new("b", date(13), date(14)).critical().depends_on("a"),
        ];
        let graph = DependencyGraph::build(&tasks);

        let strict = assess(0, &tasks, &graph, &LevelingConfig::default());
        assert_eq!(
            strict.blocked_by,
            Some(Ineligibility::CriticalSuccessor("b".into()))
        );

        let mut relaxed = LevelingConfig::default();
        relaxed.respect_dependencies = false;
        assert!(assess(0, &tasks, &graph, &relaxed).can_shift());
    }

    #[test]
    fn pinned_constraint_blocks_only_when_respecting_constraints() {
        let tasks = vec![five_day("a")
            .float(5)
            .constraint(TaskConstraint::MustStartOn(date(6)))];
        let graph = DependencyGraph::build(&tasks);

        let strict = assess(0, &tasks, &graph, &LevelingConfig::default());
        assert!(matches!(
            strict.blocked_by,
            Some(Ineligibility::PinnedConstraint(TaskConstraint::MustStartOn(_)))
        ));

        let mut relaxed = LevelingConfig::default();
        relaxed.respect_constraints = false;
        assert!(assess(0, &tasks, &graph, &relaxed).can_shift());
    }

    #[test]
    fn window_is_bounded_by_float_and_config() {
        let tasks = vec![five_day("a").float(5), five_day("b").float(50), five_day("c")];
        let graph = DependencyGraph::build(&tasks);
        let config = LevelingConfig::default();

        assert_eq!(assess(0, &tasks, &graph, &config).max_shift_days, 5);
        assert_eq!(assess(1, &tasks, &graph, &config).max_shift_days, 30);

        let zero = assess(2, &tasks, &graph, &config);
        assert_eq!(zero.max_shift_days, 0);
        assert_eq!(zero.blocked_by, Some(Ineligibility::NoShiftWindow));
    }

    #[test]
    fn candidates_sorted_by_priority() {
        let tasks = vec![
            five_day("tight").float(1),
            five_day("loose").float(9),
            five_day("started").float(9).progress(50.0),
        ];
        let ranked = rank(&tasks, &LevelingConfig::default());
        let order: Vec<&str> = ranked.iter().map(|c| c.task_id.as_str()).collect();

        assert_eq!(order, vec!["loose", "started", "tight"]);
        assert!(ranked.iter().all(|c| c.direction == ShiftDirection::Forward));
    }

    #[test]
    fn ties_break_by_task_id() {
        let tasks = vec![five_day("b").float(5), five_day("a").float(5)];
        let ranked = rank(&tasks, &LevelingConfig::default());
        assert_eq!(ranked[0].task_id, "a");
        assert_eq!(ranked[0].index, 1);
    }

    #[test]
    fn only_implicated_tasks_are_candidates() {
        let tasks = vec![
            five_day("a").float(5),
            five_day("b").float(5),
            Task::new("elsewhere", date(20), date(21)).effort(8.0).assign("dev").float(5),
        ];
        let ranked = rank(&tasks, &LevelingConfig::default());
        assert!(ranked.iter().all(|c| c.task_id != "elsewhere"));
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn backward_strategy_sets_direction() {
        let tasks = vec![five_day("a").float(5), five_day("b").float(5)];
        let config = LevelingConfig::default().strategy(LevelingStrategy::Backward);
        let ranked = rank(&tasks, &config);
        assert!(ranked.iter().all(|c| c.direction == ShiftDirection::Backward));
        assert_eq!(ShiftDirection::Backward.sign(), -1);
    }

    #[test]
    fn shared_ids_are_never_ranked() {
        let tasks = vec![
            Task::new("dup", date(20), date(21)).effort(8.0).assign("dev").float(5),
            five_day("a").float(5),
            five_day("dup").float(5),
        ];
        let ranked = rank(&tasks, &LevelingConfig::default());
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].task_id, "a");
        assert_eq!(ranked[0].index, 1);
    }
}
