//! Iterative resource leveling
//!
//! Repeatedly detects conflicts, picks the cheapest task to disturb and moves
//! it to the nearest slot that clears the days it was overloading, until no
//! conflict remains or the iteration budget runs out.
//!
//! The run mutates only `start`/`end` of the caller's tasks. A deep copy of
//! the tasks is taken before the first shift and returned in the result,
//! together with a bounded history that [`crate::history::undo`] can replay
//! backwards.

use crate::allocation::compute_allocations;
use crate::conflicts::{conflict_dates_for, detect_conflicts, Conflict};
use crate::dag::DependencyGraph;
use crate::eligibility::rank_shift_candidates;
use crate::history::{History, HistoryEntry};
use crate::shifter::shift_task;
use serde::Serialize;
use std::collections::BTreeSet;
use tasklevel_core::{LevelingConfig, LevelingError, Resource, Task, TaskId};
use tracing::{debug, info};

/// How a leveling run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelingOutcome {
    /// No conflicts remain
    Converged,
    /// Conflicts remain but none of their tasks is eligible to move
    Stalled,
    /// `max_iterations` reached with conflicts left
    Exhausted,
    /// Stopped by the caller's checkpoint
    Cancelled,
}

impl std::fmt::Display for LevelingOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LevelingOutcome::Converged => "converged",
            LevelingOutcome::Stalled => "stalled",
            LevelingOutcome::Exhausted => "exhausted",
            LevelingOutcome::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Counters for a leveling run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LevelingSummary {
    /// Distinct tasks moved at least once
    pub tasks_shifted: usize,
    /// Successful shifts, including ones evicted from the history
    pub shifts_applied: usize,
    /// Conflicts at the start minus conflicts at the end (saturating)
    pub conflicts_resolved: usize,
    pub conflicts_remaining: usize,
}

/// Result of resource leveling
#[derive(Debug, Clone, Serialize)]
pub struct LevelingResult {
    /// `true` iff no conflicts remain
    pub success: bool,
    pub outcome: LevelingOutcome,
    pub iterations: usize,
    /// Applied shifts, oldest first, at most `max_undo_steps` long
    pub history: Vec<HistoryEntry>,
    pub remaining_conflicts: Vec<Conflict>,
    /// Tasks as they were before leveling
    pub original_tasks: Vec<Task>,
    /// Tasks after leveling
    pub final_tasks: Vec<Task>,
    pub summary: LevelingSummary,
}

impl LevelingResult {
    /// IDs of tasks whose dates differ from the snapshot
    pub fn moved_tasks(&self) -> Vec<&TaskId> {
        self.final_tasks
            .iter()
            .zip(&self.original_tasks)
            .filter(|(after, before)| after.start != before.start || after.end != before.end)
            .map(|(after, _)| &after.id)
            .collect()
    }
}

/// Level `tasks` against `resources`.
///
/// Returns [`LevelingError::InvalidConfig`] without touching the tasks when
/// the configuration is rejected. Partial convergence is not an error; check
/// [`LevelingResult::success`] and [`LevelingResult::outcome`].
pub fn level(
    tasks: &mut [Task],
    resources: &[Resource],
    config: &LevelingConfig,
) -> Result<LevelingResult, LevelingError> {
    level_with_checkpoint(tasks, resources, config, |_| true)
}

/// Level with a checkpoint consulted before every iteration.
///
/// The checkpoint receives the number of iterations completed so far and
/// returns `false` to stop. A cancelled run keeps the shifts already applied.
pub fn level_with_checkpoint<F>(
    tasks: &mut [Task],
    resources: &[Resource],
    config: &LevelingConfig,
    mut checkpoint: F,
) -> Result<LevelingResult, LevelingError>
where
    F: FnMut(usize) -> bool,
{
    config.validate().map_err(LevelingError::InvalidConfig)?;

    let original_tasks = tasks.to_vec();
    let graph = DependencyGraph::build(tasks);
    let mut history = History::new(config.max_undo_steps);
    let mut shifted: BTreeSet<TaskId> = BTreeSet::new();
    let mut shifts_applied = 0;
    let mut failed_attempts = 0;

    let initial_conflicts = current_conflicts(tasks, resources, config).len();
    info!(
        tasks = tasks.len(),
        resources = resources.len(),
        conflicts = initial_conflicts,
        strategy = %config.strategy,
        "leveling started"
    );

    let mut iterations = 0;
    let mut outcome = LevelingOutcome::Exhausted;

    while iterations < config.max_iterations {
        if !checkpoint(iterations) {
            outcome = LevelingOutcome::Cancelled;
            break;
        }
        iterations += 1;

        let conflicts = current_conflicts(tasks, resources, config);
        if conflicts.is_empty() {
            outcome = LevelingOutcome::Converged;
            break;
        }

        let candidates = rank_shift_candidates(tasks, &graph, &conflicts, config);
        let Some(candidate) = candidates.first() else {
            debug!(iteration = iterations, conflicts = conflicts.len(), "no shiftable task");
            outcome = LevelingOutcome::Stalled;
            break;
        };

        let blocked = conflict_dates_for(&conflicts, &candidate.task_id);
        let shift = shift_task(candidate.index, tasks, &graph, candidate, &blocked, config);

        if !shift.success {
            // A failed attempt still uses up its iteration
            debug!(
                iteration = iterations,
                task = %candidate.task_id,
                window = candidate.max_shift_days,
                "no slot found"
            );
            failed_attempts += 1;
            continue;
        }

        debug!(
            iteration = iterations,
            task = %shift.task_id,
            from = %shift.original_start,
            to = %shift.new_start,
            days = shift.shift_days,
            "task shifted"
        );

        let task_name = tasks[candidate.index].name.clone();
        if let Some(evicted) = history.push(HistoryEntry::from_shift(&shift, task_name, iterations)) {
            debug!(task = %evicted.task_id, iteration = evicted.iteration, "history entry evicted");
        }
        shifted.insert(shift.task_id);
        shifts_applied += 1;
    }

    let remaining_conflicts = current_conflicts(tasks, resources, config);
    if outcome == LevelingOutcome::Exhausted && remaining_conflicts.is_empty() {
        outcome = LevelingOutcome::Converged;
    }

    let summary = LevelingSummary {
        tasks_shifted: shifted.len(),
        shifts_applied,
        conflicts_resolved: initial_conflicts.saturating_sub(remaining_conflicts.len()),
        conflicts_remaining: remaining_conflicts.len(),
    };

    info!(
        %outcome,
        iterations,
        shifts = shifts_applied,
        failed = failed_attempts,
        remaining = remaining_conflicts.len(),
        "leveling finished"
    );

    Ok(LevelingResult {
        success: remaining_conflicts.is_empty(),
        outcome,
        iterations,
        history: history.to_vec(),
        remaining_conflicts,
        original_tasks,
        final_tasks: tasks.to_vec(),
        summary,
    })
}

fn current_conflicts(tasks: &[Task], resources: &[Resource], config: &LevelingConfig) -> Vec<Conflict> {
    let table = compute_allocations(tasks, resources, config);
    detect_conflicts(&table, resources, config)
}
