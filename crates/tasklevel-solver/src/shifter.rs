//! Greedy nearest-slot task shifting
//!
//! Probes start offsets of growing magnitude in the configured direction and
//! applies the first one that keeps every dependency link and date
//! constraint intact while moving the task off the days it was overloading.
//!
//! The search is greedy and local: it never checks resource load at the new
//! location. The leveling loop re-detects conflicts after every shift.

use crate::dag::{DependencyEdge, DependencyGraph};
use crate::eligibility::ShiftCandidate;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use tasklevel_core::{DependencyType, LevelingConfig, Task, TaskId};
use tracing::trace;

/// Outcome of a shift attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShiftResult {
    pub success: bool,
    pub task_id: TaskId,
    pub original_start: NaiveDate,
    pub original_end: NaiveDate,
    pub new_start: NaiveDate,
    pub new_end: NaiveDate,
    /// Signed offset in days (zero when nothing moved)
    pub shift_days: i64,
}

/// `date + days`, `None` on calendar overflow
pub fn offset_date(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    chrono::Duration::try_days(days).and_then(|d| date.checked_add_signed(d))
}

/// Try to move the task at `index` off `blocked_dates`.
///
/// On success the task's dates are updated in place; on failure it is left
/// untouched.
pub fn shift_task(
    index: usize,
    tasks: &mut [Task],
    graph: &DependencyGraph,
    candidate: &ShiftCandidate,
    blocked_dates: &BTreeSet<NaiveDate>,
    config: &LevelingConfig,
) -> ShiftResult {
    let task = &tasks[index];
    let original_start = task.start;
    let original_end = task.end;

    let mut result = ShiftResult {
        success: false,
        task_id: task.id.clone(),
        original_start,
        original_end,
        new_start: original_start,
        new_end: original_end,
        shift_days: 0,
    };

    let found = find_slot(index, tasks, graph, candidate, blocked_dates, config);

    if let Some((offset, start, end)) = found {
        let task = &mut tasks[index];
        task.start = start;
        task.end = end;

        result.success = true;
        result.new_start = start;
        result.new_end = end;
        result.shift_days = offset;
    }

    result
}

/// Nearest `(offset, start, end)` that clears `blocked_dates` and passes
/// [`is_slot_available`]
fn find_slot(
    index: usize,
    tasks: &[Task],
    graph: &DependencyGraph,
    candidate: &ShiftCandidate,
    blocked_dates: &BTreeSet<NaiveDate>,
    config: &LevelingConfig,
) -> Option<(i64, NaiveDate, NaiveDate)> {
    let task = &tasks[index];
    let span = task.duration_days() - 1;
    let sign = candidate.direction.sign();

    (1..=candidate.max_shift_days)
        .map(|magnitude| magnitude * sign)
        .find_map(|offset| {
            let start = offset_date(task.start, offset)?;
            let end = offset_date(start, span)?;
            if !clears_dates(start, end, blocked_dates) {
                return None;
            }
            if !is_slot_available(index, start, tasks, graph, config) {
                trace!(task = %task.id, offset, "slot rejected");
                return None;
            }
            Some((offset, start, end))
        })
}

/// Whether `start..=end` avoids every date in `blocked`
pub fn clears_dates(start: NaiveDate, end: NaiveDate, blocked: &BTreeSet<NaiveDate>) -> bool {
    blocked.range(start..=end).next().is_none()
}

/// Whether the task at `index` could start on `candidate_start` without
/// breaking a dependency link or a date constraint.
///
/// Links and constraints are only enforced when the corresponding
/// `respect_*` flag is set. Resource load is not considered.
pub fn is_slot_available(
    index: usize,
    candidate_start: NaiveDate,
    tasks: &[Task],
    graph: &DependencyGraph,
    config: &LevelingConfig,
) -> bool {
    let task = &tasks[index];
    let Some(candidate_end) = offset_date(candidate_start, task.duration_days() - 1) else {
        return false;
    };

    if config.respect_dependencies {
        for edge in graph.predecessors(index) {
            let pred = &tasks[edge.from];
            if !predecessor_allows(pred, edge, candidate_start, candidate_end) {
                return false;
            }
        }
        for edge in graph.successors(index) {
            let succ = &tasks[edge.to];
            if !successor_allows(succ, edge, candidate_start, candidate_end) {
                return false;
            }
        }
    }

    if config.respect_constraints {
        if let Some(constraint) = task.constraint {
            if !constraint.is_satisfied_by(candidate_start, candidate_end) {
                return false;
            }
        }
    }

    true
}

/// Link check with the candidate as successor
fn predecessor_allows(pred: &Task, edge: &DependencyEdge, start: NaiveDate, end: NaiveDate) -> bool {
    let lagged = |d: NaiveDate| offset_date(d, edge.lag_days);
    match edge.dep_type {
        DependencyType::FinishToStart => lagged(pred.end).map_or(false, |d| d < start),
        DependencyType::StartToStart => lagged(pred.start).map_or(false, |d| d <= start),
        DependencyType::FinishToFinish => lagged(pred.end).map_or(false, |d| d <= end),
        DependencyType::StartToFinish => lagged(pred.start).map_or(false, |d| d <= end),
    }
}

/// Link check with the candidate as predecessor
fn successor_allows(succ: &Task, edge: &DependencyEdge, start: NaiveDate, end: NaiveDate) -> bool {
    let lagged = |d: NaiveDate| edge.lag_days.checked_neg().and_then(|lag| offset_date(d, lag));
    match edge.dep_type {
        DependencyType::FinishToStart => lagged(succ.start).map_or(false, |d| end < d),
        DependencyType::StartToStart => lagged(succ.start).map_or(false, |d| start <= d),
        DependencyType::FinishToFinish => lagged(succ.end).map_or(false, |d| end <= d),
        DependencyType::StartToFinish => lagged(succ.end).map_or(false, |d| start <= d),
    }
}
