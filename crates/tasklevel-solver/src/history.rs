//! Leveling history and undo
//!
//! Every applied shift is recorded as a [`HistoryEntry`]. The log is bounded:
//! once it holds `max_undo_steps` entries, pushing another drops the oldest.
//!
//! Undo never re-runs the leveler. It writes each entry's original dates
//! straight back onto the task, newest entry first, so shifting the same task
//! twice and undoing both lands it on its pre-leveling dates.
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use tasklevel_core::Task;
//! use tasklevel_solver::history::{undo, HistoryEntry};
//!
//! let d = |day| NaiveDate::from_ymd_opt(2025, 1, day).unwrap();
//! let mut tasks = vec![Task::new("a", d(8), d(10))];
//! let history = vec![HistoryEntry {
//!     task_id: "a".into(),
//!     task_name: "a".into(),
//!     original_start: d(6),
//!     original_end: d(8),
//!     new_start: d(8),
//!     new_end: d(10),
//!     shift_days: 2,
//!     iteration: 1,
//! }];
//!
//! let result = undo(&history, &mut tasks, 1);
//! assert!(result.success);
//! assert_eq!(tasks[0].start, d(6));
//! assert!(result.remaining_history.is_empty());
//! ```

use crate::shifter::ShiftResult;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tasklevel_core::{Task, TaskId};
use tracing::debug;

/// One applied shift
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub task_id: TaskId,
    pub task_name: String,
    pub original_start: NaiveDate,
    pub original_end: NaiveDate,
    pub new_start: NaiveDate,
    pub new_end: NaiveDate,
    /// Signed offset in days
    pub shift_days: i64,
    /// Leveling iteration that applied the shift (1-based)
    pub iteration: usize,
}

impl HistoryEntry {
    /// Record a successful shift
    pub fn from_shift(shift: &ShiftResult, task_name: impl Into<String>, iteration: usize) -> Self {
        Self {
            task_id: shift.task_id.clone(),
            task_name: task_name.into(),
            original_start: shift.original_start,
            original_end: shift.original_end,
            new_start: shift.new_start,
            new_end: shift.new_end,
            shift_days: shift.shift_days,
            iteration,
        }
    }
}

/// Bounded, ordered log of shifts (oldest first)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl History {
    /// Empty history holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Rebuild a history from entries, keeping the newest `capacity`
    pub fn from_entries(entries: impl IntoIterator<Item = HistoryEntry>, capacity: usize) -> Self {
        let mut history = Self::new(capacity);
        for entry in entries {
            history.push(entry);
        }
        history
    }

    /// Append an entry, returning the evicted oldest entry if the log was full
    pub fn push(&mut self, entry: HistoryEntry) -> Option<HistoryEntry> {
        if self.capacity == 0 {
            return Some(entry);
        }
        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(entry);
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> + '_ {
        self.entries.iter()
    }

    /// Most recent entry
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    /// Copy of the entries, oldest first
    pub fn to_vec(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Undo the newest `steps` entries and drop them from the log
    pub fn undo(&mut self, tasks: &mut [Task], steps: usize) -> UndoResult {
        let entries = self.to_vec();
        let result = undo(&entries, tasks, steps);
        self.entries = result.remaining_history.iter().cloned().collect();
        result
    }

    /// Restore every task from `snapshot` and clear the log
    pub fn reset(&mut self, snapshot: &[Task], tasks: &mut [Task]) {
        reset(snapshot, tasks);
        self.clear();
    }
}

/// Outcome of an undo
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UndoResult {
    /// Every requested step was undone and every task was found
    pub success: bool,
    /// Entries that were reverted, newest first
    pub undone_entries: Vec<HistoryEntry>,
    /// What is left of the log, oldest first
    pub remaining_history: Vec<HistoryEntry>,
}

/// Revert the newest `steps` entries of `history` onto `tasks`.
///
/// Asking for more steps than recorded undoes everything and reports
/// `success = false`. Entries naming a task that is not in `tasks` are
/// skipped and also make the result unsuccessful.
pub fn undo(history: &[HistoryEntry], tasks: &mut [Task], steps: usize) -> UndoResult {
    let count = steps.min(history.len());
    let split = history.len() - count;
    let mut success = steps <= history.len();

    let mut undone_entries = Vec::with_capacity(count);
    for entry in history[split..].iter().rev() {
        match tasks.iter_mut().find(|t| t.id == entry.task_id) {
            Some(task) => {
                task.start = entry.original_start;
                task.end = entry.original_end;
            }
            None => {
                debug!(task = %entry.task_id, "undo skipped unknown task");
                success = false;
            }
        }
        undone_entries.push(entry.clone());
    }

    UndoResult {
        success,
        undone_entries,
        remaining_history: history[..split].to_vec(),
    }
}

/// Restore every task's dates from a pre-leveling snapshot.
///
/// Tasks are matched by ID; tasks missing from the snapshot keep their dates.
pub fn reset(snapshot: &[Task], tasks: &mut [Task]) {
    for task in tasks.iter_mut() {
        if let Some(original) = snapshot.iter().find(|s| s.id == task.id) {
            task.start = original.start;
            task.end = original.end;
        }
    }
}
