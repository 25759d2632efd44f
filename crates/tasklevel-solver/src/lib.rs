//! # tasklevel-solver
//!
//! Resource leveling for already-scheduled task sets.
//!
//! This crate provides:
//! - Daily allocation tables per resource
//! - Overallocation detection and severity ranking
//! - Shift eligibility and candidate priority
//! - Greedy nearest-slot task shifting that honours dependencies and constraints
//! - Bounded shift history with undo and reset
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use tasklevel_core::{LevelingConfig, Resource, Task};
//! use tasklevel_solver::ResourceLeveler;
//!
//! let d = |day| NaiveDate::from_ymd_opt(2025, 1, day).unwrap();
//! let resources = vec![Resource::new("dev").capacity(8.0)];
//! let mut tasks = vec![
//!     Task::new("a", d(1), d(5)).effort(40.0).assign("dev").float(5),
//!     Task::new("b", d(1), d(5)).effort(40.0).assign("dev").float(5),
//! ];
//!
//! let leveler = ResourceLeveler::new(LevelingConfig::default().max_shift_days(10));
//! assert_eq!(leveler.detect(&tasks, &resources).len(), 5);
//!
//! let result = leveler.level(&mut tasks, &resources).unwrap();
//! assert!(result.success);
//! assert_eq!(tasks[0].start, d(6));
//! ```

pub mod allocation;
pub mod conflicts;
pub mod dag;
pub mod eligibility;
pub mod history;
pub mod leveling;
pub mod shifter;

pub use allocation::{
    calculate_utilization, compute_allocations, AllocationTable, DailyAllocation,
    ResourceUtilization, UtilizationSummary,
};
pub use conflicts::{conflict_periods, detect_conflicts, Conflict, ConflictPeriod};
pub use eligibility::{rank_shift_candidates, ShiftCandidate, ShiftDirection};
pub use history::{reset, undo, History, HistoryEntry, UndoResult};
pub use leveling::{level, level_with_checkpoint, LevelingOutcome, LevelingResult, LevelingSummary};
pub use shifter::{is_slot_available, shift_task, ShiftResult};

use tasklevel_core::{LevelingConfig, LevelingError, Resource, Task};

/// Leveling engine bound to one configuration
#[derive(Debug, Clone, Default)]
pub struct ResourceLeveler {
    pub config: LevelingConfig,
}

impl ResourceLeveler {
    pub fn new(config: LevelingConfig) -> Self {
        Self { config }
    }

    /// Current conflicts, worst first
    pub fn detect(&self, tasks: &[Task], resources: &[Resource]) -> Vec<Conflict> {
        let table = compute_allocations(tasks, resources, &self.config);
        detect_conflicts(&table, resources, &self.config)
    }

    /// Utilisation per resource over the schedule window
    pub fn utilization(&self, tasks: &[Task], resources: &[Resource]) -> UtilizationSummary {
        let table = compute_allocations(tasks, resources, &self.config);
        calculate_utilization(&table, tasks)
    }

    pub fn level(
        &self,
        tasks: &mut [Task],
        resources: &[Resource],
    ) -> Result<LevelingResult, LevelingError> {
        level(tasks, resources, &self.config)
    }

    /// Undo the newest `steps` shifts of a previous run
    pub fn undo(&self, result: &LevelingResult, tasks: &mut [Task], steps: usize) -> UndoResult {
        undo(&result.history, tasks, steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leveler_uses_default_config() {
        let leveler = ResourceLeveler::default();
        assert_eq!(leveler.config.max_iterations, 100);
        assert!(leveler.detect(&[], &[]).is_empty());
    }
}
