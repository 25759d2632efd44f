//! Overallocation detection
//!
//! Scans an allocation table against the resource catalog and produces one
//! [`Conflict`] per overloaded resource-day, worst first.

use crate::allocation::{exceeds, AllocationTable, Contribution};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tasklevel_core::{LevelingConfig, Resource, ResourceId, TaskId};

/// An overloaded resource-day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conflict {
    pub resource_id: ResourceId,
    pub date: NaiveDate,
    pub allocated_hours: f64,
    pub max_hours: f64,
    pub overload_hours: f64,
    /// `overload_hours / max_hours`
    pub severity: f64,
    /// Tasks loading the resource that day
    pub contributors: Vec<Contribution>,
}

impl Conflict {
    /// Whether a task contributes to this conflict
    pub fn involves(&self, task_id: &str) -> bool {
        self.contributors.iter().any(|c| c.task_id == task_id)
    }
}

/// Detect overallocations, ranked by severity (descending).
///
/// Ties are broken by date, then resource ID, so identical inputs always
/// produce identical output. Timelines for resources that are not in the
/// catalog are ignored.
pub fn detect_conflicts(
    table: &AllocationTable,
    resources: &[Resource],
    config: &LevelingConfig,
) -> Vec<Conflict> {
    let mut capacities: HashMap<&str, f64> = HashMap::with_capacity(resources.len());
    for r in resources {
        capacities.entry(r.id.as_str()).or_insert(r.max_hours_per_day);
    }

    let mut conflicts: Vec<Conflict> = table
        .cells()
        .filter_map(|(resource_id, day)| {
            let max_hours = *capacities.get(resource_id.as_str())?;
            if !exceeds(day.allocated_hours, max_hours, config.overallocation_threshold) {
                return None;
            }
            let overload_hours = (day.allocated_hours - max_hours).max(0.0);
            Some(Conflict {
                resource_id: resource_id.clone(),
                date: day.date,
                allocated_hours: day.allocated_hours,
                max_hours,
                overload_hours,
                severity: if max_hours > 0.0 {
                    overload_hours / max_hours
                } else {
                    f64::INFINITY
                },
                contributors: day.contributions.clone(),
            })
        })
        .collect();

    conflicts.sort_by(|a, b| {
        b.severity
            .total_cmp(&a.severity)
            .then(a.date.cmp(&b.date))
            .then_with(|| a.resource_id.cmp(&b.resource_id))
    });

    conflicts
}

/// Dates on which `task_id` contributes to a conflict
pub fn conflict_dates_for(conflicts: &[Conflict], task_id: &str) -> BTreeSet<NaiveDate> {
    conflicts
        .iter()
        .filter(|c| c.involves(task_id))
        .map(|c| c.date)
        .collect()
}

/// A run of consecutive overallocated days on one resource
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictPeriod {
    pub resource_id: ResourceId,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub peak_hours: f64,
    pub involved_tasks: Vec<TaskId>,
}

impl ConflictPeriod {
    /// Number of days in the period
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Group conflicts into consecutive-day periods, ordered by resource then start
pub fn conflict_periods(conflicts: &[Conflict]) -> Vec<ConflictPeriod> {
    let mut ordered: Vec<&Conflict> = conflicts.iter().collect();
    ordered.sort_by(|a, b| a.resource_id.cmp(&b.resource_id).then(a.date.cmp(&b.date)));

    let mut periods = Vec::new();
    let mut current_period: Option<ConflictPeriod> = None;

    for conflict in ordered {
        match &mut current_period {
            Some(period)
                if period.resource_id == conflict.resource_id
                    && period.end.succ_opt() == Some(conflict.date) =>
            {
                period.end = conflict.date;
                period.peak_hours = period.peak_hours.max(conflict.allocated_hours);
                for c in &conflict.contributors {
                    if !period.involved_tasks.contains(&c.task_id) {
                        period.involved_tasks.push(c.task_id.clone());
                    }
                }
            }
            _ => {
                if let Some(period) = current_period.take() {
                    periods.push(period);
                }
                let mut involved_tasks: Vec<TaskId> = Vec::new();
                for c in &conflict.contributors {
                    if !involved_tasks.contains(&c.task_id) {
                        involved_tasks.push(c.task_id.clone());
                    }
                }
                current_period = Some(ConflictPeriod {
                    resource_id: conflict.resource_id.clone(),
                    start: conflict.date,
                    end: conflict.date,
                    peak_hours: conflict.allocated_hours,
                    involved_tasks,
                });
            }
        }
    }

    if let Some(period) = current_period {
        periods.push(period);
    }

    periods
}
