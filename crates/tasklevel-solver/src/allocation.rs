//! Resource allocation table
//!
//! Turns a task set and a resource catalog into per-resource, per-day
//! allocated hours. Each task spreads its effort evenly over its days and
//! evenly across its assigned resources.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tasklevel_core::{LevelingConfig, Resource, ResourceId, Task, TaskId};
use tracing::debug;

/// Tolerance for hour comparisons; sums of thirds must not read as overload
pub const HOURS_EPSILON: f64 = 1e-9;

/// One task's share of a resource-day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub task_id: TaskId,
    pub hours: f64,
    pub is_critical: bool,
    pub total_float: i64,
}

/// Resource usage on a specific day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAllocation {
    pub date: NaiveDate,
    /// Sum of contributing hours
    pub allocated_hours: f64,
    /// Resource capacity in hours
    pub capacity_hours: f64,
    /// Tasks contributing to this usage
    pub contributions: Vec<Contribution>,
    /// `allocated_hours > capacity_hours * threshold`
    pub is_overallocated: bool,
    /// `max(0, allocated_hours - capacity_hours)`
    pub overload_hours: f64,
}

/// Timeline of resource usage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceAllocation {
    pub resource_id: ResourceId,
    pub capacity_hours: f64,
    /// Usage by date
    pub days: BTreeMap<NaiveDate, DailyAllocation>,
}

impl ResourceAllocation {
    pub fn new(resource_id: ResourceId, capacity_hours: f64) -> Self {
        Self {
            resource_id,
            capacity_hours,
            days: BTreeMap::new(),
        }
    }

    /// Add `hours` per day for a task over `start..=end`
    pub fn add_usage(&mut self, task: &Task, start: NaiveDate, end: NaiveDate, hours: f64) {
        let capacity_hours = self.capacity_hours;
        for date in start.iter_days().take_while(|d| *d <= end) {
            let day = self.days.entry(date).or_insert_with(|| DailyAllocation {
                date,
                allocated_hours: 0.0,
                capacity_hours,
                contributions: Vec::new(),
                is_overallocated: false,
                overload_hours: 0.0,
            });
            day.allocated_hours += hours;
            day.contributions.push(Contribution {
                task_id: task.id.clone(),
                hours,
                is_critical: task.is_critical,
                total_float: task.total_float,
            });
        }
    }

    /// Mark overallocated days against `capacity * threshold`
    fn mark_overallocations(&mut self, threshold: f64) {
        let capacity = self.capacity_hours;
        for day in self.days.values_mut() {
            day.is_overallocated = exceeds(day.allocated_hours, capacity, threshold);
            day.overload_hours = (day.allocated_hours - capacity).max(0.0);
        }
    }

    /// Check if over-allocated on a specific date
    pub fn is_overallocated(&self, date: NaiveDate) -> bool {
        self.days
            .get(&date)
            .map(|day| day.is_overallocated)
            .unwrap_or(false)
    }

    /// Allocated hours on a date (zero when idle)
    pub fn hours_on(&self, date: NaiveDate) -> f64 {
        self.days
            .get(&date)
            .map(|day| day.allocated_hours)
            .unwrap_or(0.0)
    }
}

/// Whether `allocated` is above `capacity * threshold`
pub fn exceeds(allocated: f64, capacity: f64, threshold: f64) -> bool {
    allocated > capacity * threshold + HOURS_EPSILON
}

/// Allocations for every resource in the catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AllocationTable {
    pub resources: BTreeMap<ResourceId, ResourceAllocation>,
}

impl AllocationTable {
    /// Timeline of one resource
    pub fn get(&self, resource_id: &str) -> Option<&ResourceAllocation> {
        self.resources.get(resource_id)
    }

    /// A single resource-day cell
    pub fn cell(&self, resource_id: &str, date: NaiveDate) -> Option<&DailyAllocation> {
        self.get(resource_id).and_then(|r| r.days.get(&date))
    }

    /// Every cell, ordered by resource then date
    pub fn cells(&self) -> impl Iterator<Item = (&ResourceId, &DailyAllocation)> + '_ {
        self.resources
            .iter()
            .flat_map(|(id, r)| r.days.values().map(move |day| (id, day)))
    }

    /// Overallocated cells, ordered by resource then date
    pub fn overallocated_cells(&self) -> impl Iterator<Item = (&ResourceId, &DailyAllocation)> + '_ {
        self.cells().filter(|(_, day)| day.is_overallocated)
    }
}

/// Build the allocation table for a task set.
///
/// Tasks without resources, without positive effort or with an inverted date
/// range contribute nothing. Assignments to resources missing from the
/// catalog are skipped.
pub fn compute_allocations(
    tasks: &[Task],
    resources: &[Resource],
    config: &LevelingConfig,
) -> AllocationTable {
    let mut table = AllocationTable::default();

    // Initialize timelines for all resources
    for resource in resources {
        table
            .resources
            .entry(resource.id.clone())
            .or_insert_with(|| ResourceAllocation::new(resource.id.clone(), resource.max_hours_per_day));
    }

    // Add task assignments to timelines
    for task in tasks {
        if task.assigned.is_empty() || !task.has_valid_range() || task.effort_hours <= 0.0 {
            continue;
        }

        let share = task.hours_per_day() / task.assigned.len() as f64;
        for resource_id in &task.assigned {
            match table.resources.get_mut(resource_id) {
                Some(timeline) => timeline.add_usage(task, task.start, task.end, share),
                None => debug!(
                    task = %task.id,
                    resource = %resource_id,
                    "skipping assignment to unknown resource"
                ),
            }
        }
    }

    for timeline in table.resources.values_mut() {
        timeline.mark_overallocations(config.overallocation_threshold);
    }

    table
}

/// Utilization statistics for a single resource
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceUtilization {
    /// Resource identifier
    pub resource_id: ResourceId,
    /// Daily capacity in hours
    pub capacity_hours: f64,
    /// Total allocated hours
    pub used_hours: f64,
    /// Capacity over the schedule window
    pub available_hours: f64,
    /// Utilization percentage (can exceed 100 if over-allocated)
    pub utilization_percent: f64,
    /// Peak daily usage in hours
    pub peak_hours: f64,
    /// Number of days with any assignment
    pub assigned_days: usize,
    /// Number of overallocated days
    pub overallocated_days: usize,
}

/// Summary of resource utilization across all resources
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UtilizationSummary {
    /// Per-resource utilization statistics
    pub resources: Vec<ResourceUtilization>,
    /// First day of the schedule, if any task has a valid range
    pub schedule_start: Option<NaiveDate>,
    /// Last day of the schedule
    pub schedule_end: Option<NaiveDate>,
    /// Calendar days in the schedule window
    pub total_days: i64,
    /// Average utilization across all resources
    pub average_utilization: f64,
}

/// Calculate resource utilization over the window spanned by `tasks`
pub fn calculate_utilization(table: &AllocationTable, tasks: &[Task]) -> UtilizationSummary {
    let valid = || tasks.iter().filter(|t| t.has_valid_range());
    let schedule_start = valid().map(|t| t.start).min();
    let schedule_end = valid().map(|t| t.end).max();

    let total_days = match (schedule_start, schedule_end) {
        (Some(start), Some(end)) => (end - start).num_days() + 1,
        _ => 0,
    };

    let resources: Vec<ResourceUtilization> = table
        .resources
        .values()
        .map(|timeline| {
            let mut used = 0.0f64;
            let mut peak = 0.0f64;
            let mut assigned = 0usize;
            let mut overallocated = 0usize;

            for day in timeline.days.values() {
                used += day.allocated_hours;
                peak = peak.max(day.allocated_hours);
                if day.allocated_hours > 0.0 {
                    assigned += 1;
                }
                if day.is_overallocated {
                    overallocated += 1;
                }
            }

            let available = total_days as f64 * timeline.capacity_hours;
            let utilization_percent = if available > 0.0 {
                used / available * 100.0
            } else {
                0.0
            };

            ResourceUtilization {
                resource_id: timeline.resource_id.clone(),
                capacity_hours: timeline.capacity_hours,
                used_hours: used,
                available_hours: available,
                utilization_percent,
                peak_hours: peak,
                assigned_days: assigned,
                overallocated_days: overallocated,
            }
        })
        .collect();

    let average_utilization = if resources.is_empty() {
        0.0
    } else {
        resources.iter().map(|r| r.utilization_percent).sum::<f64>() / resources.len() as f64
    };

    UtilizationSummary {
        resources,
        schedule_start,
        schedule_end,
        total_days,
        average_utilization,
    }
}
