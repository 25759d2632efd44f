//! # tasklevel-core
//!
//! Core domain model for the tasklevel resource leveling engine.
//!
//! This crate provides:
//! - Domain types: `Project`, `Task`, `Resource`, `Dependency`, `TaskConstraint`
//! - Leveling configuration and its validation (`config`)
//! - Referential-integrity checks for task sets (`validation`)
//! - Error types
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use tasklevel_core::{Resource, Task};
//!
//! let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
//! let friday = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
//!
//! let design = Task::new("design", monday, friday)
//!     .effort(40.0)
//!     .assign("dev")
//!     .float(5);
//! let review = Task::new("review", friday, friday)
//!     .effort(4.0)
//!     .assign("dev")
//!     .depends_on("design");
//!
//! assert_eq!(design.duration_days(), 5);
//! assert_eq!(design.hours_per_day(), 8.0);
//! assert_eq!(review.predecessors.len(), 1);
//!
//! let dev = Resource::new("dev").capacity(8.0);
//! assert_eq!(dev.max_hours_per_day, 8.0);
//! ```

pub mod config;
pub mod validation;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

pub use config::{ConfigError, LevelingConfig, LevelingStrategy, MAX_SHIFT_DAYS_LIMIT};
pub use validation::{validate_references, ReferenceIssue, ReferenceIssueKind};

// ============================================================================
// Type Aliases
// ============================================================================

/// Unique identifier for a task
pub type TaskId = String;

/// Unique identifier for a resource
pub type ResourceId = String;

// ============================================================================
// Project
// ============================================================================

/// A task set together with the resource catalog it draws on
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Human-readable name
    #[serde(default)]
    pub name: String,
    /// Resource catalog
    #[serde(default)]
    pub resources: Vec<Resource>,
    /// Tasks in repository order
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Project {
    /// Create an empty project with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resources: Vec::new(),
            tasks: Vec::new(),
        }
    }

    /// Get a task by ID
    pub fn get_task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Get a resource by ID
    pub fn get_resource(&self, id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == id)
    }
}

// ============================================================================
// Task
// ============================================================================

/// A scheduled unit of work.
///
/// Dates are inclusive calendar days: a task running Monday to Friday has
/// `start = Monday`, `end = Friday` and a duration of five days.
/// Critical-path flags and float come from an upstream CPM pass and are
/// treated as read-only inputs by the leveler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,
    /// Human-readable name
    #[serde(default)]
    pub name: String,
    /// First working day (inclusive)
    pub start: NaiveDate,
    /// Last working day (inclusive)
    pub end: NaiveDate,
    /// Total work in hours, spread evenly across the task's days
    #[serde(default)]
    pub effort_hours: f64,
    /// Assigned resources
    #[serde(default)]
    pub assigned: BTreeSet<ResourceId>,
    /// Incoming dependency links, in declaration order
    #[serde(default)]
    pub predecessors: Vec<Dependency>,
    /// On the critical path
    #[serde(default)]
    pub is_critical: bool,
    /// Total float in days
    #[serde(default)]
    pub total_float: i64,
    /// Percent complete (0-100)
    #[serde(default)]
    pub progress: f64,
    /// Date constraint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<TaskConstraint>,
}

impl Task {
    /// Create a new task spanning `start..=end`
    pub fn new(id: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            start,
            end,
            effort_hours: 0.0,
            assigned: BTreeSet::new(),
            predecessors: Vec::new(),
            is_critical: false,
            total_float: 0,
            progress: 0.0,
            constraint: None,
        }
    }

    /// Set the task name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the effort in hours
    pub fn effort(mut self, hours: f64) -> Self {
        self.effort_hours = hours;
        self
    }

    /// Assign a resource
    pub fn assign(mut self, resource: impl Into<String>) -> Self {
        self.assigned.insert(resource.into());
        self
    }

    /// Add a dependency (FinishToStart, no lag)
    pub fn depends_on(mut self, predecessor: impl Into<String>) -> Self {
        self.predecessors.push(Dependency::new(predecessor));
        self
    }

    /// Add a dependency with full control over type and lag
    pub fn with_dependency(mut self, dep: Dependency) -> Self {
        self.predecessors.push(dep);
        self
    }

    /// Mark as critical
    pub fn critical(mut self) -> Self {
        self.is_critical = true;
        self
    }

    /// Set total float in days
    pub fn float(mut self, days: i64) -> Self {
        self.total_float = days;
        self
    }

    /// Set the completion percentage
    pub fn progress(mut self, pct: f64) -> Self {
        self.progress = pct;
        self
    }

    /// Set the date constraint
    pub fn constraint(mut self, constraint: TaskConstraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    /// Calendar duration in days, `end - start + 1`, never less than one
    pub fn duration_days(&self) -> i64 {
        ((self.end - self.start).num_days() + 1).max(1)
    }

    /// Whether `end >= start`
    pub fn has_valid_range(&self) -> bool {
        self.end >= self.start
    }

    /// Effort spread evenly over the duration
    pub fn hours_per_day(&self) -> f64 {
        self.effort_hours / self.duration_days() as f64
    }

    /// Completion percentage clamped to 0-100
    pub fn effective_progress(&self) -> f64 {
        if self.progress.is_nan() {
            0.0
        } else {
            self.progress.clamp(0.0, 100.0)
        }
    }
}

/// Dependency on another task
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// ID of the predecessor task
    pub predecessor: TaskId,
    /// Type of dependency
    #[serde(default, rename = "type")]
    pub dep_type: DependencyType,
    /// Lag in days (negative for lead)
    #[serde(default)]
    pub lag_days: i64,
}

impl Dependency {
    /// A plain finish-to-start link
    pub fn new(predecessor: impl Into<String>) -> Self {
        Self {
            predecessor: predecessor.into(),
            dep_type: DependencyType::FinishToStart,
            lag_days: 0,
        }
    }

    pub fn dep_type(mut self, dep_type: DependencyType) -> Self {
        self.dep_type = dep_type;
        self
    }

    pub fn lag(mut self, days: i64) -> Self {
        self.lag_days = days;
        self
    }
}

/// Types of task dependencies
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyType {
    /// Finish-to-Start: successor starts after predecessor finishes
    #[default]
    #[serde(alias = "FS")]
    FinishToStart,
    /// Start-to-Start: successor starts when predecessor starts
    #[serde(alias = "SS")]
    StartToStart,
    /// Finish-to-Finish: successor finishes when predecessor finishes
    #[serde(alias = "FF")]
    FinishToFinish,
    /// Start-to-Finish: successor finishes when predecessor starts
    #[serde(alias = "SF")]
    StartToFinish,
}

impl std::fmt::Display for DependencyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DependencyType::FinishToStart => write!(f, "FS"),
            DependencyType::StartToStart => write!(f, "SS"),
            DependencyType::FinishToFinish => write!(f, "FF"),
            DependencyType::StartToFinish => write!(f, "SF"),
        }
    }
}

/// Constraint on task scheduling
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "date", rename_all = "snake_case")]
pub enum TaskConstraint {
    /// Task cannot start before this date
    StartNoEarlierThan(NaiveDate),
    /// Task must finish by this date
    FinishNoLaterThan(NaiveDate),
    /// Task must start on this date
    MustStartOn(NaiveDate),
    /// Task must finish on this date
    MustFinishOn(NaiveDate),
}

impl TaskConstraint {
    /// Pinned constraints fix the task in time
    pub fn is_pinned(&self) -> bool {
        matches!(self, TaskConstraint::MustStartOn(_) | TaskConstraint::MustFinishOn(_))
    }

    /// The constraint date
    pub fn date(&self) -> NaiveDate {
        match *self {
            TaskConstraint::StartNoEarlierThan(d)
            | TaskConstraint::FinishNoLaterThan(d)
            | TaskConstraint::MustStartOn(d)
            | TaskConstraint::MustFinishOn(d) => d,
        }
    }

    /// Whether a task occupying `start..=end` satisfies the constraint
    pub fn is_satisfied_by(&self, start: NaiveDate, end: NaiveDate) -> bool {
        match *self {
            TaskConstraint::StartNoEarlierThan(d) => start >= d,
            TaskConstraint::FinishNoLaterThan(d) => end <= d,
            TaskConstraint::MustStartOn(d) => start == d,
            TaskConstraint::MustFinishOn(d) => end == d,
        }
    }
}

// ============================================================================
// Resource
// ============================================================================

/// A person or piece of equipment that tasks draw hours from
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Unique identifier
    pub id: ResourceId,
    /// Human-readable name
    #[serde(default)]
    pub name: String,
    /// Daily capacity in hours
    pub max_hours_per_day: f64,
}

impl Resource {
    /// Create a new full-time (8h/day) resource with the given ID
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            max_hours_per_day: 8.0,
        }
    }

    /// Set the resource name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the daily capacity in hours
    pub fn capacity(mut self, hours: f64) -> Self {
        self.max_hours_per_day = hours;
        self
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Leveling error
#[derive(Debug, Error)]
pub enum LevelingError {
    #[error("Invalid leveling configuration: {}", join_errors(.0))]
    InvalidConfig(Vec<ConfigError>),
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// Tests
// ============================================================================
