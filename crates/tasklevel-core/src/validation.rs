//! Referential-integrity checks for task sets.
//!
//! The leveler skips malformed records instead of failing, so one bad row
//! cannot abort a whole run. Callers that want to know about those rows
//! up front run [`validate_references`] first. Detects:
//! - Duplicate task or resource IDs
//! - Assignments to resources missing from the catalog
//! - Predecessors missing from the task set, and self-dependencies
//! - Tasks whose end date precedes their start date
//! - Resources without positive capacity

use crate::{Resource, Task};
use serde::Serialize;
use std::collections::HashSet;

/// A problem found in the input data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceIssue {
    /// Issue category
    pub kind: ReferenceIssueKind,
    /// Task the issue was found on, if any
    pub task_id: Option<String>,
    /// Human-readable description
    pub message: String,
}

/// Categories of reference issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceIssueKind {
    DuplicateTaskId,
    DuplicateResourceId,
    UnknownResource,
    UnknownPredecessor,
    SelfDependency,
    InvertedDates,
    NonPositiveCapacity,
}

impl ReferenceIssue {
    fn new(kind: ReferenceIssueKind, task_id: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            kind,
            task_id: task_id.map(str::to_string),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ReferenceIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Check a task set against a resource catalog.
///
/// Returns every issue found, in input order; an empty list means the data is
/// consistent.
pub fn validate_references(tasks: &[Task], resources: &[Resource]) -> Vec<ReferenceIssue> {
    let mut issues = Vec::new();

    let mut resource_ids = HashSet::new();
    for r in resources {
        if !resource_ids.insert(r.id.as_str()) {
            issues.push(ReferenceIssue::new(
                ReferenceIssueKind::DuplicateResourceId,
                None,
                format!("Duplicate resource ID: {}", r.id),
            ));
        }
        if !(r.max_hours_per_day.is_finite() && r.max_hours_per_day > 0.0) {
            issues.push(ReferenceIssue::new(
                ReferenceIssueKind::NonPositiveCapacity,
                None,
                format!(
                    "Resource '{}' has non-positive capacity {}",
                    r.id, r.max_hours_per_day
                ),
            ));
        }
    }

    let mut task_ids = HashSet::new();
    for task in tasks {
        if !task_ids.insert(task.id.as_str()) {
            issues.push(ReferenceIssue::new(
                ReferenceIssueKind::DuplicateTaskId,
                Some(&task.id),
                format!("Duplicate task ID: {}", task.id),
            ));
        }
    }

    for task in tasks {
        if !task.has_valid_range() {
            issues.push(ReferenceIssue::new(
                ReferenceIssueKind::InvertedDates,
                Some(&task.id),
                format!(
                    "Task '{}' ends ({}) before it starts ({})",
                    task.id, task.end, task.start
                ),
            ));
        }

        for resource_id in &task.assigned {
            if !resource_ids.contains(resource_id.as_str()) {
                issues.push(ReferenceIssue::new(
                    ReferenceIssueKind::UnknownResource,
                    Some(&task.id),
                    format!(
                        "Task '{}' is assigned to unknown resource '{}'",
                        task.id, resource_id
                    ),
                ));
            }
        }

        for dep in &task.predecessors {
            if dep.predecessor == task.id {
                issues.push(ReferenceIssue::new(
                    ReferenceIssueKind::SelfDependency,
                    Some(&task.id),
                    format!("Task '{}' depends on itself", task.id),
                ));
            } else if !task_ids.contains(dep.predecessor.as_str()) {
                issues.push(ReferenceIssue::new(
                    ReferenceIssueKind::UnknownPredecessor,
                    Some(&task.id),
                    format!(
                        "Task '{}' depends on '{}' which doesn't exist",
                        task.id, dep.predecessor
                    ),
                ));
            }
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn kinds(issues: &[ReferenceIssue]) -> Vec<ReferenceIssueKind> {
        issues.iter().map(|i| i.kind).collect()
    }

    #[test]
    fn consistent_input_has_no_issues() {
        let resources = vec![Resource::new("dev")];
        let tasks = vec![
            Task::new("a", date(6), date(10)).assign("dev"),
            Task::new("b", date(13), date(14)).assign("dev").depends_on("a"),
        ];
        assert!(validate_references(&tasks, &resources).is_empty());
    }

    #[test]
    fn predecessor_may_appear_later_in_the_list() {
        let tasks = vec![
            Task::new("b", date(13), date(14)).depends_on("a"),
            Task::new("a", date(6), date(10)),
        ];
        assert!(validate_references(&tasks, &[]).is_empty());
    }

    #[test]
    fn detects_unknown_references() {
        let resources = vec![Resource::new("dev")];
        let tasks = vec![Task::new("a", date(6), date(10))
            .assign("qa")
            .depends_on("ghost")
            .depends_on("a")];

        let issues = validate_references(&tasks, &resources);
        assert_eq!(
            kinds(&issues),
            vec![
                ReferenceIssueKind::UnknownResource,
                ReferenceIssueKind::UnknownPredecessor,
                ReferenceIssueKind::SelfDependency,
            ]
        );
        assert!(issues.iter().all(|i| i.task_id.as_deref() == Some("a")));
    }

    #[test]
    fn detects_duplicates_and_bad_data() {
        let resources = vec![
            Resource::new("dev"),
            Resource::new("dev"),
            Resource::new("idle").capacity(0.0),
        ];
        let tasks = vec![
            Task::new("a", date(6), date(10)),
            Task::new("a", date(10), date(6)),
        ];

        let issues = validate_references(&tasks, &resources);
        assert_eq!(
            kinds(&issues),
            vec![
                ReferenceIssueKind::DuplicateResourceId,
                ReferenceIssueKind::NonPositiveCapacity,
                ReferenceIssueKind::DuplicateTaskId,
                ReferenceIssueKind::InvertedDates,
            ]
        );
        assert!(issues[3].to_string().contains("ends"));
    }
}
