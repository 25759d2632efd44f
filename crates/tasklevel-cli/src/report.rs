//! Report formatting for CLI output
//!
//! Every command produces a serializable report. The report is rendered either
//! as plain text for terminals or as pretty-printed JSON for tooling.
//!
//! ## Exit Code Semantics
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | Success: input is consistent / no conflicts remain |
//! | 1 | Failure: issues found or leveling did not converge |
//!
//! `--format=json` never changes the exit code.

use std::io::Write;
use std::process;

use serde::Serialize;
use tasklevel_core::{ConfigError, ReferenceIssue};
use tasklevel_solver::{
    conflict_periods, Conflict, ConflictPeriod, HistoryEntry, LevelingOutcome, LevelingResult,
    LevelingSummary, UtilizationSummary,
};

// ============================================================================
// Exit Code
// ============================================================================

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Failure = 1,
}

impl ExitCode {
    /// Failure when anything went wrong
    pub fn from_error_count(count: usize) -> Self {
        if count > 0 {
            ExitCode::Failure
        } else {
            ExitCode::Success
        }
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code as u8)
    }
}

// ============================================================================
// Output Format
// ============================================================================

/// How reports are rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// A report that can be rendered in either format
pub trait Report: Serialize {
    /// Write the human-readable form
    fn write_text<W: Write>(&self, writer: &mut W) -> std::io::Result<()>;

    /// Exit code implied by the report
    fn exit_code(&self) -> ExitCode;

    fn render<W: Write>(&self, writer: &mut W, format: OutputFormat) -> std::io::Result<()> {
        match format {
            OutputFormat::Text => self.write_text(writer),
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *writer, self)?;
                writeln!(writer)
            }
        }
    }
}

// ============================================================================
// check
// ============================================================================

/// Result of `tasklevel check`
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub project: String,
    pub tasks: usize,
    pub resources: usize,
    pub issues: Vec<ReferenceIssue>,
    pub config_errors: Vec<String>,
}

impl CheckReport {
    pub fn new(
        project: impl Into<String>,
        tasks: usize,
        resources: usize,
        issues: Vec<ReferenceIssue>,
        config_errors: &[ConfigError],
    ) -> Self {
        Self {
            project: project.into(),
            tasks,
            resources,
            issues,
            config_errors: config_errors.iter().map(ToString::to_string).collect(),
        }
    }

    fn error_count(&self) -> usize {
        self.issues.len() + self.config_errors.len()
    }
}

impl Report for CheckReport {
    fn write_text<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for issue in &self.issues {
            match &issue.task_id {
                Some(task) => writeln!(writer, "error: {} (task '{}')", issue.message, task)?,
                None => writeln!(writer, "error: {}", issue.message)?,
            }
        }
        for error in &self.config_errors {
            writeln!(writer, "error: config: {}", error)?;
        }

        if self.error_count() == 0 {
            writeln!(
                writer,
                "{}: ok ({} tasks, {} resources)",
                self.project, self.tasks, self.resources
            )
        } else {
            writeln!(writer, "{}: {} error(s)", self.project, self.error_count())
        }
    }

    fn exit_code(&self) -> ExitCode {
        ExitCode::from_error_count(self.error_count())
    }
}

// ============================================================================
// conflicts
// ============================================================================

/// Result of `tasklevel conflicts`
#[derive(Debug, Serialize)]
pub struct ConflictReport {
    pub conflicts: Vec<Conflict>,
    pub periods: Vec<ConflictPeriod>,
    pub utilization: UtilizationSummary,
}

impl ConflictReport {
    pub fn new(conflicts: Vec<Conflict>, utilization: UtilizationSummary) -> Self {
        let periods = conflict_periods(&conflicts);
        Self {
            conflicts,
            periods,
            utilization,
        }
    }
}

impl Report for ConflictReport {
    fn write_text<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        if self.periods.is_empty() {
            writeln!(writer, "No overallocations")?;
        } else {
            writeln!(
                writer,
                "{} overallocated resource-day(s) in {} period(s):",
                self.conflicts.len(),
                self.periods.len()
            )?;
            for period in &self.periods {
                writeln!(
                    writer,
                    "  {} {}..{} ({} day(s), peak {:.1}h): {}",
                    period.resource_id,
                    period.start,
                    period.end,
                    period.days(),
                    period.peak_hours,
                    period.involved_tasks.join(", ")
                )?;
            }
        }

        write_utilization(writer, &self.utilization)
    }

    fn exit_code(&self) -> ExitCode {
        ExitCode::from_error_count(self.conflicts.len())
    }
}

fn write_utilization<W: Write>(writer: &mut W, summary: &UtilizationSummary) -> std::io::Result<()> {
    let (Some(start), Some(end)) = (summary.schedule_start, summary.schedule_end) else {
        return Ok(());
    };
    writeln!(writer)?;
    writeln!(writer, "Utilization {}..{} ({} days):", start, end, summary.total_days)?;
    for r in &summary.resources {
        writeln!(
            writer,
            "  {:<12} {:>6.1}% used {:.1}h of {:.1}h, peak {:.1}h, {} overloaded day(s)",
            r.resource_id,
            r.utilization_percent,
            r.used_hours,
            r.available_hours,
            r.peak_hours,
            r.overallocated_days
        )?;
    }
    Ok(())
}

// ============================================================================
// level
// ============================================================================

/// Result of `tasklevel level`
#[derive(Debug, Serialize)]
pub struct LevelReport {
    pub success: bool,
    pub outcome: LevelingOutcome,
    pub iterations: usize,
    pub summary: LevelingSummary,
    pub history: Vec<HistoryEntry>,
    pub remaining_conflicts: Vec<Conflict>,
}

impl From<&LevelingResult> for LevelReport {
    fn from(result: &LevelingResult) -> Self {
        Self {
            success: result.success,
            outcome: result.outcome,
            iterations: result.iterations,
            summary: result.summary.clone(),
            history: result.history.clone(),
            remaining_conflicts: result.remaining_conflicts.clone(),
        }
    }
}

impl Report for LevelReport {
    fn write_text<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(
            writer,
            "Leveling {} after {} iteration(s)",
            self.outcome, self.iterations
        )?;

        for entry in &self.history {
            writeln!(
                writer,
                "  #{:<3} {} ({}): {}..{} -> {}..{} ({:+} days)",
                entry.iteration,
                entry.task_id,
                entry.task_name,
                entry.original_start,
                entry.original_end,
                entry.new_start,
                entry.new_end,
                entry.shift_days
            )?;
        }
        if self.summary.shifts_applied > self.history.len() {
            writeln!(
                writer,
                "  ({} older shift(s) not kept in history)",
                self.summary.shifts_applied - self.history.len()
            )?;
        }

        writeln!(
            writer,
            "Shifted {} task(s), resolved {} conflict(s), {} remaining",
            self.summary.tasks_shifted,
            self.summary.conflicts_resolved,
            self.summary.conflicts_remaining
        )?;

        for conflict in &self.remaining_conflicts {
            writeln!(
                writer,
                "  {} on {}: {:.1}h of {:.1}h",
                conflict.resource_id, conflict.date, conflict.allocated_hours, conflict.max_hours
            )?;
        }
        Ok(())
    }

    fn exit_code(&self) -> ExitCode {
        if self.success {
            ExitCode::Success
        } else {
            ExitCode::Failure
        }
    }
}
