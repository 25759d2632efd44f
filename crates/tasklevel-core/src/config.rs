//! Leveling configuration
//!
//! Every field has a documented default, so a config file only needs to name
//! the values it changes:
//!
//! ```rust
//! use tasklevel_core::{LevelingConfig, LevelingStrategy};
//!
//! let config = LevelingConfig::default()
//!     .max_shift_days(10)
//!     .strategy(LevelingStrategy::Backward);
//!
//! assert_eq!(config.max_iterations, 100);
//! assert!(config.validate().is_ok());
//! ```
//!
//! Validation never clamps: an invalid config is rejected with the full list
//! of problems so nothing is mutated by a half-configured run.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Direction in which the leveler moves tasks
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelingStrategy {
    /// Delay tasks (positive offsets)
    #[default]
    Forward,
    /// Pull tasks earlier (negative offsets)
    Backward,
}

impl LevelingStrategy {
    /// Sign applied to probe offsets
    pub fn sign(self) -> i64 {
        match self {
            LevelingStrategy::Forward => 1,
            LevelingStrategy::Backward => -1,
        }
    }
}

impl std::fmt::Display for LevelingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LevelingStrategy::Forward => write!(f, "forward"),
            LevelingStrategy::Backward => write!(f, "backward"),
        }
    }
}

impl FromStr for LevelingStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" => Ok(LevelingStrategy::Forward),
            "backward" => Ok(LevelingStrategy::Backward),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Largest accepted `max_shift_days` (about a century)
pub const MAX_SHIFT_DAYS_LIMIT: i64 = 36_500;

/// Tuning knobs for a leveling run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LevelingConfig {
    /// Upper bound on detect/shift iterations
    pub max_iterations: usize,
    /// Largest offset (in days) tried for a single shift
    pub max_shift_days: i64,
    /// Priority weight of critical tasks (higher = moved later)
    pub critical_path_priority: f64,
    /// Priority weight of non-critical tasks
    pub non_critical_path_priority: f64,
    /// Fraction of capacity above which a day counts as overallocated
    pub overallocation_threshold: f64,
    /// Refuse shifts that break dependency links
    pub respect_dependencies: bool,
    /// Refuse shifts that break date constraints
    pub respect_constraints: bool,
    /// Shift direction
    pub strategy: LevelingStrategy,
    /// History size; older shifts are dropped first
    pub max_undo_steps: usize,
}

impl Default for LevelingConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            max_shift_days: 30,
            critical_path_priority: 1.0,
            non_critical_path_priority: 0.5,
            overallocation_threshold: 1.0,
            respect_dependencies: true,
            respect_constraints: true,
            strategy: LevelingStrategy::Forward,
            max_undo_steps: 10,
        }
    }
}

impl LevelingConfig {
    /// Set the iteration cap
    pub fn max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    /// Set the per-shift offset bound
    pub fn max_shift_days(mut self, days: i64) -> Self {
        self.max_shift_days = days;
        self
    }

    /// Set the shift direction
    pub fn strategy(mut self, strategy: LevelingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the overallocation threshold
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.overallocation_threshold = threshold;
        self
    }

    /// Set the history bound
    pub fn max_undo_steps(mut self, n: usize) -> Self {
        self.max_undo_steps = n;
        self
    }

    /// Check every field, collecting all problems
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();

        if self.max_iterations == 0 {
            errors.push(ConfigError::ZeroMaxIterations);
        }
        if self.max_shift_days <= 0 {
            errors.push(ConfigError::NonPositiveMaxShiftDays(self.max_shift_days));
        } else if self.max_shift_days > MAX_SHIFT_DAYS_LIMIT {
            errors.push(ConfigError::MaxShiftDaysTooLarge {
                value: self.max_shift_days,
                limit: MAX_SHIFT_DAYS_LIMIT,
            });
        }
        for (field, value) in [
            ("critical_path_priority", self.critical_path_priority),
            ("non_critical_path_priority", self.non_critical_path_priority),
        ] {
            if !is_positive(value) {
                errors.push(ConfigError::NonPositivePriority { field, value });
            }
        }
        if !is_positive(self.overallocation_threshold) {
            errors.push(ConfigError::NonPositiveThreshold(self.overallocation_threshold));
        }
        if self.max_undo_steps == 0 {
            errors.push(ConfigError::ZeroUndoSteps);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Configuration problem
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("max_iterations must be at least 1")]
    ZeroMaxIterations,

    #[error("max_shift_days must be positive, got {0}")]
    NonPositiveMaxShiftDays(i64),

    #[error("max_shift_days must be at most {limit}, got {value}")]
    MaxShiftDaysTooLarge { value: i64, limit: i64 },

    #[error("{field} must be a positive number, got {value}")]
    NonPositivePriority { field: &'static str, value: f64 },

    #[error("overallocation_threshold must be a positive number, got {0}")]
    NonPositiveThreshold(f64),

    #[error("max_undo_steps must be at least 1")]
    ZeroUndoSteps,

    #[error("unknown leveling strategy '{0}' (expected 'forward' or 'backward')")]
    UnknownStrategy(String),
}
