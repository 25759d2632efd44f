//! Loading project and configuration files

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tasklevel_core::{LevelingConfig, LevelingStrategy, Project};

/// Parse a project JSON file
pub fn load_project(path: &Path) -> Result<Project> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read project file {}", path.display()))?;
    serde_json::from_str(&source)
        .with_context(|| format!("Failed to parse project file {}", path.display()))
}

/// Parse a TOML leveling config, or fall back to the defaults
pub fn load_config(path: Option<&Path>) -> Result<LevelingConfig> {
    let Some(path) = path else {
        return Ok(LevelingConfig::default());
    };
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&source).with_context(|| format!("Failed to parse config file {}", path.display()))
}

/// Command-line values that take precedence over the config file
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub strategy: Option<LevelingStrategy>,
    pub max_iterations: Option<usize>,
    pub max_shift_days: Option<i64>,
}

impl Overrides {
    pub fn apply(&self, mut config: LevelingConfig) -> LevelingConfig {
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(n) = self.max_iterations {
            config.max_iterations = n;
        }
        if let Some(days) = self.max_shift_days {
            config.max_shift_days = days;
        }
        config
    }
}

/// Write the project back out as pretty JSON
pub fn save_project(project: &Project, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(project).context("Failed to serialize project")?;
    fs::write(path, json + "\n").with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_config_means_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.max_iterations, 100);
    }

    #[test]
    fn toml_config_is_partial() {
        let file = temp_file("max_shift_days = 12\nstrategy = \"backward\"\n");
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.max_shift_days, 12);
        assert_eq!(config.strategy, LevelingStrategy::Backward);
        assert_eq!(config.max_undo_steps, 10);
    }

    #[test]
    fn unknown_config_keys_are_rejected() {
        let file = temp_file("max_shift = 12\n");
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn overrides_win() {
        let overrides = Overrides {
            strategy: Some(LevelingStrategy::Backward),
            max_iterations: Some(5),
            max_shift_days: None,
        };
        let config = overrides.apply(LevelingConfig::default().max_shift_days(7));
        assert_eq!(config.strategy, LevelingStrategy::Backward);
        assert_eq!(config.max_iterations, 5);
        assert_eq!(config.max_shift_days, 7);
    }

    #[test]
    fn project_file_round_trip() {
        let file = temp_file(
            r#"{
                "name": "demo",
                "resources": [{"id": "dev", "name": "Dev", "max_hours_per_day": 8.0}],
                "tasks": [{"id": "a", "start": "2025-01-06", "end": "2025-01-10",
                           "effort_hours": 40.0, "assigned": ["dev"], "total_float": 3}]
            }"#,
        );
        let project = load_project(file.path()).unwrap();
        assert_eq!(project.name, "demo");
        assert_eq!(project.tasks[0].duration_days(), 5);
        assert_eq!(project.tasks[0].total_float, 3);

        let out = NamedTempFile::new().unwrap();
        save_project(&project, out.path()).unwrap();
        let reloaded = load_project(out.path()).unwrap();
        assert_eq!(reloaded, project);
    }

    #[test]
    fn unreadable_project_has_context() {
        let err = load_project(Path::new("/nonexistent/project.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read project file"));
    }
}
