//! tasklevel CLI - Resource Leveling Engine
//!
//! Command-line interface for checking project files, listing resource
//! overallocations and leveling them away.

mod input;
mod report;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tasklevel_core::{validate_references, LevelingStrategy};
use tasklevel_solver::ResourceLeveler;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use input::{load_config, load_project, save_project, Overrides};
use report::{CheckReport, ConflictReport, LevelReport, OutputFormat, Report};

#[derive(Parser)]
#[command(name = "tasklevel")]
#[command(author, version, about = "Resource leveling engine", long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a project file and leveling config
    Check {
        /// Project file (JSON)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Leveling config (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// List resource overallocations
    Conflicts {
        /// Project file (JSON)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Leveling config (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Shift tasks until no resource is overallocated
    Level {
        /// Project file (JSON)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Leveling config (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Shift direction (forward, backward)
        #[arg(long)]
        strategy: Option<LevelingStrategy>,

        /// Iteration cap
        #[arg(long)]
        max_iterations: Option<usize>,

        /// Largest single shift in days
        #[arg(long)]
        max_shift_days: Option<i64>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,

        /// Write the leveled project to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<process::ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match cli.command {
        Some(Commands::Check {
            file,
            config,
            format,
        }) => cmd_check(&file, config.as_deref(), format)?,
        Some(Commands::Conflicts {
            file,
            config,
            format,
        }) => cmd_conflicts(&file, config.as_deref(), format)?,
        Some(Commands::Level {
            file,
            config,
            strategy,
            max_iterations,
            max_shift_days,
            format,
            output,
        }) => {
            let overrides = Overrides {
                strategy,
                max_iterations,
                max_shift_days,
            };
            cmd_level(&file, config.as_deref(), &overrides, format, output.as_deref())?
        }
        None => {
            println!("tasklevel - Resource Leveling Engine");
            println!("Run with --help for usage information");
            report::ExitCode::Success
        }
    };

    Ok(code.into())
}

/// Logs go to stderr so JSON on stdout stays clean; `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn emit(report: &impl Report, format: OutputFormat) -> Result<report::ExitCode> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    report.render(&mut out, format).context("Failed to write report")?;
    out.flush()?;
    Ok(report.exit_code())
}

fn cmd_check(file: &Path, config: Option<&Path>, format: OutputFormat) -> Result<report::ExitCode> {
    let project = load_project(file)?;
    let config = load_config(config)?;

    let issues = validate_references(&project.tasks, &project.resources);
    let config_errors = config.validate().err().unwrap_or_default();

    let name = if project.name.is_empty() {
        file.display().to_string()
    } else {
        project.name.clone()
    };
    let report = CheckReport::new(
        name,
        project.tasks.len(),
        project.resources.len(),
        issues,
        &config_errors,
    );
    emit(&report, format)
}

fn cmd_conflicts(
    file: &Path,
    config: Option<&Path>,
    format: OutputFormat,
) -> Result<report::ExitCode> {
    let project = load_project(file)?;
    let leveler = ResourceLeveler::new(load_config(config)?);

    let conflicts = leveler.detect(&project.tasks, &project.resources);
    let utilization = leveler.utilization(&project.tasks, &project.resources);
    info!(conflicts = conflicts.len(), "detection finished");

    emit(&ConflictReport::new(conflicts, utilization), format)
}

fn cmd_level(
    file: &Path,
    config: Option<&Path>,
    overrides: &Overrides,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<report::ExitCode> {
    let mut project = load_project(file)?;
    let leveler = ResourceLeveler::new(overrides.apply(load_config(config)?));

    let result = leveler.level(&mut project.tasks, &project.resources)?;

    if let Some(path) = output {
        save_project(&project, path)?;
        info!(path = %path.display(), "leveled project written");
    }

    emit(&LevelReport::from(&result), format)
}
