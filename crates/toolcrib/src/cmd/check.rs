//! toolcrib-check - Verify the invariants of a toolcrib ledger.
//!
//! Exits 0 when the ledger is consistent, 1 when violations are found and 2
//! when the ledger cannot be read.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use clap_complete::Shell;
use serde::Serialize;
use std::io::{self, Write};
use std::process::ExitCode;
use toolcrib_core::ToolId;
use toolcrib_engine::Violation;

use crate::cmd::common::{init_logging, print_error, Session, StoreArgs};
use crate::cmd::completions::generate_completions;

/// Output format for violations.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// JSON output for tooling integration
    Json,
}

/// A violation in JSON format.
#[derive(Debug, Serialize)]
pub struct JsonViolation {
    /// Violation code (e.g., "V1002")
    pub code: String,
    /// Violation message
    pub message: String,
}

/// JSON output structure for a check run.
#[derive(Debug, Serialize)]
pub struct JsonOutput {
    /// List of violations
    pub violations: Vec<JsonViolation>,
    /// Total violation count
    pub violation_count: usize,
}

impl From<&Violation> for JsonViolation {
    fn from(v: &Violation) -> Self {
        Self {
            code: v.code.code().to_string(),
            message: v.message.clone(),
        }
    }
}

/// Verify the invariants of a toolcrib ledger.
#[derive(Parser, Debug)]
#[command(name = "toolcrib-check")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Check only this tool
    #[arg(long)]
    pub tool: Option<ToolId>,

    /// Generate shell completions and exit
    #[arg(long, value_name = "SHELL", hide = true)]
    pub generate_completions: Option<Shell>,

    /// Suppress all output (just use exit code)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format (text or json)
    #[arg(long, short = 'f', value_enum, default_value = "text")]
    pub format: OutputFormat,

    #[command(flatten)]
    pub store: StoreArgs,
}

fn run(args: &Args) -> Result<ExitCode> {
    let start = std::time::Instant::now();
    let session = Session::open(&args.store)?;
    let violations = match args.tool {
        Some(tool) => session.engine.check_tool(tool)?,
        None => session.engine.check()?,
    };
    tracing::debug!(
        "Checked {} in {:.2}ms",
        session.state_file().display(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    let mut stdout = io::stdout().lock();
    match args.format {
        OutputFormat::Json => {
            let output = JsonOutput {
                violations: violations.iter().map(JsonViolation::from).collect(),
                violation_count: violations.len(),
            };
            writeln!(stdout, "{}", serde_json::to_string_pretty(&output)?)?;
        }
        OutputFormat::Text if !args.quiet => {
            for violation in &violations {
                writeln!(stdout, "{violation}")?;
            }
            if violations.is_empty() {
                writeln!(stdout, "No violations")?;
            } else {
                writeln!(stdout, "\n{} violation(s)", violations.len())?;
            }
        }
        OutputFormat::Text => {}
    }

    if violations.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

/// Main entry point for the check command.
pub fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(shell) = args.generate_completions {
        generate_completions::<Args>(shell, "toolcrib-check");
        return ExitCode::SUCCESS;
    }

    init_logging(args.store.verbose);

    match run(&args) {
        Ok(exit_code) => exit_code,
        // 1 means violations here, so every failure to check exits 2.
        Err(e) => {
            print_error(&e);
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_format() {
        let args =
            Args::try_parse_from(["toolcrib-check", "-f", "json", "--tool", "tool-4"]).unwrap();
        assert!(matches!(args.format, OutputFormat::Json));
        assert_eq!(args.tool, Some(ToolId(4)));
    }

    #[test]
    fn test_unknown_tool_fails_instead_of_reporting_violations() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("toolcrib.toml");
        std::fs::write(&config, "").unwrap();
        let state = dir.path().join("state.json");
        let args = Args::try_parse_from([
            "toolcrib-check",
            "--config",
            config.to_str().unwrap(),
            "--state",
            state.to_str().unwrap(),
            "--tool",
            "tool-99",
        ])
        .unwrap();

        let err = run(&args).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<toolcrib_engine::LedgerError>(),
            Some(toolcrib_engine::LedgerError::NotFound { .. })
        ));
    }
}
