//! toolcrib-sweep - Mark past-due loans as overdue.
//!
//! Loans whose due date has passed move from `ACTIVE` to `OVERDUE`. Running
//! the sweep again promotes nothing new.

use anyhow::Result;
use clap::Parser;
use clap_complete::Shell;
use std::io::{self, Write};
use std::process::ExitCode;

use crate::cmd::common::{init_logging, report_error, Session, StoreArgs};
use crate::cmd::completions::generate_completions;

/// Mark past-due loans as overdue.
#[derive(Parser, Debug)]
#[command(name = "toolcrib-sweep")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Generate shell completions and exit
    #[arg(long, value_name = "SHELL", hide = true)]
    pub generate_completions: Option<Shell>,

    /// Report what would change without saving
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Suppress all output (just use exit code)
    #[arg(short, long)]
    pub quiet: bool,

    #[command(flatten)]
    pub store: StoreArgs,
}

fn run(args: &Args) -> Result<()> {
    let session = Session::open(&args.store)?;
    let promoted = session.engine.sweep_overdue()?;
    tracing::debug!("Promoted {} loan(s) to OVERDUE", promoted.len());

    if !promoted.is_empty() && !args.dry_run {
        session.save()?;
    }

    if !args.quiet {
        let mut stdout = io::stdout().lock();
        for id in &promoted {
            writeln!(stdout, "{id} is overdue")?;
        }
    }
    Ok(())
}

/// Main entry point for the sweep command.
pub fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(shell) = args.generate_completions {
        generate_completions::<Args>(shell, "toolcrib-sweep");
        return ExitCode::SUCCESS;
    }

    init_logging(args.store.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_error(&e),
    }
}
