//! Plumbing shared by every command: state file, config and logging.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::Args;
use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use toolcrib_core::SelectionPreference;
use toolcrib_engine::{Engine, LedgerError};
use toolcrib_store::MemoryStore;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use crate::config::{default_state_file, Config};

/// Options naming the ledger and tuning the engine.
#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// Ledger state file (JSON)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub state: Option<PathBuf>,

    /// Configuration file (defaults to ./toolcrib.toml when present)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Unit selection order for quantity borrows
    #[arg(long, value_name = "ORDER", global = true)]
    pub selection: Option<SelectionPreference>,

    /// Longest allowed loan in days
    #[arg(long, value_name = "DAYS", global = true)]
    pub max_loan_days: Option<u32>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Install the tracing subscriber.
///
/// `RUST_LOG` applies unless `--verbose` is given, which logs everything at
/// debug level with span timings.
pub fn init_logging(verbose: bool) {
    if verbose {
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(std::io::stderr)
            .init();
    } else {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// An engine over a loaded state file.
///
/// The session holds an exclusive lock on `<state file>.lock` from load until
/// it is dropped, so concurrent invocations on one ledger run one at a time.
pub struct Session {
    /// The engine.
    pub engine: Engine<MemoryStore>,
    state_file: PathBuf,
    _lock: File,
}

impl Session {
    /// Load the configuration and the state file it points at.
    ///
    /// A state file that does not exist yet starts an empty ledger.
    pub fn open(args: &StoreArgs) -> Result<Self> {
        let config = Config::discover(args.config.as_deref())?;
        let state_file = args
            .state
            .clone()
            .or(config.state_file)
            .or_else(default_state_file)
            .context("no state file given and no data directory available")?;

        let mut options = config.engine;
        if let Some(selection) = args.selection {
            options.selection = selection;
        }
        if let Some(days) = args.max_loan_days {
            options.max_loan_days = Some(days);
        }

        let lock = lock_state(&state_file)?;
        let store = MemoryStore::open(&state_file)
            .with_context(|| format!("failed to load {}", state_file.display()))?;
        tracing::debug!("Opened ledger {}", state_file.display());
        Ok(Self {
            engine: Engine::new(store).with_options(options),
            state_file,
            _lock: lock,
        })
    }

    /// Path of the state file.
    #[must_use]
    pub fn state_file(&self) -> &Path {
        &self.state_file
    }

    /// Write the ledger back to its state file.
    pub fn save(&self) -> Result<()> {
        self.engine
            .store()
            .save(&self.state_file)
            .with_context(|| format!("failed to save {}", self.state_file.display()))
    }
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }
    Ok(())
}

/// Take the exclusive lock guarding a state file, waiting for any other
/// holder. The lock is released when the returned file is dropped.
fn lock_state(state_file: &Path) -> Result<File> {
    create_parent_dir(state_file)?;
    let mut lock_path = OsString::from(state_file.as_os_str());
    lock_path.push(".lock");
    let lock_path = PathBuf::from(lock_path);

    let lock_file = File::options()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .with_context(|| format!("failed to open {}", lock_path.display()))?;
    if lock_file.try_lock_exclusive().is_err() {
        tracing::debug!("Waiting for lock on {}", lock_path.display());
        lock_file
            .lock_exclusive()
            .with_context(|| format!("failed to lock {}", lock_path.display()))?;
    }
    Ok(lock_file)
}

/// Parse a due date.
///
/// Accepts RFC 3339 (`2024-03-05T17:00:00Z`) or a bare date, which means the
/// end of that day in UTC.
pub fn parse_due(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Ok(at.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("invalid date: {s} (expected YYYY-MM-DD or RFC 3339)"))?;
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default();
    Ok(date.and_time(end_of_day).and_utc())
}

/// Parse `KEY=VALUE`.
pub fn parse_pair<K, V>(s: &str) -> Result<(K, V), String>
where
    K: std::str::FromStr<Err = String>,
    V: std::str::FromStr,
    V::Err: std::fmt::Display,
{
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {s}"))?;
    let value = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid value in {s}: {e}"))?;
    Ok((key.trim().parse()?, value))
}

/// Print a fatal error, tagged with its ledger code when it has one.
pub fn print_error(e: &anyhow::Error) {
    match e.downcast_ref::<LedgerError>() {
        Some(ledger) => eprintln!("error[{}]: {e:#}", ledger.kind().code()),
        None => eprintln!("error: {e:#}"),
    }
}

/// Exit status for a fatal error.
///
/// An operation the ledger rejected exits 1; anything else exits 2.
#[must_use]
pub fn error_status(e: &anyhow::Error) -> u8 {
    if e.downcast_ref::<LedgerError>().is_some() {
        1
    } else {
        2
    }
}

/// Print a fatal error and pick the exit code.
pub fn report_error(e: &anyhow::Error) -> ExitCode {
    print_error(e);
    ExitCode::from(error_status(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use toolcrib_core::{Condition, ToolId, UnitId};

    #[test]
    fn test_parse_due_bare_date_is_end_of_day() {
        let due = parse_due("2024-03-05").unwrap();
        assert_eq!(due, Utc.with_ymd_and_hms(2024, 3, 5, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_parse_due_rfc3339() {
        let due = parse_due("2024-03-05T17:00:00+02:00").unwrap();
        assert_eq!(due, Utc.with_ymd_and_hms(2024, 3, 5, 15, 0, 0).unwrap());
        assert!(parse_due("next tuesday").is_err());
    }

    #[test]
    fn test_parse_pair() {
        let (tool, count): (ToolId, u32) = parse_pair("tool-3=2").unwrap();
        assert_eq!((tool, count), (ToolId(3), 2));

        let (tool, unit): (ToolId, UnitId) = parse_pair("4=unit-17").unwrap();
        assert_eq!((tool, unit), (ToolId(4), UnitId(17)));

        let (_, condition): (ToolId, Condition) = parse_pair("1=fair").unwrap();
        assert_eq!(condition, Condition::Fair);

        assert!(parse_pair::<ToolId, u32>("tool-3").is_err());
        assert!(parse_pair::<ToolId, u32>("tool-3=lots").is_err());
    }

    #[test]
    fn test_error_status() {
        let rejected = anyhow::Error::new(LedgerError::UnitUnavailable(UnitId(2)));
        assert_eq!(error_status(&rejected), 1);
        assert_eq!(error_status(&rejected.context("borrow failed")), 1);

        let unreadable = anyhow::anyhow!("failed to load state.json");
        assert_eq!(error_status(&unreadable), 2);
    }
}
