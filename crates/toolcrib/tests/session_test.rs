//! Tests for loading and saving a ledger through the CLI session.

use chrono::{Duration, Utc};
use std::fs;
use std::sync::mpsc;
use std::thread;
use std::time::Duration as StdDuration;
use tempfile::TempDir;
use toolcrib::cmd::common::{Session, StoreArgs};
use toolcrib::config::Config;
use toolcrib_core::{BorrowRequest, CategoryId, NewTool, SelectionPreference};
use toolcrib_engine::LedgerError;

fn args_with_config(dir: &TempDir, config: &str) -> StoreArgs {
    let path = dir.path().join("toolcrib.toml");
    fs::write(&path, config).unwrap();
    StoreArgs {
        config: Some(path),
        ..StoreArgs::default()
    }
}

#[test]
fn test_state_survives_save_and_reopen() {
    let dir = TempDir::new().unwrap();
    let args = args_with_config(&dir, "state_file = \"ledger/state.json\"\n");

    let session = Session::open(&args).unwrap();
    assert_eq!(session.state_file(), dir.path().join("ledger/state.json"));
    let tool = session
        .engine
        .create_tool(NewTool::new("Drill", CategoryId(1), 3))
        .unwrap();
    session.save().unwrap();
    drop(session);

    let reopened = Session::open(&args).unwrap();
    let tool = reopened.engine.tool(tool.id).unwrap();
    assert_eq!(tool.total_quantity, 3);
    assert_eq!(reopened.engine.list_units(tool.id).unwrap().len(), 3);
    assert!(reopened.engine.check().unwrap().is_empty());
}

#[test]
fn test_flags_override_config() {
    let dir = TempDir::new().unwrap();
    let mut args = args_with_config(
        &dir,
        "state_file = \"a.json\"\n\n[engine]\nselection = \"worst-first\"\nmax_loan_days = 7\n",
    );
    args.state = Some(dir.path().join("b.json"));
    args.selection = Some(SelectionPreference::LowestNumber);

    let session = Session::open(&args).unwrap();

    assert_eq!(session.state_file(), dir.path().join("b.json"));
    assert_eq!(
        session.engine.options().selection,
        SelectionPreference::LowestNumber
    );
    assert_eq!(session.engine.options().max_loan_days, Some(7));
}

#[test]
fn test_missing_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let args = StoreArgs {
        config: Some(dir.path().join("nope.toml")),
        ..StoreArgs::default()
    };
    assert!(Session::open(&args).is_err());
}

#[test]
fn test_corrupt_state_is_an_error() {
    let dir = TempDir::new().unwrap();
    let state = dir.path().join("state.json");
    fs::write(&state, "{ not json").unwrap();
    let args = StoreArgs {
        config: Some(dir.path().join("toolcrib.toml")),
        state: Some(state),
        ..StoreArgs::default()
    };
    fs::write(dir.path().join("toolcrib.toml"), "").unwrap();

    assert!(Session::open(&args).is_err());
}

#[test]
fn test_relative_state_file_resolves_against_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("toolcrib.toml");
    fs::write(&path, "state_file = \"crib.json\"").unwrap();

    let config = Config::load(&path).unwrap();

    assert_eq!(config.state_file, Some(dir.path().join("crib.json")));
}

#[test]
fn test_concurrent_sessions_cannot_both_lend_a_unit() {
    let dir = TempDir::new().unwrap();
    let args = args_with_config(&dir, "state_file = \"state.json\"\n");

    let seed = Session::open(&args).unwrap();
    let tool_id = seed
        .engine
        .create_tool(NewTool::new("Core drill", CategoryId(1), 1))
        .unwrap()
        .id;
    let unit_id = seed.engine.list_units(tool_id).unwrap()[0].id;
    seed.save().unwrap();
    drop(seed);

    let due = Utc::now() + Duration::days(3);
    let first = Session::open(&args).unwrap();

    let (opened_tx, opened_rx) = mpsc::channel();
    let second = {
        let args = args.clone();
        thread::spawn(move || {
            let session = Session::open(&args).unwrap();
            opened_tx.send(()).unwrap();
            let result = session
                .engine
                .borrow(BorrowRequest::new("Ben", due).with_units(tool_id, [unit_id]));
            if result.is_ok() {
                session.save().unwrap();
            }
            result
        })
    };

    // The second session cannot load the ledger while the first holds it.
    assert!(opened_rx.recv_timeout(StdDuration::from_millis(200)).is_err());

    first
        .engine
        .borrow(BorrowRequest::new("Ana", due).with_units(tool_id, [unit_id]))
        .unwrap();
    first.save().unwrap();
    drop(first);

    let err = second.join().unwrap().unwrap_err();
    assert_eq!(err, LedgerError::UnitUnavailable(unit_id));

    let reopened = Session::open(&args).unwrap();
    let borrowers: Vec<_> = reopened
        .engine
        .open_transactions()
        .unwrap()
        .into_iter()
        .map(|t| t.borrower_name)
        .collect();
    assert_eq!(borrowers, vec!["Ana".to_string()]);
    assert!(reopened.engine.check().unwrap().is_empty());
}
