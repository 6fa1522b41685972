//! Drives the `reset-test-db` and `self-test` subcommands as real child
//! processes, the way menu option 8 does.

use std::path::{Path, PathBuf};
use std::process::Command;

use library_manager::db;
use library_manager::harness::{ProcessLauncher, ScenarioLauncher, Selection};
use library_manager::LibraryPaths;

fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_library-manager"))
}

fn launcher(data_dir: &Path) -> ProcessLauncher {
    ProcessLauncher::new(binary(), data_dir.to_path_buf())
}

#[test]
fn reset_then_run_all_passes_in_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let mut launcher = launcher(dir.path());

    launcher.reset().unwrap();
    assert!(LibraryPaths::new(dir.path()).test_db().exists());

    assert!(launcher.run(Selection::All).unwrap());
    assert!(!LibraryPaths::new(dir.path()).live_db().exists());
}

#[test]
fn reset_clears_rows_left_in_test_database() {
    let dir = tempfile::tempdir().unwrap();
    let test_db = LibraryPaths::new(dir.path()).test_db();
    {
        let conn = db::open(&test_db).unwrap();
        db::ensure_schema(&conn).unwrap();
        db::add_book(&conn, "Leftover", "Nobody").unwrap();
    }

    launcher(dir.path()).reset().unwrap();

    let conn = db::open(&test_db).unwrap();
    assert!(db::list_books(&conn).unwrap().is_empty());
}

#[test]
fn failing_scenario_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    let test_db = LibraryPaths::new(dir.path()).test_db();
    {
        let conn = db::open(&test_db).unwrap();
        db::ensure_schema(&conn).unwrap();
        db::add_book(&conn, "Self-test book", "Squatter").unwrap();
    }

    let output = Command::new(binary())
        .arg("--data-dir")
        .arg(dir.path())
        .args(["self-test", "add-book"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("FAIL add-book"), "{stdout}");
    assert!(stdout.contains("0 passed, 1 failed"), "{stdout}");

    assert!(!launcher(dir.path()).run(Selection::All).unwrap());
}

#[test]
fn single_scenario_reports_one_pass() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(binary())
        .arg("--data-dir")
        .arg(dir.path())
        .args(["self-test", "duplicate-email"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("PASS duplicate-email"), "{stdout}");
    assert!(stdout.contains("1 passed, 0 failed"), "{stdout}");
}
