//! Self-test harness behind menu option 8.
//!
//! The menu never runs scenarios in-process. It asks a [`ScenarioLauncher`] to
//! reset the test schema and then to run the chosen scenarios; the production
//! launcher re-invokes this binary with the `reset-test-db` and `self-test`
//! subcommands, which land in [`reset_test_database`] and [`run_self_test`].

mod cleanup;
mod scenarios;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::debug;

use crate::db::{ensure_schema, open, reset_schema};

pub use scenarios::Scenario;

/// Which scenarios a harness run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    One(Scenario),
    All,
}

impl Selection {
    pub fn scenarios(self) -> Vec<Scenario> {
        match self {
            Selection::One(scenario) => vec![scenario],
            Selection::All => Scenario::ALL.to_vec(),
        }
    }
}

/// Starts the two external harness steps.
pub trait ScenarioLauncher {
    /// Drop and recreate the test schema.
    fn reset(&mut self) -> Result<()>;
    /// Run the selected scenarios, returning whether they all passed.
    fn run(&mut self, selection: Selection) -> Result<bool>;
}

/// Launches harness steps as child processes of the current executable. The
/// children share our stdout, so their diagnostics appear inline.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    exe: PathBuf,
    data_dir: PathBuf,
    verbose: bool,
}

impl ProcessLauncher {
    pub fn new(exe: PathBuf, data_dir: PathBuf) -> Self {
        Self {
            exe,
            data_dir,
            verbose: false,
        }
    }

    /// Forward `--verbose` to the child processes.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Launcher for the running binary.
    pub fn current(data_dir: &Path) -> Result<Self> {
        let exe = std::env::current_exe().context("failed to locate current executable")?;
        Ok(Self::new(exe, data_dir.to_path_buf()))
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.exe);
        command.arg("--data-dir").arg(&self.data_dir);
        if self.verbose {
            command.arg("--verbose");
        }
        command
    }
}

impl ScenarioLauncher for ProcessLauncher {
    fn reset(&mut self) -> Result<()> {
        let status = self
            .command()
            .arg("reset-test-db")
            .status()
            .context("failed to launch test database reset")?;
        if !status.success() {
            bail!("test database reset exited with {status}");
        }
        Ok(())
    }

    fn run(&mut self, selection: Selection) -> Result<bool> {
        let mut command = self.command();
        command.arg("self-test");
        if let Selection::One(scenario) = selection {
            command.arg(scenario.name());
        }
        debug!(?selection, "launching self-test");
        let status = command.status().context("failed to launch self-test")?;
        Ok(status.success())
    }
}

/// Drop and recreate the schema in the test database at `path`.
pub fn reset_test_database(path: &Path) -> Result<()> {
    let conn = open(path)?;
    reset_schema(&conn).context("failed to reset test schema")
}

/// Run `scenarios` against `conn`, printing one line per scenario and a
/// summary. Returns whether every scenario passed.
pub fn run_self_test<W: Write>(
    conn: &mut Connection,
    scenarios: &[Scenario],
    today: NaiveDate,
    out: &mut W,
) -> Result<bool> {
    ensure_schema(conn)?;

    let mut failed = 0;
    for scenario in scenarios {
        match scenario.run(conn, today) {
            Ok(()) => writeln!(out, "PASS {}", scenario.name())?,
            Err(err) => {
                failed += 1;
                debug!(scenario = scenario.name(), error = %format!("{err:#}"), "self-test failed");
                writeln!(out, "FAIL {}: {err:#}", scenario.name())?;
            }
        }
    }

    let passed = scenarios.len() - failed;
    writeln!(out, "{passed} passed, {failed} failed")?;
    Ok(failed == 0)
}
