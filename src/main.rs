//! Binary entry point. Without a subcommand it prepares the live database and
//! runs the console menu; the remaining subcommands are the browser and the
//! two steps the self-test harness launches as child processes.
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Local;
use clap::{Parser, Subcommand};
use library_manager::harness::{self, ProcessLauncher, Scenario};
use library_manager::{db, run_browser, BrowseApp, LibraryPaths, Menu};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "library-manager")]
#[command(version)]
#[command(about = "Record books, members and loans from the console")]
struct Cli {
    /// Directory holding library.sqlite and library_test.sqlite
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse books, members and loans in a full-screen view
    Browse,

    /// Drop and recreate the test database schema
    ResetTestDb,

    /// Run self-test scenarios against the test database
    SelfTest {
        /// Scenario to run (all when omitted)
        #[arg(value_enum)]
        scenario: Option<Scenario>,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    let paths = LibraryPaths::resolve(cli.data_dir)?;

    match cli.command {
        None => {
            let conn = db::open(&paths.live_db())?;
            db::ensure_schema(&conn)?;
            drop(conn);

            let launcher = ProcessLauncher::current(paths.data_dir())?.with_verbose(cli.verbose);
            let stdin = io::stdin();
            let mut menu = Menu::new(stdin.lock(), io::stdout(), paths.live_db(), launcher);
            menu.run()?;
        }
        Some(Commands::Browse) => {
            let mut app = BrowseApp::new(paths.live_db());
            run_browser(&mut app)?;
        }
        Some(Commands::ResetTestDb) => {
            harness::reset_test_database(&paths.test_db())?;
        }
        Some(Commands::SelfTest { scenario }) => {
            let scenarios = match scenario {
                Some(scenario) => vec![scenario],
                None => Scenario::ALL.to_vec(),
            };
            let mut conn = db::open(&paths.test_db())?;
            let today = Local::now().date_naive();
            let passed = harness::run_self_test(&mut conn, &scenarios, today, &mut io::stdout())?;
            if !passed {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
