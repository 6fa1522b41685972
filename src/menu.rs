//! Interactive numbered menu driving the command handlers.
//!
//! Each handler opens its own connection to the live database, runs its
//! statements and drops the connection before returning. The menu owns no
//! library state besides the database path.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Error, Result};
use chrono::{Local, NaiveDate};
use crossterm::style::Stylize;
use tracing::debug;

use crate::db;
use crate::error::LibraryError;
use crate::harness::{Scenario, ScenarioLauncher, Selection};
use crate::ui::surface_error;

/// Options of the main menu, keyed by the number the user types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    AddBook,
    AddMember,
    LoanBook,
    ReturnBook,
    ListBooks,
    ListMembers,
    ListLoans,
    RunTests,
    Exit,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Option<Self> {
        let choice = match input.trim() {
            "1" => MenuChoice::AddBook,
            "2" => MenuChoice::AddMember,
            "3" => MenuChoice::LoanBook,
            "4" => MenuChoice::ReturnBook,
            "5" => MenuChoice::ListBooks,
            "6" => MenuChoice::ListMembers,
            "7" => MenuChoice::ListLoans,
            "8" => MenuChoice::RunTests,
            "0" => MenuChoice::Exit,
            _ => return None,
        };
        Some(choice)
    }
}

const MAIN_MENU: &[&str] = &[
    "1. Add book",
    "2. Add member",
    "3. Loan book",
    "4. Return book",
    "5. List books",
    "6. List members",
    "7. List loans",
    "8. Run self-tests",
    "0. Exit",
];

const TEST_MENU: &[&str] = &[
    "1 - Add book",
    "2 - Add member",
    "3 - Loan book",
    "4 - Return book",
    "5 - Run all",
    "0 - Back to menu",
];

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

pub struct Menu<R, W, L> {
    input: R,
    out: W,
    db_path: PathBuf,
    launcher: L,
    today: fn() -> NaiveDate,
}

impl<R: BufRead, W: Write, L: ScenarioLauncher> Menu<R, W, L> {
    pub fn new(input: R, out: W, db_path: PathBuf, launcher: L) -> Self {
        Self {
            input,
            out,
            db_path,
            launcher,
            today: local_today,
        }
    }

    /// Replace the clock used for loan and return dates.
    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Show the menu and dispatch choices until the user picks `0` or input
    /// runs out. Handler failures are reported and the loop carries on.
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.print_menu()?;
            let line = match self.read_line() {
                Ok(line) => line,
                Err(err) if is_input_closed(&err) => break,
                Err(err) => return Err(err),
            };

            let Some(choice) = MenuChoice::parse(&line) else {
                writeln!(self.out, "{}", "Invalid choice!".yellow())?;
                continue;
            };
            if choice == MenuChoice::Exit {
                break;
            }

            if let Err(err) = self.dispatch(choice) {
                if is_input_closed(&err) {
                    break;
                }
                debug!(?choice, error = %format!("{err:#}"), "menu action failed");
                writeln!(self.out, "{}", format!("Error: {}", surface_error(&err)).red())?;
            }
        }

        writeln!(self.out, "Goodbye.")?;
        Ok(())
    }

    fn dispatch(&mut self, choice: MenuChoice) -> Result<()> {
        match choice {
            MenuChoice::AddBook => self.add_book(),
            MenuChoice::AddMember => self.add_member(),
            MenuChoice::LoanBook => self.loan_book(),
            MenuChoice::ReturnBook => self.return_book(),
            MenuChoice::ListBooks => self.list_books(),
            MenuChoice::ListMembers => self.list_members(),
            MenuChoice::ListLoans => self.list_loans(),
            MenuChoice::RunTests => self.run_tests(),
            MenuChoice::Exit => Ok(()),
        }
    }

    fn print_menu(&mut self) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", "LIBRARY MENU".bold())?;
        for line in MAIN_MENU {
            writeln!(self.out, "{line}")?;
        }
        self.prompt_marker("Choice")
    }

    fn prompt_marker(&mut self, label: &str) -> Result<()> {
        write!(self.out, "{label}: ")?;
        self.out.flush().context("failed to flush output")
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("failed to read input")?;
        if read == 0 {
            return Err(LibraryError::InputClosed.into());
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn prompt(&mut self, label: &str) -> Result<String> {
        self.prompt_marker(label)?;
        self.read_line()
    }

    fn prompt_id(&mut self, label: &str) -> Result<i64> {
        let input = self.prompt(label)?;
        input.trim().parse::<i64>().map_err(|_| {
            Error::from(LibraryError::InvalidNumber {
                field: label.to_string(),
                input,
            })
        })
    }

    fn add_book(&mut self) -> Result<()> {
        let title = self.prompt("Title")?;
        let author = self.prompt("Author")?;
        let conn = db::open(&self.db_path)?;
        let book = db::add_book(&conn, &title, &author)?;
        writeln!(self.out, "{}", format!("Book added with id {}.", book.id).green())?;
        Ok(())
    }

    fn add_member(&mut self) -> Result<()> {
        let name = self.prompt("Member name")?;
        let email = self.prompt("Email")?;
        let conn = db::open(&self.db_path)?;
        let member = db::add_member(&conn, &name, &email)?;
        writeln!(self.out, "{}", format!("Member added with id {}.", member.id).green())?;
        Ok(())
    }

    fn loan_book(&mut self) -> Result<()> {
        let book_id = self.prompt_id("Book id")?;
        let member_id = self.prompt_id("Member id")?;
        let mut conn = db::open(&self.db_path)?;
        let loan = db::loan_book(&mut conn, book_id, member_id, (self.today)())?;
        writeln!(self.out, "{}", format!("Book loaned (loan #{}).", loan.id).green())?;
        Ok(())
    }

    fn return_book(&mut self) -> Result<()> {
        let loan_id = self.prompt_id("Loan id")?;
        let book_id = self.prompt_id("Book id")?;
        let mut conn = db::open(&self.db_path)?;
        db::return_book(&mut conn, loan_id, book_id, (self.today)())?;
        writeln!(self.out, "{}", "Book returned.".green())?;
        Ok(())
    }

    fn list_books(&mut self) -> Result<()> {
        let conn = db::open(&self.db_path)?;
        let books = db::list_books(&conn)?;
        self.print_listing("Books", books)
    }

    fn list_members(&mut self) -> Result<()> {
        let conn = db::open(&self.db_path)?;
        let members = db::list_members(&conn)?;
        self.print_listing("Members", members)
    }

    fn list_loans(&mut self) -> Result<()> {
        let conn = db::open(&self.db_path)?;
        let loans = db::list_loans(&conn)?;
        self.print_listing("Loans", loans)
    }

    fn print_listing<T: std::fmt::Display>(&mut self, heading: &str, rows: Vec<T>) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", format!("{heading}:").bold())?;
        if rows.is_empty() {
            writeln!(self.out, "(none)")?;
        }
        for row in rows {
            writeln!(self.out, "{row}")?;
        }
        Ok(())
    }

    fn run_tests(&mut self) -> Result<()> {
        if let Err(err) = self.launcher.reset() {
            debug!(error = %format!("{err:#}"), "test database reset failed");
            writeln!(
                self.out,
                "{}",
                format!("Test database reset failed: {}", surface_error(&err)).yellow()
            )?;
        }

        writeln!(self.out)?;
        writeln!(self.out, "{}", "What should be tested?".bold())?;
        for line in TEST_MENU {
            writeln!(self.out, "{line}")?;
        }
        let choice = self.prompt("Test number")?;

        let selection = match choice.trim() {
            "1" => Selection::One(Scenario::AddBook),
            "2" => Selection::One(Scenario::AddMember),
            "3" => Selection::One(Scenario::LoanBook),
            "4" => Selection::One(Scenario::ReturnBook),
            "5" => Selection::All,
            "0" => return Ok(()),
            _ => {
                writeln!(self.out, "{}", "Invalid choice.".yellow())?;
                return Ok(());
            }
        };

        writeln!(self.out, "Running self-tests...")?;
        if !self.launcher.run(selection)? {
            writeln!(self.out, "{}", "Some self-tests failed.".yellow())?;
        }
        Ok(())
    }
}

fn is_input_closed(err: &Error) -> bool {
    matches!(
        err.downcast_ref::<LibraryError>(),
        Some(LibraryError::InputClosed)
    )
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::path::Path;

    use super::*;
    use crate::models::NOT_RETURNED;

    #[derive(Default)]
    struct RecordingLauncher {
        resets: usize,
        runs: Vec<Selection>,
        outcome: bool,
    }

    impl ScenarioLauncher for RecordingLauncher {
        fn reset(&mut self) -> Result<()> {
            self.resets += 1;
            Ok(())
        }

        fn run(&mut self, selection: Selection) -> Result<bool> {
            self.runs.push(selection);
            Ok(self.outcome)
        }
    }

    fn fixed_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
    }

    fn run_script(db_path: &Path, script: &str) -> (String, RecordingLauncher) {
        let mut out = Vec::new();
        let mut menu = Menu::new(
            Cursor::new(script.as_bytes().to_vec()),
            &mut out,
            db_path.to_path_buf(),
            RecordingLauncher::default(),
        )
        .with_today(fixed_today);
        menu.run().unwrap();
        let launcher = menu.launcher;
        (String::from_utf8(out).unwrap(), launcher)
    }

    fn temp_db() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.sqlite");
        let conn = db::open(&path).unwrap();
        db::ensure_schema(&conn).unwrap();
        (dir, path)
    }

    #[test]
    fn parses_every_menu_number() {
        assert_eq!(MenuChoice::parse("1"), Some(MenuChoice::AddBook));
        assert_eq!(MenuChoice::parse(" 8 "), Some(MenuChoice::RunTests));
        assert_eq!(MenuChoice::parse("0"), Some(MenuChoice::Exit));
        assert_eq!(MenuChoice::parse("9"), None);
        assert_eq!(MenuChoice::parse("books"), None);
    }

    #[test]
    fn full_lending_cycle_through_menu() {
        let (_dir, path) = temp_db();
        let script = "1\nDune\nFrank Herbert\n\
                      2\nAda\nada@example.com\n\
                      3\n1\n1\n\
                      7\n\
                      4\n1\n1\n\
                      5\n6\n0\n";

        let (text, _) = run_script(&path, script);

        assert!(text.contains("Book added with id 1."));
        assert!(text.contains("Member added with id 1."));
        assert!(text.contains("Book loaned (loan #1)."));
        assert!(text.contains(&format!(
            "#1: Dune - Ada | loaned: 2024-02-29 | returned: {NOT_RETURNED}"
        )));
        assert!(text.contains("Book returned."));
        assert!(text.contains("1 - Dune by Frank Herbert (available)"));
        assert!(text.contains("1 - Ada (ada@example.com)"));
        assert!(text.contains("Goodbye."));

        let conn = db::open(&path).unwrap();
        let loan = db::get_loan(&conn, 1).unwrap().unwrap();
        assert_eq!(loan.return_date, Some(fixed_today()));
    }

    #[test]
    fn invalid_choice_warns_and_continues() {
        let (_dir, path) = temp_db();
        let (text, _) = run_script(&path, "42\n5\n0\n");
        assert!(text.contains("Invalid choice!"));
        assert!(text.contains("(none)"));
    }

    #[test]
    fn handler_errors_are_reported_not_fatal() {
        let (_dir, path) = temp_db();
        let script = "2\nAda\ndup@example.com\n\
                      2\nAda\ndup@example.com\n\
                      3\nabc\n\
                      3\n5\n1\n\
                      0\n";

        let (text, _) = run_script(&path, script);

        assert!(text.contains("Error: a member with email dup@example.com already exists"));
        assert!(text.contains("Error: Book id must be a whole number, got \"abc\""));
        assert!(text.contains("Error: book 5 does not exist"));
        assert!(text.contains("Goodbye."));
    }

    #[derive(Clone, Default)]
    struct SharedLog(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl Write for SharedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn logged_while(filter: &str, db_path: &Path, script: &str) -> (String, String) {
        let log = SharedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let (text, _) =
            tracing::subscriber::with_default(subscriber, || run_script(db_path, script));
        let logged = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        (text, logged)
    }

    #[test]
    fn handler_failure_is_shown_once_at_default_level() {
        let (_dir, path) = temp_db();
        let script = "2\nAda\ndup@example.com\n2\nAda\ndup@example.com\n0\n";

        let (text, logged) = logged_while("warn", &path, script);
        assert_eq!(text.matches("already exists").count(), 1);
        assert!(logged.is_empty(), "{logged}");

        let (_dir, path) = temp_db();
        let (_, logged) = logged_while("debug", &path, script);
        assert!(logged.contains("menu action failed"), "{logged}");
    }

    #[test]
    fn end_of_input_exits_cleanly() {
        let (_dir, path) = temp_db();
        let (text, _) = run_script(&path, "1\nHalf a book\n");
        assert!(text.contains("Goodbye."));

        let conn = db::open(&path).unwrap();
        assert!(db::list_books(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_menu_resets_then_runs_selection() {
        let (_dir, path) = temp_db();
        let (text, launcher) = run_script(&path, "8\n3\n8\n5\n8\n0\n8\nx\n0\n");

        assert_eq!(launcher.resets, 4);
        assert_eq!(
            launcher.runs,
            vec![Selection::One(Scenario::LoanBook), Selection::All]
        );
        assert!(text.contains("Some self-tests failed."));
        assert!(text.contains("Invalid choice."));
    }
}
