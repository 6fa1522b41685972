use anyhow::{bail, ensure, Context, Result};
use chrono::NaiveDate;
use rusqlite::Connection;

use super::cleanup::{delete_book, delete_loans_for_book, delete_member_by_email};
use crate::db::{
    add_book, add_member, find_books_by_title, get_loan, list_books, list_members, loan_book,
    return_book,
};
use crate::error::LibraryError;

/// One scripted insert/assert/cleanup sequence run against the test database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Scenario {
    AddBook,
    AddMember,
    LoanBook,
    ReturnBook,
    DuplicateEmail,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Scenario::AddBook,
        Scenario::AddMember,
        Scenario::LoanBook,
        Scenario::ReturnBook,
        Scenario::DuplicateEmail,
    ];

    /// Command-line spelling, shared with the `self-test` argument parser.
    pub fn name(self) -> &'static str {
        match self {
            Scenario::AddBook => "add-book",
            Scenario::AddMember => "add-member",
            Scenario::LoanBook => "loan-book",
            Scenario::ReturnBook => "return-book",
            Scenario::DuplicateEmail => "duplicate-email",
        }
    }

    /// Run the scenario. Rows it created are deleted whether or not the
    /// assertions held; a cleanup failure is only reported when the scenario
    /// itself passed.
    pub fn run(self, conn: &mut Connection, today: NaiveDate) -> Result<()> {
        match self {
            Scenario::AddBook => add_book_round_trip(conn),
            Scenario::AddMember => add_member_listed(conn),
            Scenario::LoanBook => loan_marks_unavailable(conn, today),
            Scenario::ReturnBook => return_marks_available(conn, today),
            Scenario::DuplicateEmail => duplicate_email_rejected(conn),
        }
    }
}

const BOOK_TITLE: &str = "Self-test book";
const BOOK_AUTHOR: &str = "Self-test author";
const MEMBER_NAME: &str = "Self-test member";

fn add_book_round_trip(conn: &mut Connection) -> Result<()> {
    let book = add_book(conn, BOOK_TITLE, BOOK_AUTHOR)?;
    let outcome = check_single_title(conn);
    let cleanup = delete_book(conn, book.id);
    outcome?;
    cleanup?;

    let left = find_books_by_title(conn, BOOK_TITLE)?;
    ensure!(left.is_empty(), "expected no rows after delete, found {}", left.len());
    Ok(())
}

fn check_single_title(conn: &Connection) -> Result<()> {
    let found = find_books_by_title(conn, BOOK_TITLE)?;
    ensure!(found.len() == 1, "expected one book titled {BOOK_TITLE:?}, found {}", found.len());
    ensure!(found[0].author == BOOK_AUTHOR, "stored author was {:?}", found[0].author);
    Ok(())
}

fn add_member_listed(conn: &mut Connection) -> Result<()> {
    let email = "selftest-member@example.com";
    let member = add_member(conn, MEMBER_NAME, email)?;
    let outcome = list_members(conn).and_then(|members| {
        ensure!(members.contains(&member), "member {email} missing from listing");
        Ok(())
    });
    let cleanup = delete_member_by_email(conn, email);
    outcome?;
    cleanup
}

fn loan_marks_unavailable(conn: &mut Connection, today: NaiveDate) -> Result<()> {
    let email = "selftest-loan@example.com";
    let book = add_book(conn, "Self-test loan", BOOK_AUTHOR)?;
    let outcome = add_member(conn, MEMBER_NAME, email).and_then(|member| {
        let loan = loan_book(conn, book.id, member.id, today)?;
        let stored = get_loan(conn, loan.id)?.context("loan row missing")?;
        ensure!(stored.book_id == book.id, "loan points at book {}", stored.book_id);
        ensure!(stored.member_id == member.id, "loan points at member {}", stored.member_id);
        ensure!(stored.loan_date == today, "loan dated {}", stored.loan_date);
        ensure!(stored.return_date.is_none(), "new loan already has a return date");
        ensure!(!is_available(conn, book.id)?, "book still available after loan");
        Ok(())
    });
    let cleanup = remove_book_and_member(conn, book.id, email);
    outcome?;
    cleanup
}

fn return_marks_available(conn: &mut Connection, today: NaiveDate) -> Result<()> {
    let email = "selftest-return@example.com";
    let book = add_book(conn, "Self-test return", BOOK_AUTHOR)?;
    let outcome = add_member(conn, MEMBER_NAME, email).and_then(|member| {
        let loan = loan_book(conn, book.id, member.id, today)?;
        return_book(conn, loan.id, book.id, today)?;
        let stored = get_loan(conn, loan.id)?.context("loan row missing")?;
        ensure!(stored.return_date == Some(today), "return date is {:?}", stored.return_date);
        ensure!(is_available(conn, book.id)?, "book not available after return");
        Ok(())
    });
    let cleanup = remove_book_and_member(conn, book.id, email);
    outcome?;
    cleanup
}

fn duplicate_email_rejected(conn: &mut Connection) -> Result<()> {
    let email = "selftest-dup@example.com";
    add_member(conn, MEMBER_NAME, email)?;
    let outcome = match add_member(conn, MEMBER_NAME, email) {
        Ok(_) => Err(anyhow::anyhow!("second member with {email} was accepted")),
        Err(err)
            if matches!(
                err.downcast_ref::<LibraryError>(),
                Some(LibraryError::DuplicateEmail(_))
            ) =>
        {
            Ok(())
        }
        Err(err) => Err(err.context("expected a duplicate email error")),
    };
    let cleanup = delete_member_by_email(conn, email);
    outcome?;
    cleanup
}

fn is_available(conn: &Connection, book_id: i64) -> Result<bool> {
    match list_books(conn)?.into_iter().find(|book| book.id == book_id) {
        Some(book) => Ok(book.available),
        None => bail!("book {book_id} disappeared"),
    }
}

fn remove_book_and_member(conn: &Connection, book_id: i64, email: &str) -> Result<()> {
    delete_loans_for_book(conn, book_id)?;
    delete_book(conn, book_id)?;
    delete_member_by_email(conn, email)
}
