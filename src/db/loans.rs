use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::error::LibraryError;
use crate::models::{Loan, LoanRecord};

/// Lend `book_id` to `member_id` on `on`.
///
/// The loan insert and the availability flip share one transaction, so either
/// both land or neither does. The book must exist and be available and the
/// member must exist.
pub fn loan_book(
    conn: &mut Connection,
    book_id: i64,
    member_id: i64,
    on: NaiveDate,
) -> Result<Loan> {
    let tx = conn.transaction().context("failed to start loan transaction")?;

    let available: Option<bool> = tx
        .query_row(
            "SELECT available FROM books WHERE id = ?1",
            [book_id],
            |row| row.get(0),
        )
        .optional()
        .context("failed to look up book")?;
    match available {
        None => return Err(LibraryError::BookNotFound(book_id).into()),
        Some(false) => return Err(LibraryError::BookUnavailable(book_id).into()),
        Some(true) => {}
    }

    let member_exists = tx
        .query_row("SELECT 1 FROM members WHERE id = ?1", [member_id], |_| Ok(()))
        .optional()
        .context("failed to look up member")?
        .is_some();
    if !member_exists {
        return Err(LibraryError::MemberNotFound(member_id).into());
    }

    tx.execute(
        "INSERT INTO loans (book_id, member_id, loan_date) VALUES (?1, ?2, ?3)",
        params![book_id, member_id, on],
    )
    .context("failed to insert loan")?;
    let id = tx.last_insert_rowid();

    tx.execute("UPDATE books SET available = 0 WHERE id = ?1", [book_id])
        .context("failed to mark book as loaned")?;

    tx.commit().context("failed to commit loan")?;

    info!(loan_id = id, book_id, member_id, "book loaned");
    Ok(Loan {
        id,
        book_id,
        member_id,
        loan_date: on,
        return_date: None,
    })
}

/// Close `loan_id` on `on` and make `book_id` available again.
///
/// `book_id` must be the book the loan was made for, and the loan must still
/// be open. Both updates share one transaction.
pub fn return_book(
    conn: &mut Connection,
    loan_id: i64,
    book_id: i64,
    on: NaiveDate,
) -> Result<()> {
    let tx = conn.transaction().context("failed to start return transaction")?;

    let loan: Option<(i64, Option<NaiveDate>)> = tx
        .query_row(
            "SELECT book_id, return_date FROM loans WHERE id = ?1",
            [loan_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .context("failed to look up loan")?;

    let (loaned_book, returned) = loan.ok_or(LibraryError::LoanNotFound(loan_id))?;
    if returned.is_some() {
        return Err(LibraryError::LoanAlreadyReturned(loan_id).into());
    }
    if loaned_book != book_id {
        return Err(LibraryError::BookMismatch {
            loan_id,
            expected: loaned_book,
            given: book_id,
        }
        .into());
    }

    tx.execute(
        "UPDATE loans SET return_date = ?1 WHERE id = ?2",
        params![on, loan_id],
    )
    .context("failed to record return date")?;

    tx.execute("UPDATE books SET available = 1 WHERE id = ?1", [book_id])
        .context("failed to mark book as available")?;

    tx.commit().context("failed to commit return")?;

    info!(loan_id, book_id, "book returned");
    Ok(())
}

/// Look up a single loan row.
pub fn get_loan(conn: &Connection, loan_id: i64) -> Result<Option<Loan>> {
    conn.query_row(
        "SELECT id, book_id, member_id, loan_date, return_date FROM loans WHERE id = ?1",
        [loan_id],
        |row| {
            Ok(Loan {
                id: row.get(0)?,
                book_id: row.get(1)?,
                member_id: row.get(2)?,
                loan_date: row.get(3)?,
                return_date: row.get(4)?,
            })
        },
    )
    .optional()
    .context("failed to load loan")
}

/// Every loan joined with its book title and member name, oldest first.
pub fn list_loans(conn: &Connection) -> Result<Vec<LoanRecord>> {
    let mut stmt = conn
        .prepare(
            "SELECT l.id, b.title, m.name, l.loan_date, l.return_date
             FROM loans l
             INNER JOIN books b ON b.id = l.book_id
             INNER JOIN members m ON m.id = l.member_id
             ORDER BY l.id",
        )
        .context("failed to prepare loan query")?;

    let loans = stmt
        .query_map([], |row| {
            Ok(LoanRecord {
                id: row.get(0)?,
                book_title: row.get(1)?,
                member_name: row.get(2)?,
                loan_date: row.get(3)?,
                return_date: row.get(4)?,
            })
        })
        .context("failed to load loans")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect loans")?;

    Ok(loans)
}
