//! Row deletion used by the self-test scenarios to undo what they inserted.
//! The production paths never delete anything.

use anyhow::{Context, Result};
use rusqlite::Connection;

pub(crate) fn delete_loans_for_book(conn: &Connection, book_id: i64) -> Result<()> {
    conn.execute("DELETE FROM loans WHERE book_id = ?1", [book_id])
        .context("failed to delete test loans")?;
    Ok(())
}

pub(crate) fn delete_book(conn: &Connection, book_id: i64) -> Result<()> {
    conn.execute("DELETE FROM books WHERE id = ?1", [book_id])
        .context("failed to delete test book")?;
    Ok(())
}

pub(crate) fn delete_member_by_email(conn: &Connection, email: &str) -> Result<()> {
    conn.execute("DELETE FROM members WHERE email = ?1", [email])
        .context("failed to delete test member")?;
    Ok(())
}
