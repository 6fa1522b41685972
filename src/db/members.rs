use anyhow::{Context, Result};
use rusqlite::{ffi, params, Connection, Error as SqlError};
use tracing::info;

use crate::error::LibraryError;
use crate::models::Member;

/// Insert a member. A second member with the same email is rejected by the
/// UNIQUE constraint and reported as [`LibraryError::DuplicateEmail`].
pub fn add_member(conn: &Connection, name: &str, email: &str) -> Result<Member> {
    conn.execute(
        "INSERT INTO members (name, email) VALUES (?1, ?2)",
        params![name, email],
    )
    .map_err(|err| map_unique_email(err, email))
    .context("failed to insert member")?;

    let id = conn.last_insert_rowid();
    info!(member_id = id, "member added");
    Ok(Member {
        id,
        name: name.to_string(),
        email: email.to_string(),
    })
}

/// Every member, oldest first.
pub fn list_members(conn: &Connection) -> Result<Vec<Member>> {
    let mut stmt = conn
        .prepare("SELECT id, name, email FROM members ORDER BY id")
        .context("failed to prepare member query")?;

    let members = stmt
        .query_map([], |row| {
            Ok(Member {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
            })
        })
        .context("failed to load members")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect members")?;

    Ok(members)
}

fn map_unique_email(err: SqlError, email: &str) -> anyhow::Error {
    if matches!(
        &err,
        SqlError::SqliteFailure(code, _) if code.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    ) {
        LibraryError::DuplicateEmail(email.to_string()).into()
    } else {
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    #[test]
    fn unique_email_is_accepted() {
        let conn = open_in_memory().unwrap();
        let member = add_member(&conn, "Ada", "ada@example.com").unwrap();
        assert_eq!(list_members(&conn).unwrap(), vec![member]);
    }

    #[test]
    fn duplicate_email_is_typed_error() {
        let conn = open_in_memory().unwrap();
        add_member(&conn, "Ada", "dup@example.com").unwrap();

        let err = add_member(&conn, "Ada again", "dup@example.com").unwrap_err();
        assert_eq!(
            err.downcast_ref::<LibraryError>(),
            Some(&LibraryError::DuplicateEmail("dup@example.com".to_string()))
        );
        assert_eq!(list_members(&conn).unwrap().len(), 1);
    }

    #[test]
    fn email_uniqueness_ignores_case() {
        let conn = open_in_memory().unwrap();
        add_member(&conn, "Ada", "ada@example.com").unwrap();

        let err = add_member(&conn, "Ada shouting", "ADA@Example.com").unwrap_err();
        assert_eq!(
            err.downcast_ref::<LibraryError>(),
            Some(&LibraryError::DuplicateEmail("ADA@Example.com".to_string()))
        );
        assert_eq!(list_members(&conn).unwrap().len(), 1);
    }
}
