use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::debug;

/// Open (creating if needed) the SQLite file at `path` with foreign keys
/// enforced. Every command handler calls this and drops the connection when it
/// is done.
pub fn open(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("failed to create data directory")?;
        }
    }

    debug!(path = %path.display(), "opening library database");
    let conn = Connection::open(path).context("failed to open SQLite database")?;
    enable_foreign_keys(&conn)?;
    Ok(conn)
}

/// Fresh in-memory database with the schema already applied.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    enable_foreign_keys(&conn)?;
    ensure_schema(&conn)?;
    Ok(conn)
}

fn enable_foreign_keys(conn: &Connection) -> Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign keys")?;
    Ok(())
}

/// Create the three tables if they are missing. `loans` references the other
/// two, so it comes last.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS books (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            author TEXT NOT NULL,
            available BOOLEAN NOT NULL DEFAULT 1
        )",
        [],
    )
    .context("failed to create books table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS members (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE COLLATE NOCASE
        )",
        [],
    )
    .context("failed to create members table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS loans (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            book_id INTEGER NOT NULL,
            member_id INTEGER NOT NULL,
            loan_date TEXT NOT NULL,
            return_date TEXT DEFAULT NULL,
            FOREIGN KEY(book_id) REFERENCES books(id),
            FOREIGN KEY(member_id) REFERENCES members(id)
        )",
        [],
    )
    .context("failed to create loans table")?;

    debug!("library schema ready");
    Ok(())
}

/// Drop every table and recreate the schema. Only the self-test harness points
/// this at a database, and only at the disposable one.
pub fn reset_schema(conn: &Connection) -> Result<()> {
    for table in ["loans", "books", "members"] {
        conn.execute(&format!("DROP TABLE IF EXISTS {table}"), [])
            .with_context(|| format!("failed to drop {table} table"))?;
    }
    ensure_schema(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare(
                "SELECT name FROM sqlite_master
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
                 ORDER BY name",
            )
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<String>, _>>()
            .unwrap()
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        assert_eq!(table_names(&conn), vec!["books", "loans", "members"]);
    }

    #[test]
    fn open_creates_missing_data_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("library.sqlite");
        let conn = open(&path).unwrap();
        ensure_schema(&conn).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let conn = open_in_memory().unwrap();
        let result = conn.execute(
            "INSERT INTO loans (book_id, member_id, loan_date) VALUES (99, 99, '2024-01-01')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn reset_schema_empties_tables() {
        let conn = open_in_memory().unwrap();
        conn.execute(
            "INSERT INTO books (title, author) VALUES ('Left', 'Behind')",
            [],
        )
        .unwrap();

        reset_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
        assert_eq!(table_names(&conn), vec!["books", "loans", "members"]);
    }
}
