use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};
use tracing::info;

use crate::models::Book;

/// Map a `SELECT id, title, author, available` row onto a [`Book`].
fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        available: row.get(3)?,
    })
}

/// Insert a new, available book and return it with its assigned id.
pub fn add_book(conn: &Connection, title: &str, author: &str) -> Result<Book> {
    conn.execute(
        "INSERT INTO books (title, author) VALUES (?1, ?2)",
        params![title, author],
    )
    .context("failed to insert book")?;

    let id = conn.last_insert_rowid();
    info!(book_id = id, "book added");
    Ok(Book {
        id,
        title: title.to_string(),
        author: author.to_string(),
        available: true,
    })
}

/// Every book, oldest first.
pub fn list_books(conn: &Connection) -> Result<Vec<Book>> {
    let mut stmt = conn
        .prepare("SELECT id, title, author, available FROM books ORDER BY id")
        .context("failed to prepare book query")?;

    let books = stmt
        .query_map([], book_from_row)
        .context("failed to load books")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect books")?;

    Ok(books)
}

/// Books whose title matches exactly.
pub fn find_books_by_title(conn: &Connection, title: &str) -> Result<Vec<Book>> {
    let mut stmt = conn
        .prepare("SELECT id, title, author, available FROM books WHERE title = ?1 ORDER BY id")
        .context("failed to prepare book title query")?;

    let books = stmt
        .query_map([title], book_from_row)
        .context("failed to search books")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect books")?;

    Ok(books)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    #[test]
    fn added_book_is_available_and_listed() {
        let conn = open_in_memory().unwrap();
        let book = add_book(&conn, "Dune", "Frank Herbert").unwrap();

        assert!(book.available);
        assert_eq!(list_books(&conn).unwrap(), vec![book]);
    }

    #[test]
    fn find_by_title_matches_exactly_one_row() {
        let conn = open_in_memory().unwrap();
        add_book(&conn, "Test", "Author").unwrap();
        add_book(&conn, "Testing", "Someone Else").unwrap();

        let found = find_books_by_title(&conn, "Test").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].author, "Author");
    }

    #[test]
    fn list_is_ordered_by_id() {
        let conn = open_in_memory().unwrap();
        add_book(&conn, "Zebra", "A").unwrap();
        add_book(&conn, "Apple", "B").unwrap();

        let titles: Vec<_> = list_books(&conn)
            .unwrap()
            .into_iter()
            .map(|book| book.title)
            .collect();
        assert_eq!(titles, vec!["Zebra", "Apple"]);
    }
}
