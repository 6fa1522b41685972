//! Plain data holders mirroring the three library tables. The persistence
//! layer hydrates them and the menu and browser only read them.

use std::fmt;

use chrono::NaiveDate;

/// Text shown in place of a missing return date.
pub const NOT_RETURNED: &str = "not returned";

/// A catalogued book. `available` is false while an open loan references it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    /// Row id assigned by SQLite.
    pub id: i64,
    pub title: String,
    pub author: String,
    /// Cleared by a loan and set again by its return.
    pub available: bool,
}

impl Book {
    /// Word used for `available` in listings.
    pub fn status_label(&self) -> &'static str {
        if self.available {
            "available"
        } else {
            "on loan"
        }
    }
}

/// `<id> - <title> by <author> (available|on loan)`
impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} by {} ({})",
            self.id,
            self.title,
            self.author,
            self.status_label()
        )
    }
}

/// A registered reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Row id assigned by SQLite.
    pub id: i64,
    pub name: String,
    /// Unique across members, compared without regard to case.
    pub email: String,
}

/// `<id> - <name> (<email>)`
impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} ({})", self.id, self.name, self.email)
    }
}

/// A raw row of the `loans` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loan {
    /// Row id assigned by SQLite.
    pub id: i64,
    /// References `books.id`.
    pub book_id: i64,
    /// References `members.id`.
    pub member_id: i64,
    /// Day the loan was recorded.
    pub loan_date: NaiveDate,
    /// `None` while the book is still out.
    pub return_date: Option<NaiveDate>,
}

/// A loan joined with the title of its book and the name of its member, as
/// shown by the loan listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanRecord {
    /// Id of the underlying loan row.
    pub id: i64,
    /// `books.title` of the loaned book.
    pub book_title: String,
    /// `members.name` of the borrower.
    pub member_name: String,
    pub loan_date: NaiveDate,
    /// `None` while the loan is open; rendered as [`NOT_RETURNED`].
    pub return_date: Option<NaiveDate>,
}

impl LoanRecord {
    /// The return date, or [`NOT_RETURNED`] while the loan is still open.
    pub fn returned_label(&self) -> String {
        self.return_date
            .map(|date| date.to_string())
            .unwrap_or_else(|| NOT_RETURNED.to_string())
    }
}

/// `#<id>: <title> - <member> | loaned: <date> | returned: <date or NOT_RETURNED>`
impl fmt::Display for LoanRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{}: {} - {} | loaned: {} | returned: {}",
            self.id,
            self.book_title,
            self.member_name,
            self.loan_date,
            self.returned_label()
        )
    }
}
