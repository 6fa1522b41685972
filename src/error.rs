//! Typed failures the menu and the self-test harness need to tell apart.
//! Everything else travels as a plain `anyhow::Error` with context attached.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LibraryError {
    #[error("a member with email {0} already exists")]
    DuplicateEmail(String),

    #[error("book {0} does not exist")]
    BookNotFound(i64),

    #[error("member {0} does not exist")]
    MemberNotFound(i64),

    #[error("loan {0} does not exist")]
    LoanNotFound(i64),

    #[error("book {0} is already on loan")]
    BookUnavailable(i64),

    #[error("loan {0} was already returned")]
    LoanAlreadyReturned(i64),

    /// The book id supplied on return does not match the loan's own book.
    #[error("loan {loan_id} is for book {expected}, not book {given}")]
    BookMismatch {
        loan_id: i64,
        expected: i64,
        given: i64,
    },

    #[error("{field} must be a whole number, got {input:?}")]
    InvalidNumber { field: String, input: String },

    #[error("input closed")]
    InputClosed,
}
