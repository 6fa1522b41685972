//! Persistence module split across logical submodules.

mod books;
mod connection;
mod loans;
mod members;

pub use books::{add_book, find_books_by_title, list_books};
pub use connection::{ensure_schema, open, open_in_memory, reset_schema};
pub use loans::{get_loan, list_loans, loan_book, return_book};
pub use members::{add_member, list_members};
