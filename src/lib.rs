//! Core library surface for the Library Manager console application.
//!
//! The binary wires these pieces together: `db` owns every SQL statement,
//! `menu` drives the numbered console menu, `harness` holds the self-test
//! scenarios launched from menu option 8, and `ui` is the read-only browser.
pub mod config;
pub mod db;
pub mod error;
pub mod harness;
pub mod menu;
pub mod models;
pub mod ui;

pub use config::LibraryPaths;
pub use error::LibraryError;

/// The three domain types that other layers pass around.
pub use models::{Book, Loan, LoanRecord, Member};

pub use menu::Menu;
pub use ui::{run_browser, BrowseApp};
