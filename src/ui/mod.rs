//! Read-only terminal browser over the library listings.

mod app;
mod helpers;
mod terminal;

pub use app::{BrowseApp, Tab};
pub(crate) use helpers::surface_error;
pub use terminal::run_browser;
