//! Core library surface for the Library Catalog Manager TUI application.
//!
//! The public modules exposed here provide an intentionally small API so the
//! `bin` target as well as potential external tooling can reuse the same
//! pieces: the persistence layer, the record types it produces, and the
//! interactive application.

pub mod db;
pub mod error;
pub mod models;
pub mod ui;

/// Convenience re-exports for the persistence layer. These functions are
/// typically used by `main.rs` to initialize the embedded SQLite store and
/// preload data.
pub use db::{ensure_schema, fetch_books, open_default, seed_if_empty};

/// Typed failures the UI and tests match on.
pub use error::CatalogError;

/// The two primary domain types that other layers manipulate.
pub use models::{Book, Borrower, LoanStatus};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
