//! Persistence module split across logical submodules.

mod books;
mod borrowers;
mod connection;

pub use books::{borrow_book, create_book, delete_book, fetch_books, return_book, update_book};
pub use borrowers::{borrower_has_loans, create_borrower, delete_borrower, fetch_borrowers};
pub use connection::{ensure_schema, open_default, seed_if_empty};
