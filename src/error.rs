//! Typed failures for catalog operations. Most persistence errors travel as
//! `anyhow` chains with context strings; the variants here are the ones the
//! UI needs to recognize or that tests assert on directly.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Book not found.")]
    BookNotFound,

    #[error("Borrower not found.")]
    BorrowerNotFound,

    /// Raised by the deletion guard while any book still references the
    /// borrower.
    #[error("Cannot delete: this borrower still has books on loan.")]
    BorrowerHasLoans,
}
