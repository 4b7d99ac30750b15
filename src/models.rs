//! Domain models that mirror the SQLite schema and get passed throughout the
//! TUI. These types stay light-weight data holders so the persistence and
//! presentation layers can focus on their own concerns; the only behavior
//! here is formatting and the status enum's column mapping.

use std::fmt;

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

/// Lending state of a book. Stored as TEXT in the `status` column so the
/// database stays readable when inspected with the sqlite3 shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanStatus {
    Available,
    Borrowed,
}

impl LoanStatus {
    /// The exact column value for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Available => "Available",
            LoanStatus::Borrowed => "Borrowed",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromSql for LoanStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().and_then(|text| match text {
            "Available" => Ok(LoanStatus::Available),
            "Borrowed" => Ok(LoanStatus::Borrowed),
            other => Err(FromSqlError::Other(
                format!("unknown loan status '{other}'").into(),
            )),
        })
    }
}

impl ToSql for LoanStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

/// A catalog entry. Mirrors one row of the `books` table plus the joined
/// borrower name that the list query produces.
#[derive(Debug, Clone)]
pub struct Book {
    /// Primary key from the database. Edit, delete, and loan flows bubble the
    /// id back to the persistence layer.
    pub id: i64,
    pub title: String,
    pub author: String,
    /// Publication year. Optional in storage; the form restricts the range.
    pub year: Option<i64>,
    /// Free-text genre. Empty string when the user left the field blank.
    pub genre: String,
    pub status: LoanStatus,
    /// Set while the book is on loan, together with both dates below.
    pub borrower_id: Option<i64>,
    pub borrow_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    /// Borrower name from the left join in `fetch_books`; `None` when the
    /// book is available.
    pub borrowed_by: Option<String>,
}

impl Book {
    pub fn is_available(&self) -> bool {
        self.status == LoanStatus::Available
    }

    /// Compose a `Title - Author` string used by status messages and
    /// confirmation dialogs.
    pub fn display_title(&self) -> String {
        format!("{} - {}", self.title, self.author)
    }
}

/// A person eligible to hold books on loan. Mirrors one row of the
/// `borrowers` table.
#[derive(Debug, Clone)]
pub struct Borrower {
    pub id: i64,
    pub name: String,
    /// Optional contact fields stored as plain text; empty when not given.
    pub email: String,
    pub phone: String,
}

impl fmt::Display for Borrower {
    /// Write the borrower name to any formatter so the type plays nicely with
    /// Ratatui widgets that consume strings implicitly.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loan_status_column_values() {
        assert_eq!(LoanStatus::Available.as_str(), "Available");
        assert_eq!(LoanStatus::Borrowed.as_str(), "Borrowed");
    }

    #[test]
    fn unknown_status_text_is_rejected() {
        let result = LoanStatus::column_result(ValueRef::Text(b"Lost"));
        assert!(result.is_err());
    }
}
