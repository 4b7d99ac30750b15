use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::error::CatalogError;
use crate::models::Borrower;

/// Retrieve every borrower ordered by id, the order the UI lists them in.
pub fn fetch_borrowers(conn: &Connection) -> Result<Vec<Borrower>> {
    let mut stmt = conn
        .prepare("SELECT id, name, email, phone FROM borrowers ORDER BY id")
        .context("failed to prepare borrower query")?;

    let borrowers = stmt
        .query_map([], |row| {
            Ok(Borrower {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                phone: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            })
        })
        .context("failed to load borrowers")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect borrowers")?;

    Ok(borrowers)
}

/// Insert a new borrower, returning the hydrated struct so the caller can
/// push it straight into the in-memory list.
pub fn create_borrower(conn: &Connection, name: &str, email: &str, phone: &str) -> Result<Borrower> {
    conn.execute(
        "INSERT INTO borrowers (name, email, phone) VALUES (?1, ?2, ?3)",
        params![name, email, phone],
    )
    .context("failed to insert borrower")?;

    let id = conn.last_insert_rowid();
    Ok(Borrower {
        id,
        name: name.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
    })
}

/// Whether any book currently references this borrower.
pub fn borrower_has_loans(conn: &Connection, id: i64) -> Result<bool> {
    let exists: bool = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM books WHERE borrower_id = ?1)",
            params![id],
            |row| row.get(0),
        )
        .context("failed to check for active loans")?;
    Ok(exists)
}

/// Remove a borrower row. Refuses while any book still references the id, so
/// the borrower a loan points at always exists; the check and the delete are
/// the only two statements involved.
pub fn delete_borrower(conn: &Connection, id: i64) -> Result<()> {
    if borrower_has_loans(conn, id)? {
        return Err(CatalogError::BorrowerHasLoans.into());
    }

    let deleted = conn
        .execute("DELETE FROM borrowers WHERE id = ?1", params![id])
        .context("failed to delete borrower")?;

    if deleted == 0 {
        Err(CatalogError::BorrowerNotFound.into())
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::books::{borrow_book, return_book};
    use crate::db::connection::{ensure_schema, seed_if_empty};
    use chrono::{Days, Local};

    fn seeded_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        seed_if_empty(&conn).unwrap();
        conn
    }

    #[test]
    fn create_then_fetch_round_trips() {
        let conn = seeded_conn();
        let created = create_borrower(&conn, "Dana Liu", "dana@example.com", "555-0199").unwrap();

        let borrowers = fetch_borrowers(&conn).unwrap();
        assert_eq!(borrowers.len(), 4);
        let fetched = borrowers.iter().find(|b| b.id == created.id).unwrap();
        assert_eq!(fetched.name, "Dana Liu");
        assert_eq!(fetched.email, "dana@example.com");
        assert_eq!(fetched.phone, "555-0199");
    }

    #[test]
    fn deleting_a_borrower_with_loans_is_refused() {
        let conn = seeded_conn();
        let due = Local::now().date_naive() + Days::new(7);
        borrow_book(&conn, 1, 1, due).unwrap();

        let err = delete_borrower(&conn, 1).unwrap_err();
        assert_eq!(
            err.downcast::<CatalogError>().unwrap(),
            CatalogError::BorrowerHasLoans
        );

        let borrowers = fetch_borrowers(&conn).unwrap();
        assert!(borrowers.iter().any(|b| b.id == 1));
    }

    #[test]
    fn deletion_succeeds_once_the_loan_is_returned() {
        let conn = seeded_conn();
        let due = Local::now().date_naive() + Days::new(7);
        borrow_book(&conn, 1, 1, due).unwrap();
        return_book(&conn, 1).unwrap();

        delete_borrower(&conn, 1).unwrap();
        let borrowers = fetch_borrowers(&conn).unwrap();
        assert!(borrowers.iter().all(|b| b.id != 1));
    }

    #[test]
    fn deleting_an_unknown_borrower_errors() {
        let conn = seeded_conn();
        let err = delete_borrower(&conn, 99).unwrap_err();
        assert_eq!(
            err.downcast::<CatalogError>().unwrap(),
            CatalogError::BorrowerNotFound
        );
    }

    #[test]
    fn loan_probe_reflects_current_state() {
        let conn = seeded_conn();
        assert!(!borrower_has_loans(&conn, 2).unwrap());

        let due = Local::now().date_naive() + Days::new(3);
        borrow_book(&conn, 5, 2, due).unwrap();
        assert!(borrower_has_loans(&conn, 2).unwrap());

        return_book(&conn, 5).unwrap();
        assert!(!borrower_has_loans(&conn, 2).unwrap());
    }
}
