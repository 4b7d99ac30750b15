use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use rusqlite::{params, Connection, Row};

use crate::error::CatalogError;
use crate::models::{Book, LoanStatus};

/// Map one row of the list query into a `Book`. Column order matches
/// `BOOK_COLUMNS` below.
fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        year: row.get(3)?,
        genre: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        status: row.get(5)?,
        borrower_id: row.get(6)?,
        borrow_date: row.get(7)?,
        return_date: row.get(8)?,
        borrowed_by: row.get(9)?,
    })
}

const BOOK_COLUMNS: &str = "b.id, b.title, b.author, b.year, b.genre, b.status,
       b.borrower_id, b.borrow_date, b.return_date, br.name";

/// Retrieve every book joined with its borrower's name, ordered by id. With a
/// filter, keep only rows whose title or author contains the text,
/// case-insensitively. The query doubles as the single source of truth for
/// how the UI orders and enriches book rows.
pub fn fetch_books(conn: &Connection, filter: Option<&str>) -> Result<Vec<Book>> {
    let books = match filter {
        Some(needle) if !needle.trim().is_empty() => {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {BOOK_COLUMNS}
                     FROM books b
                     LEFT JOIN borrowers br ON b.borrower_id = br.id
                     WHERE INSTR(LOWER(b.title), LOWER(?1)) > 0
                        OR INSTR(LOWER(b.author), LOWER(?1)) > 0
                     ORDER BY b.id"
                ))
                .context("failed to prepare filtered book query")?;
            let books = stmt
                .query_map([needle.trim()], book_from_row)
                .context("failed to load books")?
                .collect::<Result<Vec<_>, _>>()
                .context("failed to collect books")?;
            books
        }
        _ => {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {BOOK_COLUMNS}
                     FROM books b
                     LEFT JOIN borrowers br ON b.borrower_id = br.id
                     ORDER BY b.id"
                ))
                .context("failed to prepare book query")?;
            let books = stmt
                .query_map([], book_from_row)
                .context("failed to load books")?
                .collect::<Result<Vec<_>, _>>()
                .context("failed to collect books")?;
            books
        }
    };

    Ok(books)
}

/// Insert a new book, returning the hydrated struct so the caller can show it
/// without re-querying. New books always start available with every loan
/// field empty.
pub fn create_book(
    conn: &Connection,
    title: &str,
    author: &str,
    year: Option<i64>,
    genre: &str,
) -> Result<Book> {
    conn.execute(
        "INSERT INTO books (title, author, year, genre, status) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![title, author, year, genre, LoanStatus::Available],
    )
    .context("failed to insert book")?;

    let id = conn.last_insert_rowid();
    Ok(Book {
        id,
        title: title.to_string(),
        author: author.to_string(),
        year,
        genre: genre.to_string(),
        status: LoanStatus::Available,
        borrower_id: None,
        borrow_date: None,
        return_date: None,
        borrowed_by: None,
    })
}

/// Overwrite the four editable fields of an existing book. The loan columns
/// are untouched, so editing a borrowed book keeps its loan intact. We
/// surface an explicit error when nothing was updated so the UI can show a
/// friendly message instead of silently continuing.
pub fn update_book(
    conn: &Connection,
    id: i64,
    title: &str,
    author: &str,
    year: Option<i64>,
    genre: &str,
) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE books SET title = ?1, author = ?2, year = ?3, genre = ?4 WHERE id = ?5",
            params![title, author, year, genre, id],
        )
        .context("failed to update book")?;

    if updated == 0 {
        Err(CatalogError::BookNotFound.into())
    } else {
        Ok(())
    }
}

/// Remove a book row unconditionally, loan or no loan.
pub fn delete_book(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn
        .execute("DELETE FROM books WHERE id = ?1", params![id])
        .context("failed to delete book")?;

    if deleted == 0 {
        Err(CatalogError::BookNotFound.into())
    } else {
        Ok(())
    }
}

/// Record a loan: one UPDATE moves the status and all three loan fields
/// together, with the borrow date computed here as today. The statement does
/// not check current availability, so issuing it against an already borrowed
/// book overwrites the previous loan record; callers gate the action on the
/// book being available.
pub fn borrow_book(
    conn: &Connection,
    book_id: i64,
    borrower_id: i64,
    return_date: NaiveDate,
) -> Result<()> {
    let borrow_date = Local::now().date_naive();
    let updated = conn
        .execute(
            "UPDATE books SET status = ?1, borrower_id = ?2, borrow_date = ?3, return_date = ?4
             WHERE id = ?5",
            params![
                LoanStatus::Borrowed,
                borrower_id,
                borrow_date,
                return_date,
                book_id
            ],
        )
        .context("failed to record loan")?;

    if updated == 0 {
        Err(CatalogError::BookNotFound.into())
    } else {
        Ok(())
    }
}

/// Clear a loan: the status and all three loan fields move back together.
/// Returning an already available book rewrites the same values, which is
/// harmless.
pub fn return_book(conn: &Connection, book_id: i64) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE books SET status = ?1, borrower_id = NULL, borrow_date = NULL,
             return_date = NULL WHERE id = ?2",
            params![LoanStatus::Available, book_id],
        )
        .context("failed to record return")?;

    if updated == 0 {
        Err(CatalogError::BookNotFound.into())
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::{ensure_schema, seed_if_empty};

    fn seeded_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        seed_if_empty(&conn).unwrap();
        conn
    }

    fn due(days_out: u64) -> NaiveDate {
        Local::now().date_naive() + chrono::Days::new(days_out)
    }

    #[test]
    fn create_then_fetch_round_trips() {
        let conn = seeded_conn();
        let created = create_book(&conn, "Dune", "Frank Herbert", Some(1965), "Sci-Fi").unwrap();

        let books = fetch_books(&conn, None).unwrap();
        assert_eq!(books.len(), 6);

        let fetched = books.iter().find(|b| b.id == created.id).unwrap();
        assert_eq!(fetched.title, "Dune");
        assert_eq!(fetched.author, "Frank Herbert");
        assert_eq!(fetched.year, Some(1965));
        assert_eq!(fetched.genre, "Sci-Fi");
        assert!(fetched.is_available());
        assert!(fetched.borrower_id.is_none());
        assert!(fetched.borrow_date.is_none());
        assert!(fetched.return_date.is_none());
        assert!(fetched.borrowed_by.is_none());
    }

    #[test]
    fn filter_matches_title_case_insensitively() {
        let conn = seeded_conn();
        let books = fetch_books(&conn, Some("gatsby")).unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "The Great Gatsby");
    }

    #[test]
    fn filter_matches_author_too() {
        let conn = seeded_conn();
        let books = fetch_books(&conn, Some("ORWELL")).unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "1984");
    }

    #[test]
    fn blank_filter_returns_everything() {
        let conn = seeded_conn();
        assert_eq!(fetch_books(&conn, Some("  ")).unwrap().len(), 5);
        assert_eq!(fetch_books(&conn, Some("zzzz")).unwrap().len(), 0);
    }

    #[test]
    fn borrowing_sets_all_loan_fields_together() {
        let conn = seeded_conn();
        borrow_book(&conn, 1, 1, due(10)).unwrap();

        let books = fetch_books(&conn, None).unwrap();
        let book = books.iter().find(|b| b.id == 1).unwrap();
        assert_eq!(book.status, LoanStatus::Borrowed);
        assert_eq!(book.borrower_id, Some(1));
        assert_eq!(book.borrow_date, Some(Local::now().date_naive()));
        assert_eq!(book.return_date, Some(due(10)));
        assert_eq!(book.borrowed_by.as_deref(), Some("Alice Carver"));
    }

    #[test]
    fn returning_clears_all_loan_fields_together() {
        let conn = seeded_conn();
        borrow_book(&conn, 2, 1, due(5)).unwrap();
        return_book(&conn, 2).unwrap();

        let books = fetch_books(&conn, None).unwrap();
        let book = books.iter().find(|b| b.id == 2).unwrap();
        assert_eq!(book.status, LoanStatus::Available);
        assert!(book.borrower_id.is_none());
        assert!(book.borrow_date.is_none());
        assert!(book.return_date.is_none());
        assert!(book.borrowed_by.is_none());
    }

    #[test]
    fn returning_an_available_book_changes_nothing() {
        let conn = seeded_conn();
        let before = fetch_books(&conn, None).unwrap();

        return_book(&conn, 3).unwrap();

        let after = fetch_books(&conn, None).unwrap();
        assert_eq!(before.len(), after.len());
        let b = &before[2];
        let a = &after[2];
        assert_eq!(a.status, b.status);
        assert_eq!(a.title, b.title);
        assert!(a.borrower_id.is_none());
        assert!(a.borrow_date.is_none());
        assert!(a.return_date.is_none());
    }

    #[test]
    fn editing_a_borrowed_book_keeps_its_loan() {
        let conn = seeded_conn();
        borrow_book(&conn, 1, 2, due(7)).unwrap();
        update_book(&conn, 1, "To Kill a Mockingbird", "Harper Lee", Some(1960), "Classic")
            .unwrap();

        let books = fetch_books(&conn, None).unwrap();
        let book = books.iter().find(|b| b.id == 1).unwrap();
        assert_eq!(book.genre, "Classic");
        assert_eq!(book.status, LoanStatus::Borrowed);
        assert_eq!(book.borrower_id, Some(2));
        assert_eq!(book.borrowed_by.as_deref(), Some("Ben Ortiz"));
    }

    #[test]
    fn second_borrow_overwrites_the_first_loan() {
        let conn = seeded_conn();
        borrow_book(&conn, 1, 1, due(5)).unwrap();
        borrow_book(&conn, 1, 2, due(12)).unwrap();

        let books = fetch_books(&conn, None).unwrap();
        let book = books.iter().find(|b| b.id == 1).unwrap();
        assert_eq!(book.borrower_id, Some(2));
        assert_eq!(book.return_date, Some(due(12)));
    }

    #[test]
    fn deleting_a_book_removes_it() {
        let conn = seeded_conn();
        delete_book(&conn, 4).unwrap();
        let books = fetch_books(&conn, None).unwrap();
        assert_eq!(books.len(), 4);
        assert!(books.iter().all(|b| b.id != 4));
    }

    #[test]
    fn stale_ids_error_without_side_effects() {
        let conn = seeded_conn();

        let update = update_book(&conn, 99, "x", "y", None, "");
        assert_eq!(
            update.unwrap_err().downcast::<CatalogError>().unwrap(),
            CatalogError::BookNotFound
        );

        assert!(delete_book(&conn, 99).is_err());
        assert!(borrow_book(&conn, 99, 1, due(1)).is_err());
        assert!(return_book(&conn, 99).is_err());

        assert_eq!(fetch_books(&conn, None).unwrap().len(), 5);
    }
}
