use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use rusqlite::{params, Connection};

use crate::models::LoanStatus;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".library-catalog-manager";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "library.sqlite";

/// Sample catalog inserted the first time the application runs against an
/// empty store, so there is something to browse immediately.
const SAMPLE_BOOKS: &[(&str, &str, i64, &str)] = &[
    ("To Kill a Mockingbird", "Harper Lee", 1960, "Fiction"),
    ("1984", "George Orwell", 1949, "Dystopian"),
    ("Pride and Prejudice", "Jane Austen", 1813, "Romance"),
    ("The Great Gatsby", "F. Scott Fitzgerald", 1925, "Fiction"),
    ("The Catcher in the Rye", "J.D. Salinger", 1951, "Fiction"),
];

/// Placeholder borrowers seeded alongside the sample catalog.
const SAMPLE_BORROWERS: &[(&str, &str, &str)] = &[
    ("Alice Carver", "alice.carver@example.com", "555-0101"),
    ("Ben Ortiz", "ben.ortiz@example.com", "555-0102"),
    ("Carol Whitfield", "carol.whitfield@example.com", "555-0103"),
];

/// Ensure the data directory exists and open the on-disk database. Failure
/// here is fatal to startup; there is no degraded mode without storage.
pub fn open_default() -> Result<Connection> {
    let db_path = db_path()?;

    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent).context("failed to create data directory")?;
    }

    Connection::open(&db_path).context("failed to open SQLite database")
}

/// Create the `books` and `borrowers` tables if they are missing. Safe to
/// call on every process start.
///
/// The schema deliberately declares no foreign key from `books.borrower_id`
/// to `borrowers.id`: the deletion guard lives in the service layer, and
/// storage itself never cascades or blocks.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS books (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            author TEXT NOT NULL,
            year INTEGER,
            genre TEXT,
            status TEXT DEFAULT 'Available',
            borrower_id INTEGER,
            borrow_date TEXT,
            return_date TEXT
        )",
        [],
    )
    .context("failed to create books table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS borrowers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT,
            phone TEXT
        )",
        [],
    )
    .context("failed to create borrowers table")?;

    Ok(())
}

/// Seed each table with its fixed sample rows when it holds no data. The two
/// checks are independent: an empty `borrowers` table gets seeded even when
/// `books` already has rows, and vice versa.
pub fn seed_if_empty(conn: &Connection) -> Result<()> {
    let book_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
        .context("failed to count books")?;

    if book_count == 0 {
        for (title, author, year, genre) in SAMPLE_BOOKS {
            conn.execute(
                "INSERT INTO books (title, author, year, genre, status) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![title, author, year, genre, LoanStatus::Available],
            )
            .context("failed to seed sample book")?;
        }
    }

    let borrower_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM borrowers", [], |row| row.get(0))
        .context("failed to count borrowers")?;

    if borrower_count == 0 {
        for (name, email, phone) in SAMPLE_BORROWERS {
            conn.execute(
                "INSERT INTO borrowers (name, email, phone) VALUES (?1, ?2, ?3)",
                params![name, email, phone],
            )
            .context("failed to seed sample borrower")?;
        }
    }

    Ok(())
}

/// Resolve the absolute path to the SQLite database inside the user's home.
fn db_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME).join(DB_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        conn
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })
        .unwrap()
    }

    #[test]
    fn schema_creation_is_idempotent() {
        let conn = fresh_conn();
        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();
    }

    #[test]
    fn seeding_fills_both_tables_once() {
        let conn = fresh_conn();
        seed_if_empty(&conn).unwrap();
        assert_eq!(count(&conn, "books"), 5);
        assert_eq!(count(&conn, "borrowers"), 3);

        seed_if_empty(&conn).unwrap();
        assert_eq!(count(&conn, "books"), 5);
        assert_eq!(count(&conn, "borrowers"), 3);
    }

    #[test]
    fn seeded_books_start_available() {
        let conn = fresh_conn();
        seed_if_empty(&conn).unwrap();
        let borrowed: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM books
                 WHERE status <> 'Available'
                    OR borrower_id IS NOT NULL
                    OR borrow_date IS NOT NULL
                    OR return_date IS NOT NULL",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(borrowed, 0);
    }

    #[test]
    fn table_seeds_are_independent() {
        let conn = fresh_conn();
        conn.execute(
            "INSERT INTO books (title, author) VALUES ('Dune', 'Frank Herbert')",
            [],
        )
        .unwrap();

        seed_if_empty(&conn).unwrap();
        assert_eq!(count(&conn, "books"), 1);
        assert_eq!(count(&conn, "borrowers"), 3);
    }

    #[test]
    fn file_backed_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DB_FILE_NAME);

        let conn = Connection::open(&path).unwrap();
        ensure_schema(&conn).unwrap();
        seed_if_empty(&conn).unwrap();
        drop(conn);

        let reopened = Connection::open(&path).unwrap();
        ensure_schema(&reopened).unwrap();
        assert_eq!(count(&reopened, "books"), 5);
    }
}
