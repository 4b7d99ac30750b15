//! Binary entry point that glues the SQLite-backed catalog to the TUI. The
//! bootstrapping pipeline is: open the database, make sure the schema exists,
//! seed the sample data on first run, hydrate the initial app state, and
//! drive the Ratatui event loop until the user exits.
use library_catalog_manager::{ensure_schema, fetch_books, open_default, run_app, seed_if_empty, App};

/// Initialize persistence, load the catalog, and launch the Ratatui event
/// loop.
///
/// Returning a `Result` bubbles up fatal initialization problems (for example
/// an unwritable home directory) to the terminal instead of crashing
/// silently.
fn main() -> anyhow::Result<()> {
    let conn = open_default()?;
    ensure_schema(&conn)?;
    seed_if_empty(&conn)?;
    let books = fetch_books(&conn, None)?;

    let mut app = App::new(conn, books);
    run_app(&mut app)
}
