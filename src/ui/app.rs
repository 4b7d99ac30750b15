use std::cmp::min;
use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use open::that as open_link;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use rusqlite::Connection;

use crate::db::{
    borrow_book, create_book, create_borrower, delete_book, delete_borrower, fetch_books,
    fetch_borrowers, return_book, update_book,
};
use crate::models::{Book, Borrower, LoanStatus};

use super::forms::{
    BookField, BookForm, BorrowForm, BorrowerField, BorrowerForm, ConfirmBookDelete,
    ConfirmBorrowerDelete,
};
use super::helpers::{centered_rect, surface_error};
use super::screens::{BookScreen, BorrowerScreen};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Height allocation per book card in the catalog list.
const BOOK_CARD_HEIGHT: u16 = 5;
/// Height allocation per borrower card in the roster list.
const BORROWER_CARD_HEIGHT: u16 = 5;

/// High-level navigation states. Keeping this explicit makes it easy to reason
/// about which rendering path runs and what keyboard shortcuts should do.
enum Screen {
    Books(BookScreen),
    Borrowers(BorrowerScreen),
}

/// Fine-grained modes scoped to the current screen.
enum Mode {
    Normal,
    AddingBook(BookForm),
    EditingBook {
        id: i64,
        form: BookForm,
    },
    ConfirmBookDelete(ConfirmBookDelete),
    Borrowing {
        book_id: i64,
        book_title: String,
        form: BorrowForm,
    },
    AddingBorrower(BorrowerForm),
    ConfirmBorrowerDelete(ConfirmBorrowerDelete),
    Searching(SearchState),
}

/// State for an active inline search over the catalog.
struct SearchState {
    query: String,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    conn: Connection,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(conn: Connection, books: Vec<Book>) -> Self {
        Self {
            conn,
            screen: Screen::Books(BookScreen::new(books)),
            mode: Mode::Normal,
            status: None,
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mut mode = mem::replace(&mut self.mode, Mode::Normal);

        mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::AddingBook(form) => self.handle_add_book(code, form)?,
            Mode::EditingBook { id, form } => self.handle_edit_book(code, id, form)?,
            Mode::ConfirmBookDelete(confirm) => self.handle_confirm_book_delete(code, confirm)?,
            Mode::Borrowing {
                book_id,
                book_title,
                form,
            } => self.handle_borrow(code, book_id, book_title, form)?,
            Mode::AddingBorrower(form) => self.handle_add_borrower(code, form)?,
            Mode::ConfirmBorrowerDelete(confirm) => {
                self.handle_confirm_borrower_delete(code, confirm)?
            }
            Mode::Searching(state) => self.handle_search(code, state)?,
        };

        self.mode = mode;
        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match self.screen {
            Screen::Books(ref mut books) => {
                let mut status_to_set: Option<(String, StatusKind)> = None;
                let mut next_mode: Option<Mode> = None;
                let mut open_borrowers = false;
                let mut borrow_target: Option<Book> = None;
                let mut return_target: Option<Book> = None;

                {
                    let books = &mut *books;
                    match code {
                        KeyCode::Char('q') | KeyCode::Esc => {
                            *exit = true;
                        }
                        KeyCode::Up => books.move_selection(-1),
                        KeyCode::Down => books.move_selection(1),
                        KeyCode::PageUp => books.move_selection(-5),
                        KeyCode::PageDown => books.move_selection(5),
                        KeyCode::Home => books.select_first(),
                        KeyCode::End => books.select_last(),
                        KeyCode::Tab => {
                            open_borrowers = true;
                        }
                        KeyCode::Char('f') => {
                            next_mode = Some(Mode::Searching(SearchState {
                                query: String::new(),
                            }));
                        }
                        KeyCode::Char('+') => {
                            next_mode = Some(Mode::AddingBook(BookForm::default()));
                        }
                        KeyCode::Char('e') | KeyCode::Char('E') => {
                            if let Some(book) = books.current_book().cloned() {
                                next_mode = Some(Mode::EditingBook {
                                    id: book.id,
                                    form: BookForm::from_book(&book),
                                });
                            } else {
                                status_to_set = Some((
                                    "No book selected to edit.".to_string(),
                                    StatusKind::Error,
                                ));
                            }
                        }
                        KeyCode::Char('-') => {
                            if let Some(book) = books.current_book().cloned() {
                                next_mode =
                                    Some(Mode::ConfirmBookDelete(ConfirmBookDelete::from(book)));
                            } else {
                                status_to_set = Some((
                                    "No book selected to remove.".to_string(),
                                    StatusKind::Error,
                                ));
                            }
                        }
                        KeyCode::Char('b') | KeyCode::Char('B') => {
                            if let Some(book) = books.current_book().cloned() {
                                borrow_target = Some(book);
                            } else {
                                status_to_set = Some((
                                    "No book selected to lend.".to_string(),
                                    StatusKind::Error,
                                ));
                            }
                        }
                        KeyCode::Char('r') | KeyCode::Char('R') => {
                            if let Some(book) = books.current_book().cloned() {
                                return_target = Some(book);
                            } else {
                                status_to_set = Some((
                                    "No book selected to return.".to_string(),
                                    StatusKind::Error,
                                ));
                            }
                        }
                        _ => {}
                    }
                }

                if let Some(mode) = next_mode {
                    self.clear_status();
                    return Ok(mode);
                }

                if open_borrowers {
                    self.clear_status();
                    self.open_borrowers_view()?;
                    return Ok(Mode::Normal);
                }

                if let Some(book) = borrow_target {
                    if !book.is_available() {
                        let holder = book
                            .borrowed_by
                            .clone()
                            .unwrap_or_else(|| "another borrower".to_string());
                        self.set_status(
                            format!("'{}' is already on loan to {holder}.", book.title),
                            StatusKind::Error,
                        );
                        return Ok(Mode::Normal);
                    }

                    let borrowers = fetch_borrowers(&self.conn)?;
                    if borrowers.is_empty() {
                        self.set_status(
                            "No borrowers on file. Press Tab to add one first.",
                            StatusKind::Error,
                        );
                        return Ok(Mode::Normal);
                    }

                    self.clear_status();
                    return Ok(Mode::Borrowing {
                        book_id: book.id,
                        book_title: book.title,
                        form: BorrowForm::new(borrowers),
                    });
                }

                if let Some(book) = return_target {
                    if book.is_available() {
                        self.set_status(
                            format!("'{}' is not on loan.", book.title),
                            StatusKind::Error,
                        );
                    } else {
                        match return_book(&self.conn, book.id) {
                            Ok(()) => {
                                self.reload_books(Some(book.id))?;
                                self.set_status(
                                    format!("Returned '{}'.", book.title),
                                    StatusKind::Info,
                                );
                            }
                            Err(err) => {
                                let message = surface_error(&err);
                                self.set_status(message, StatusKind::Error);
                            }
                        }
                    }
                    return Ok(Mode::Normal);
                }

                if let Some((text, kind)) = status_to_set {
                    self.set_status(text, kind);
                }

                Ok(Mode::Normal)
            }
            Screen::Borrowers(ref mut roster) => {
                let mut status_to_set: Option<(String, StatusKind)> = None;
                let mut next_mode: Option<Mode> = None;
                let mut back_to_books = false;
                let mut email_target: Option<Borrower> = None;

                {
                    let roster = &mut *roster;
                    match code {
                        KeyCode::Char('q') => {
                            *exit = true;
                        }
                        KeyCode::Esc | KeyCode::Tab => {
                            back_to_books = true;
                        }
                        KeyCode::Up => roster.move_selection(-1),
                        KeyCode::Down => roster.move_selection(1),
                        KeyCode::PageUp => roster.move_selection(-5),
                        KeyCode::PageDown => roster.move_selection(5),
                        KeyCode::Home => roster.select_first(),
                        KeyCode::End => roster.select_last(),
                        KeyCode::Char('+') => {
                            next_mode = Some(Mode::AddingBorrower(BorrowerForm::default()));
                        }
                        KeyCode::Char('-') => {
                            if let Some(borrower) = roster.current_borrower().cloned() {
                                next_mode = Some(Mode::ConfirmBorrowerDelete(
                                    ConfirmBorrowerDelete::from(borrower),
                                ));
                            } else {
                                status_to_set = Some((
                                    "No borrower selected to remove.".to_string(),
                                    StatusKind::Error,
                                ));
                            }
                        }
                        KeyCode::Enter => {
                            email_target = roster.current_borrower().cloned();
                        }
                        _ => {}
                    }
                }

                if let Some(mode) = next_mode {
                    self.clear_status();
                    return Ok(mode);
                }

                if back_to_books {
                    self.clear_status();
                    self.open_books_view()?;
                    return Ok(Mode::Normal);
                }

                if let Some(borrower) = email_target {
                    let email = borrower.email.trim().to_string();
                    if email.is_empty() {
                        self.set_status(
                            format!("{} has no email on file.", borrower.name),
                            StatusKind::Error,
                        );
                    } else if let Err(err) = open_link(format!("mailto:{email}")) {
                        self.set_status(
                            format!("Failed to open mail draft: {err}"),
                            StatusKind::Error,
                        );
                    } else {
                        self.set_status(
                            format!("Opened mail draft for {}.", borrower.name),
                            StatusKind::Info,
                        );
                    }
                } else if let Some((text, kind)) = status_to_set {
                    self.set_status(text, kind);
                }

                Ok(Mode::Normal)
            }
        }
    }

    fn handle_add_book(&mut self, code: KeyCode, mut form: BookForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Add cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_new_book(&form) {
                Ok(()) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::AddingBook(form))
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_edit_book(&mut self, code: KeyCode, id: i64, mut form: BookForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_existing_book(id, &form) {
                Ok(()) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::EditingBook { id, form })
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_confirm_book_delete(
        &mut self,
        code: KeyCode,
        confirm: ConfirmBookDelete,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_book_delete(&confirm) {
                    Ok(()) => Ok(Mode::Normal),
                    Err(err) => {
                        let message = surface_error(&err);
                        self.set_status(message, StatusKind::Error);
                        Ok(Mode::ConfirmBookDelete(confirm))
                    }
                }
            }
            _ => Ok(Mode::ConfirmBookDelete(confirm)),
        }
    }

    fn handle_borrow(
        &mut self,
        code: KeyCode,
        book_id: i64,
        book_title: String,
        mut form: BorrowForm,
    ) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Loan cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Up => {
                if !form.date_active {
                    form.move_selection(-1);
                }
            }
            KeyCode::Down => {
                if !form.date_active {
                    form.move_selection(1);
                }
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match form.parse_inputs() {
                Ok((borrower_id, return_date)) => {
                    let borrower_name = form
                        .current_borrower()
                        .map(|b| b.name.clone())
                        .unwrap_or_default();
                    match borrow_book(&self.conn, book_id, borrower_id, return_date) {
                        Ok(()) => {
                            self.reload_books(Some(book_id))?;
                            self.set_status(
                                format!("Lent '{book_title}' to {borrower_name}."),
                                StatusKind::Info,
                            );
                            keep_open = false;
                        }
                        Err(err) => {
                            let message = surface_error(&err);
                            form.error = Some(message.clone());
                            self.set_status(message, StatusKind::Error);
                        }
                    }
                }
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::Borrowing {
                book_id,
                book_title,
                form,
            })
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_add_borrower(&mut self, code: KeyCode, mut form: BorrowerForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Add cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_new_borrower(&form) {
                Ok(()) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::AddingBorrower(form))
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_confirm_borrower_delete(
        &mut self,
        code: KeyCode,
        confirm: ConfirmBorrowerDelete,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_borrower_delete(&confirm) {
                    Ok(()) => Ok(Mode::Normal),
                    Err(err) => {
                        let message = surface_error(&err);
                        self.set_status(message, StatusKind::Error);
                        Ok(Mode::ConfirmBorrowerDelete(confirm))
                    }
                }
            }
            _ => Ok(Mode::ConfirmBorrowerDelete(confirm)),
        }
    }

    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Result<Mode> {
        if !matches!(self.screen, Screen::Books(_)) {
            return Ok(Mode::Normal);
        }

        match code {
            KeyCode::Esc => {
                self.apply_book_filter("")?;
                return Ok(Mode::Normal);
            }
            KeyCode::Enter => {
                // Keep the narrowed list on screen and drop back to normal
                // navigation.
                return Ok(Mode::Normal);
            }
            KeyCode::Up | KeyCode::Down | KeyCode::PageUp | KeyCode::PageDown => {
                if let Screen::Books(ref mut books) = self.screen {
                    let offset = match code {
                        KeyCode::Up => -1,
                        KeyCode::Down => 1,
                        KeyCode::PageUp => -5,
                        _ => 5,
                    };
                    books.move_selection(offset);
                }
                return Ok(Mode::Searching(state));
            }
            KeyCode::Home => {
                if let Screen::Books(ref mut books) = self.screen {
                    books.select_first();
                }
                return Ok(Mode::Searching(state));
            }
            KeyCode::End => {
                if let Screen::Books(ref mut books) = self.screen {
                    books.select_last();
                }
                return Ok(Mode::Searching(state));
            }
            KeyCode::Backspace => {
                state.query.pop();
            }
            KeyCode::Char(ch) => {
                if !ch.is_control() {
                    state.query.push(ch);
                }
            }
            _ => return Ok(Mode::Searching(state)),
        }

        self.apply_book_filter(&state.query)?;
        Ok(Mode::Searching(state))
    }

    /// Re-run the catalog query with the current filter and replace the rows
    /// on screen, optionally restoring the selection to a given book.
    fn reload_books(&mut self, select: Option<i64>) -> Result<()> {
        if let Screen::Books(ref mut books) = self.screen {
            let rows = fetch_books(&self.conn, books.filter.as_deref())?;
            books.set_books(rows);
            if let Some(id) = select {
                books.select_id(id);
            }
        }
        Ok(())
    }

    /// Re-run the roster query and replace the rows on screen.
    fn reload_borrowers(&mut self) -> Result<()> {
        if let Screen::Borrowers(ref mut roster) = self.screen {
            let rows = fetch_borrowers(&self.conn)?;
            roster.set_borrowers(rows);
        }
        Ok(())
    }

    /// Install a new search filter and refresh the catalog through it.
    fn apply_book_filter(&mut self, query: &str) -> Result<()> {
        if let Screen::Books(ref mut books) = self.screen {
            books.filter = if query.trim().is_empty() {
                None
            } else {
                Some(query.to_string())
            };
        }
        self.reload_books(None)
    }

    fn open_books_view(&mut self) -> Result<()> {
        let books = fetch_books(&self.conn, None)?;
        self.screen = Screen::Books(BookScreen::new(books));
        Ok(())
    }

    fn open_borrowers_view(&mut self) -> Result<()> {
        let borrowers = fetch_borrowers(&self.conn)?;
        self.screen = Screen::Borrowers(BorrowerScreen::new(borrowers));
        Ok(())
    }

    fn save_new_book(&mut self, form: &BookForm) -> Result<()> {
        let (title, author, year, genre) = form.parse_inputs()?;
        let book = create_book(&self.conn, &title, &author, year, &genre)?;
        self.reload_books(Some(book.id))?;
        self.set_status(format!("Added '{}'.", book.title), StatusKind::Info);
        Ok(())
    }

    fn save_existing_book(&mut self, id: i64, form: &BookForm) -> Result<()> {
        let (title, author, year, genre) = form.parse_inputs()?;
        update_book(&self.conn, id, &title, &author, year, &genre)?;
        self.reload_books(Some(id))?;
        self.set_status(format!("Updated '{title}'."), StatusKind::Info);
        Ok(())
    }

    fn perform_book_delete(&mut self, confirm: &ConfirmBookDelete) -> Result<()> {
        delete_book(&self.conn, confirm.id)?;
        self.reload_books(None)?;
        self.set_status(format!("Deleted '{}'.", confirm.title), StatusKind::Info);
        Ok(())
    }

    fn save_new_borrower(&mut self, form: &BorrowerForm) -> Result<()> {
        let (name, email, phone) = form.parse_inputs()?;
        let borrower = create_borrower(&self.conn, &name, &email, &phone)?;
        self.reload_borrowers()?;
        self.set_status(
            format!("Added borrower {}.", borrower.name),
            StatusKind::Info,
        );
        Ok(())
    }

    fn perform_borrower_delete(&mut self, confirm: &ConfirmBorrowerDelete) -> Result<()> {
        delete_borrower(&self.conn, confirm.id)?;
        self.reload_borrowers()?;
        self.set_status(
            format!("Deleted borrower {}.", confirm.name),
            StatusKind::Info,
        );
        Ok(())
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Books(books) => self.draw_books(frame, content_area, books),
            Screen::Borrowers(roster) => self.draw_borrowers(frame, content_area, roster),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingBook(form) => self.draw_book_form(frame, area, "Add Book", form),
            Mode::EditingBook { form, .. } => self.draw_book_form(frame, area, "Edit Book", form),
            Mode::ConfirmBookDelete(confirm) => self.draw_confirm_book(frame, area, confirm),
            Mode::Borrowing {
                book_title, form, ..
            } => self.draw_borrow_dialog(frame, area, book_title, form),
            Mode::AddingBorrower(form) => self.draw_borrower_form(frame, area, form),
            Mode::ConfirmBorrowerDelete(confirm) => {
                self.draw_confirm_borrower(frame, area, confirm)
            }
            Mode::Searching(state) => self.draw_search_bar(frame, area, state),
            Mode::Normal => {}
        }
    }

    fn draw_books(&self, frame: &mut Frame, area: Rect, books: &BookScreen) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(1)])
            .split(area);

        let mut header_lines = vec![Line::from(vec![
            Span::styled(
                "Library Catalog",
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("  •  {} books", books.books.len())),
        ])];
        if let Some(filter) = &books.filter {
            header_lines.push(Line::from(Span::styled(
                format!("Showing matches for '{filter}'"),
                Style::default().fg(Color::Yellow),
            )));
        } else {
            header_lines.push(Line::from(Span::styled(
                "Press 'f' to search by title or author",
                Style::default().fg(Color::Gray),
            )));
        }

        let header = Paragraph::new(header_lines)
            .alignment(Alignment::Left)
            .block(Block::default().borders(Borders::ALL).title("Books"));
        frame.render_widget(header, chunks[0]);

        if books.books.is_empty() {
            let message_text = if books.filter.is_some() {
                "No books match the current search."
            } else {
                "No books yet. Press '+' to add one."
            };
            let message = Paragraph::new(message_text)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(message, chunks[1]);
            return;
        }

        self.render_book_cards(frame, chunks[1], &books.books, books.selected);
    }

    fn render_book_cards(&self, frame: &mut Frame, area: Rect, books: &[Book], selected: usize) {
        if books.is_empty() || area.height == 0 {
            return;
        }

        let card_height = BOOK_CARD_HEIGHT as usize;
        let capacity = ((area.height as usize) / card_height).max(1);
        let len = books.len();
        let mut start = if selected >= capacity {
            selected + 1 - capacity
        } else {
            0
        };
        if start + capacity > len {
            start = len.saturating_sub(capacity);
        }
        let end = min(start + capacity, len);
        let visible_len = end.saturating_sub(start);
        if visible_len == 0 {
            return;
        }

        let constraints: Vec<Constraint> = (0..visible_len)
            .map(|_| Constraint::Length(BOOK_CARD_HEIGHT))
            .collect();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        for (idx, chunk) in rows.iter().enumerate() {
            if chunk.height == 0 {
                continue;
            }

            let book_index = start + idx;
            if book_index >= len {
                break;
            }

            let book = &books[book_index];
            let mut block = Block::default().borders(Borders::ALL);
            let mut paragraph_style = Style::default();
            if book_index == selected {
                block = block.style(Style::default().fg(Color::Yellow));
                paragraph_style = Style::default().fg(Color::Yellow);
            }

            let mut lines = Vec::new();
            let title = if book_index == selected {
                format!("▶ {}", book.title)
            } else {
                book.title.clone()
            };
            lines.push(Line::from(Span::styled(
                title,
                Style::default().add_modifier(Modifier::BOLD),
            )));

            let mut details = book.author.clone();
            if let Some(year) = book.year {
                details.push_str(&format!(" ({year})"));
            }
            if !book.genre.trim().is_empty() {
                details.push_str(&format!("  •  {}", book.genre.trim()));
            }
            lines.push(Line::from(Span::styled(
                details,
                Style::default().fg(Color::Gray),
            )));

            let loan_line = match book.status {
                LoanStatus::Available => Span::styled(
                    "Available",
                    Style::default().fg(Color::Green),
                ),
                LoanStatus::Borrowed => {
                    let holder = book.borrowed_by.as_deref().unwrap_or("unknown borrower");
                    let due = book
                        .return_date
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "unknown".to_string());
                    Span::styled(
                        format!("On loan to {holder}, due {due}"),
                        Style::default().fg(Color::Magenta),
                    )
                }
            };
            lines.push(Line::from(loan_line));

            let paragraph = Paragraph::new(lines)
                .block(block)
                .wrap(Wrap { trim: true })
                .alignment(Alignment::Left)
                .style(paragraph_style);

            frame.render_widget(paragraph, *chunk);
        }
    }

    fn draw_borrowers(&self, frame: &mut Frame, area: Rect, roster: &BorrowerScreen) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1)])
            .split(area);

        let header = Paragraph::new(Line::from(vec![
            Span::styled("Borrowers", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("  •  {} on file", roster.borrowers.len())),
        ]))
        .alignment(Alignment::Left)
        .block(Block::default().borders(Borders::ALL).title("Borrowers"));
        frame.render_widget(header, chunks[0]);

        if roster.borrowers.is_empty() {
            let message = Paragraph::new("No borrowers yet. Press '+' to add one.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(message, chunks[1]);
            return;
        }

        self.render_borrower_cards(frame, chunks[1], &roster.borrowers, roster.selected);
    }

    fn render_borrower_cards(
        &self,
        frame: &mut Frame,
        area: Rect,
        borrowers: &[Borrower],
        selected: usize,
    ) {
        if borrowers.is_empty() || area.height == 0 {
            return;
        }

        let card_height = BORROWER_CARD_HEIGHT as usize;
        let capacity = ((area.height as usize) / card_height).max(1);
        let len = borrowers.len();
        let mut start = if selected >= capacity {
            selected + 1 - capacity
        } else {
            0
        };
        if start + capacity > len {
            start = len.saturating_sub(capacity);
        }
        let end = min(start + capacity, len);
        let visible_len = end.saturating_sub(start);
        if visible_len == 0 {
            return;
        }

        let constraints: Vec<Constraint> = (0..visible_len)
            .map(|_| Constraint::Length(BORROWER_CARD_HEIGHT))
            .collect();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        for (idx, chunk) in rows.iter().enumerate() {
            if chunk.height == 0 {
                continue;
            }

            let borrower_index = start + idx;
            if borrower_index >= len {
                break;
            }

            let borrower = &borrowers[borrower_index];
            let mut block = Block::default().borders(Borders::ALL);
            let mut paragraph_style = Style::default();
            if borrower_index == selected {
                block = block.style(Style::default().fg(Color::Yellow));
                paragraph_style = Style::default().fg(Color::Yellow);
            }

            let mut lines = Vec::new();
            let name = if borrower_index == selected {
                format!("▶ {}", borrower.name)
            } else {
                borrower.name.clone()
            };
            lines.push(Line::from(Span::styled(
                name,
                Style::default().add_modifier(Modifier::BOLD),
            )));

            let email_text = if borrower.email.trim().is_empty() {
                "No email".to_string()
            } else {
                borrower.email.trim().to_string()
            };
            lines.push(Line::from(Span::styled(
                email_text,
                Style::default().fg(Color::Cyan),
            )));

            let phone_text = if borrower.phone.trim().is_empty() {
                "No phone".to_string()
            } else {
                borrower.phone.trim().to_string()
            };
            lines.push(Line::from(Span::styled(
                phone_text,
                Style::default().fg(Color::Gray),
            )));

            let paragraph = Paragraph::new(lines)
                .block(block)
                .wrap(Wrap { trim: true })
                .alignment(Alignment::Left)
                .style(paragraph_style);

            frame.render_widget(paragraph, *chunk);
        }
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        match (&self.screen, &self.mode) {
            (_, Mode::Searching(_)) => Line::from(vec![
                Span::styled("[↑↓]", key_style),
                Span::raw(" Navigate   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Keep Filter   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Clear"),
            ]),
            (_, Mode::Borrowing { .. }) => Line::from(vec![
                Span::styled("[↑↓]", key_style),
                Span::raw(" Pick Borrower   "),
                Span::styled("[Tab]", key_style),
                Span::raw(" Date Field   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Confirm   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            (_, Mode::AddingBook(_))
            | (_, Mode::EditingBook { .. })
            | (_, Mode::AddingBorrower(_)) => Line::from(vec![
                Span::styled("[Enter]", key_style),
                Span::raw(" Save   "),
                Span::styled("[Tab]", key_style),
                Span::raw(" Next Field   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            (_, Mode::ConfirmBookDelete(_)) | (_, Mode::ConfirmBorrowerDelete(_)) => {
                Line::from(vec![
                    Span::styled("[Y]", key_style),
                    Span::raw(" Confirm   "),
                    Span::styled("[N/Esc]", key_style),
                    Span::raw(" Cancel"),
                ])
            }
            (Screen::Books(_), Mode::Normal) => Line::from(vec![
                Span::styled("[↑↓]", key_style),
                Span::raw(" Navigate   "),
                Span::styled("[b]", key_style),
                Span::raw(" Borrow   "),
                Span::styled("[r]", key_style),
                Span::raw(" Return   "),
                Span::styled("[+]", key_style),
                Span::raw(" Add   "),
                Span::styled("[e]", key_style),
                Span::raw(" Edit   "),
                Span::styled("[-]", key_style),
                Span::raw(" Delete   "),
                Span::styled("[f]", key_style),
                Span::raw(" Search   "),
                Span::styled("[Tab]", key_style),
                Span::raw(" Borrowers   "),
                Span::styled("[q]", key_style),
                Span::raw(" Quit"),
            ]),
            (Screen::Borrowers(_), Mode::Normal) => Line::from(vec![
                Span::styled("[↑↓]", key_style),
                Span::raw(" Navigate   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Email   "),
                Span::styled("[+]", key_style),
                Span::raw(" Add   "),
                Span::styled("[-]", key_style),
                Span::raw(" Delete   "),
                Span::styled("[Tab]", key_style),
                Span::raw(" Catalog   "),
                Span::styled("[q]", key_style),
                Span::raw(" Quit"),
            ]),
        }
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, state: &SearchState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title("Search");
        let paragraph = Paragraph::new(Span::raw(format!("Search: {}", state.query)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "Search: ".len() as u16 + state.query.chars().count() as u16;
        let cursor_y = inner.y;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_book_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &BookForm) {
        let popup_area = centered_rect(70, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            form.build_line("Title", BookField::Title),
            form.build_line("Author", BookField::Author),
            form.build_line("Year", BookField::Year),
            form.build_line("Genre", BookField::Genre),
            Line::from(""),
        ];

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let (prefix, row) = match form.active {
            BookField::Title => ("Title: ", 0),
            BookField::Author => ("Author: ", 1),
            BookField::Year => ("Year: ", 2),
            BookField::Genre => ("Genre: ", 3),
        };
        let cursor_x = inner.x + prefix.len() as u16 + form.value_len(form.active) as u16;
        frame.set_cursor_position((cursor_x, inner.y + row));
    }

    fn draw_borrower_form(&self, frame: &mut Frame, area: Rect, form: &BorrowerForm) {
        let popup_area = centered_rect(70, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Add Borrower").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            form.build_line("Name", BorrowerField::Name),
            form.build_line("Email", BorrowerField::Email),
            form.build_line("Phone", BorrowerField::Phone),
            Line::from(""),
        ];

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let (prefix, row) = match form.active {
            BorrowerField::Name => ("Name: ", 0),
            BorrowerField::Email => ("Email: ", 1),
            BorrowerField::Phone => ("Phone: ", 2),
        };
        let cursor_x = inner.x + prefix.len() as u16 + form.value_len(form.active) as u16;
        frame.set_cursor_position((cursor_x, inner.y + row));
    }

    fn draw_borrow_dialog(
        &self,
        frame: &mut Frame,
        area: Rect,
        book_title: &str,
        form: &BorrowForm,
    ) {
        let popup_area = centered_rect(70, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(format!("Borrow '{book_title}'"))
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(inner);

        let items: Vec<ListItem> = form
            .borrowers
            .iter()
            .map(|borrower| ListItem::new(borrower.name.clone()))
            .collect();

        let highlight = if form.date_active {
            Style::default().fg(Color::Gray)
        } else {
            Style::default().fg(Color::Yellow)
        };
        let list = List::new(items)
            .block(Block::default().borders(Borders::NONE))
            .highlight_style(highlight)
            .highlight_symbol("▶ ");

        let mut list_state = ListState::default();
        list_state.select(Some(form.selected));
        frame.render_stateful_widget(list, chunks[0], &mut list_state);

        frame.render_widget(
            Paragraph::new(form.build_date_line()).wrap(Wrap { trim: true }),
            chunks[1],
        );

        let tail_line = if let Some(error) = &form.error {
            Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red)))
        } else {
            Line::from(Span::styled(
                "Enter to confirm • Tab to edit the date • Esc to cancel",
                Style::default().fg(Color::Gray),
            ))
        };
        frame.render_widget(Paragraph::new(tail_line).wrap(Wrap { trim: true }), chunks[2]);

        if form.date_active {
            let cursor_x = chunks[1].x + "Return by: ".len() as u16 + form.date_len() as u16;
            frame.set_cursor_position((cursor_x, chunks[1].y));
        }
    }

    fn draw_confirm_book(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmBookDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Confirm Removal")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!(
                "Delete '{}' by {}?",
                confirm.title, confirm.author
            )),
            Line::from("Any loan record on this book is removed with it."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_confirm_borrower(
        &self,
        frame: &mut Frame,
        area: Rect,
        confirm: &ConfirmBorrowerDelete,
    ) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Confirm Removal")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!("Delete borrower {}?", confirm.name)),
            Line::from("Borrowers with books still on loan cannot be deleted."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}
