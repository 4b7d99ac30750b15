use anyhow::{anyhow, Context, Result};
use chrono::{Days, Local, NaiveDate};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Book, Borrower};

/// Earliest publication year the book form accepts.
const YEAR_MIN: i64 = 1500;
/// Latest publication year the book form accepts.
const YEAR_MAX: i64 = 2025;
/// Longest loan the borrow dialog allows, in days from today.
pub(crate) const LOAN_WINDOW_DAYS: u64 = 15;

/// Internal representation of the book form fields.
#[derive(Default, Clone)]
pub(crate) struct BookForm {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) year: String,
    pub(crate) genre: String,
    pub(crate) active: BookField,
    pub(crate) error: Option<String>,
}

/// Fields available within the book form.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum BookField {
    #[default]
    Title,
    Author,
    Year,
    Genre,
}

impl BookForm {
    /// Populate the form from an existing book when editing.
    pub(crate) fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            year: book.year.map(|y| y.to_string()).unwrap_or_default(),
            genre: book.genre.clone(),
            active: BookField::Title,
            error: None,
        }
    }

    /// Cycle focus across the four fields.
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            BookField::Title => BookField::Author,
            BookField::Author => BookField::Year,
            BookField::Year => BookField::Genre,
            BookField::Genre => BookField::Title,
        };
    }

    /// Append a character to the active field, validating allowed input. The
    /// year field only accepts digits.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        match self.active {
            BookField::Year => {
                if ch.is_ascii_digit() {
                    self.year.push(ch);
                    true
                } else {
                    false
                }
            }
            _ => {
                if ch.is_control() {
                    return false;
                }
                match self.active {
                    BookField::Title => self.title.push(ch),
                    BookField::Author => self.author.push(ch),
                    BookField::Genre => self.genre.push(ch),
                    BookField::Year => unreachable!(),
                }
                true
            }
        }
    }

    /// Remove the last character from the active field.
    pub(crate) fn backspace(&mut self) {
        match self.active {
            BookField::Title => {
                self.title.pop();
            }
            BookField::Author => {
                self.author.pop();
            }
            BookField::Year => {
                self.year.pop();
            }
            BookField::Genre => {
                self.genre.pop();
            }
        }
    }

    /// Validate the inputs and return typed values ready for persistence.
    pub(crate) fn parse_inputs(&self) -> Result<(String, String, Option<i64>, String)> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(anyhow!("Title is required."));
        }
        let author = self.author.trim();
        if author.is_empty() {
            return Err(anyhow!("Author is required."));
        }

        let year_raw = self.year.trim();
        let year = if year_raw.is_empty() {
            None
        } else {
            let year = year_raw
                .parse::<i64>()
                .context("Year must be a number.")?;
            if !(YEAR_MIN..=YEAR_MAX).contains(&year) {
                return Err(anyhow!("Year must be between {YEAR_MIN} and {YEAR_MAX}."));
            }
            Some(year)
        };

        Ok((
            title.to_string(),
            author.to_string(),
            year,
            self.genre.trim().to_string(),
        ))
    }

    /// Render a styled line for the modal form widget.
    pub(crate) fn build_line(&self, field_name: &str, field: BookField) -> Line<'static> {
        let (value, is_active) = match field {
            BookField::Title => (&self.title, self.active == BookField::Title),
            BookField::Author => (&self.author, self.active == BookField::Author),
            BookField::Year => (&self.year, self.active == BookField::Year),
            BookField::Genre => (&self.genre, self.active == BookField::Genre),
        };

        let placeholder = match field {
            BookField::Title | BookField::Author => "<required>",
            BookField::Year | BookField::Genre => "<optional>",
        };

        build_field_line(field_name, value, placeholder, is_active)
    }

    /// Return the character count for the requested field.
    pub(crate) fn value_len(&self, field: BookField) -> usize {
        match field {
            BookField::Title => self.title.chars().count(),
            BookField::Author => self.author.chars().count(),
            BookField::Year => self.year.chars().count(),
            BookField::Genre => self.genre.chars().count(),
        }
    }
}

/// Form state for borrower creation.
#[derive(Default, Clone)]
pub(crate) struct BorrowerForm {
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) phone: String,
    pub(crate) active: BorrowerField,
    pub(crate) error: Option<String>,
}

/// Enumerates the fields within the borrower form to drive focus management.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum BorrowerField {
    #[default]
    Name,
    Email,
    Phone,
}

impl BorrowerForm {
    /// Cycle focus across the three fields.
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            BorrowerField::Name => BorrowerField::Email,
            BorrowerField::Email => BorrowerField::Phone,
            BorrowerField::Phone => BorrowerField::Name,
        };
    }

    /// Insert a character into the active field.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            BorrowerField::Name => self.name.push(ch),
            BorrowerField::Email => self.email.push(ch),
            BorrowerField::Phone => self.phone.push(ch),
        }
        true
    }

    /// Remove a character from the active field.
    pub(crate) fn backspace(&mut self) {
        match self.active {
            BorrowerField::Name => {
                self.name.pop();
            }
            BorrowerField::Email => {
                self.email.pop();
            }
            BorrowerField::Phone => {
                self.phone.pop();
            }
        }
    }

    /// Validate and normalize form inputs before they are written to the
    /// database. Only the name is required; contact fields pass through as
    /// free text.
    pub(crate) fn parse_inputs(&self) -> Result<(String, String, String)> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(anyhow!("Borrower name is required."));
        }
        Ok((
            name.to_string(),
            self.email.trim().to_string(),
            self.phone.trim().to_string(),
        ))
    }

    /// Render a styled line for the modal form widget.
    pub(crate) fn build_line(&self, field_name: &str, field: BorrowerField) -> Line<'static> {
        let (value, is_active) = match field {
            BorrowerField::Name => (&self.name, self.active == BorrowerField::Name),
            BorrowerField::Email => (&self.email, self.active == BorrowerField::Email),
            BorrowerField::Phone => (&self.phone, self.active == BorrowerField::Phone),
        };

        let placeholder = match field {
            BorrowerField::Name => "<required>",
            BorrowerField::Email | BorrowerField::Phone => "<optional>",
        };

        build_field_line(field_name, value, placeholder, is_active)
    }

    /// Character length of the requested field.
    pub(crate) fn value_len(&self, field: BorrowerField) -> usize {
        match field {
            BorrowerField::Name => self.name.chars().count(),
            BorrowerField::Email => self.email.chars().count(),
            BorrowerField::Phone => self.phone.chars().count(),
        }
    }
}

/// State for the borrow dialog: a borrower picker plus the expected return
/// date.
#[derive(Clone)]
pub(crate) struct BorrowForm {
    pub(crate) borrowers: Vec<Borrower>,
    pub(crate) selected: usize,
    pub(crate) return_date: String,
    pub(crate) date_active: bool,
    pub(crate) error: Option<String>,
}

impl BorrowForm {
    /// Build the dialog with the return date prefilled to the end of the loan
    /// window.
    pub(crate) fn new(borrowers: Vec<Borrower>) -> Self {
        let suggested = Local::now().date_naive() + Days::new(LOAN_WINDOW_DAYS);
        Self {
            borrowers,
            selected: 0,
            return_date: suggested.format("%Y-%m-%d").to_string(),
            date_active: false,
            error: None,
        }
    }

    /// Swap focus between the borrower list and the date field.
    pub(crate) fn toggle_field(&mut self) {
        self.date_active = !self.date_active;
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.borrowers.is_empty() {
            return;
        }
        let len = self.borrowers.len() as isize;
        let mut new = self.selected as isize + offset;
        if new < 0 {
            new = 0;
        }
        if new >= len {
            new = len - 1;
        }
        self.selected = new as usize;
    }

    pub(crate) fn current_borrower(&self) -> Option<&Borrower> {
        self.borrowers.get(self.selected)
    }

    /// Append a character to the date field when it has focus.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if self.date_active && (ch.is_ascii_digit() || ch == '-') {
            self.return_date.push(ch);
            true
        } else {
            false
        }
    }

    pub(crate) fn backspace(&mut self) {
        if self.date_active {
            self.return_date.pop();
        }
    }

    /// Validate the dialog and return the borrower id plus the parsed return
    /// date. The date must fall inside the loan window, counted from today.
    pub(crate) fn parse_inputs(&self) -> Result<(i64, NaiveDate)> {
        let borrower = self
            .current_borrower()
            .ok_or_else(|| anyhow!("No borrower selected."))?;

        let return_date = NaiveDate::parse_from_str(self.return_date.trim(), "%Y-%m-%d")
            .context("Return date must look like YYYY-MM-DD.")?;

        let today = Local::now().date_naive();
        let latest = today + Days::new(LOAN_WINDOW_DAYS);
        if return_date < today || return_date > latest {
            return Err(anyhow!(
                "Return date must fall between {today} and {latest}."
            ));
        }

        Ok((borrower.id, return_date))
    }

    /// Render the date line with the same styling as the other forms.
    pub(crate) fn build_date_line(&self) -> Line<'static> {
        build_field_line(
            "Return by",
            &self.return_date,
            "<YYYY-MM-DD>",
            self.date_active,
        )
    }

    pub(crate) fn date_len(&self) -> usize {
        self.return_date.chars().count()
    }
}

/// Shared rendering for one labelled field: active fields show yellow, empty
/// fields show their placeholder dimmed.
fn build_field_line(
    field_name: &str,
    value: &str,
    placeholder: &str,
    is_active: bool,
) -> Line<'static> {
    let display = if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    };

    let style = if is_active {
        Style::default().fg(Color::Yellow)
    } else if value.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(format!("{field_name}: ")),
        Span::styled(display, style),
    ])
}

#[derive(Clone)]
pub(crate) struct ConfirmBookDelete {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) author: String,
}

impl ConfirmBookDelete {
    /// Build the confirmation state from the book being considered.
    pub(crate) fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
        }
    }
}

#[derive(Clone)]
pub(crate) struct ConfirmBorrowerDelete {
    pub(crate) id: i64,
    pub(crate) name: String,
}

impl ConfirmBorrowerDelete {
    pub(crate) fn from(borrower: Borrower) -> Self {
        Self {
            id: borrower.id,
            name: borrower.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_book_form() -> BookForm {
        BookForm {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            year: "1965".to_string(),
            genre: "Sci-Fi".to_string(),
            active: BookField::Title,
            error: None,
        }
    }

    #[test]
    fn book_form_requires_title_and_author() {
        let mut form = filled_book_form();
        form.title.clear();
        assert!(form.parse_inputs().is_err());

        let mut form = filled_book_form();
        form.author = "   ".to_string();
        assert!(form.parse_inputs().is_err());
    }

    #[test]
    fn book_form_year_is_optional_but_ranged() {
        let mut form = filled_book_form();
        form.year.clear();
        let (_, _, year, _) = form.parse_inputs().unwrap();
        assert_eq!(year, None);

        let mut form = filled_book_form();
        form.year = "1499".to_string();
        assert!(form.parse_inputs().is_err());

        form.year = "2026".to_string();
        assert!(form.parse_inputs().is_err());

        form.year = "2025".to_string();
        let (_, _, year, _) = form.parse_inputs().unwrap();
        assert_eq!(year, Some(2025));
    }

    #[test]
    fn book_form_year_field_only_accepts_digits() {
        let mut form = BookForm::default();
        form.active = BookField::Year;
        assert!(!form.push_char('x'));
        assert!(form.push_char('1'));
        assert_eq!(form.year, "1");
    }

    #[test]
    fn borrower_form_requires_a_name() {
        let form = BorrowerForm::default();
        assert!(form.parse_inputs().is_err());

        let form = BorrowerForm {
            name: "Dana Liu".to_string(),
            ..BorrowerForm::default()
        };
        let (name, email, phone) = form.parse_inputs().unwrap();
        assert_eq!(name, "Dana Liu");
        assert!(email.is_empty());
        assert!(phone.is_empty());
    }

    fn sample_borrowers() -> Vec<Borrower> {
        vec![Borrower {
            id: 7,
            name: "Alice Carver".to_string(),
            email: String::new(),
            phone: String::new(),
        }]
    }

    #[test]
    fn borrow_form_accepts_dates_inside_the_window() {
        let form = BorrowForm::new(sample_borrowers());
        let (borrower_id, date) = form.parse_inputs().unwrap();
        assert_eq!(borrower_id, 7);
        assert_eq!(
            date,
            Local::now().date_naive() + Days::new(LOAN_WINDOW_DAYS)
        );
    }

    #[test]
    fn borrow_form_rejects_dates_outside_the_window() {
        let mut form = BorrowForm::new(sample_borrowers());
        let yesterday = Local::now().date_naive() - Days::new(1);
        form.return_date = yesterday.format("%Y-%m-%d").to_string();
        assert!(form.parse_inputs().is_err());

        let too_far = Local::now().date_naive() + Days::new(LOAN_WINDOW_DAYS + 1);
        form.return_date = too_far.format("%Y-%m-%d").to_string();
        assert!(form.parse_inputs().is_err());
    }

    #[test]
    fn borrow_form_rejects_malformed_dates() {
        let mut form = BorrowForm::new(sample_borrowers());
        form.return_date = "03-01-2025".to_string();
        assert!(form.parse_inputs().is_err());
    }

    #[test]
    fn borrow_form_without_borrowers_cannot_submit() {
        let form = BorrowForm::new(Vec::new());
        assert!(form.parse_inputs().is_err());
    }
}
