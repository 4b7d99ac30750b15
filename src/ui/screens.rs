use crate::models::{Book, Borrower};

/// State behind the main catalog view: the current query results plus the
/// selection. The rows always come fresh from the database; an active search
/// simply narrows what the query returns.
pub(crate) struct BookScreen {
    pub(crate) books: Vec<Book>,
    pub(crate) filter: Option<String>,
    pub(crate) selected: usize,
}

impl BookScreen {
    pub(crate) fn new(books: Vec<Book>) -> Self {
        Self {
            books,
            filter: None,
            selected: 0,
        }
    }

    pub(crate) fn current_book(&self) -> Option<&Book> {
        self.books.get(self.selected)
    }

    /// Replace the rows after a reload and keep the selection in range.
    pub(crate) fn set_books(&mut self, books: Vec<Book>) {
        self.books = books;
        self.ensure_in_bounds();
    }

    /// Remember the row for a given book id, used to restore the selection
    /// after edits.
    pub(crate) fn select_id(&mut self, id: i64) {
        if let Some(index) = self.books.iter().position(|b| b.id == id) {
            self.selected = index;
        }
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.books.is_empty() {
            return;
        }
        let len = self.books.len() as isize;
        let mut new = self.selected as isize + offset;
        if new < 0 {
            new = 0;
        }
        if new >= len {
            new = len - 1;
        }
        self.selected = new as usize;
    }

    pub(crate) fn select_first(&mut self) {
        if !self.books.is_empty() {
            self.selected = 0;
        }
    }

    pub(crate) fn select_last(&mut self) {
        if !self.books.is_empty() {
            self.selected = self.books.len() - 1;
        }
    }

    pub(crate) fn ensure_in_bounds(&mut self) {
        if self.books.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.books.len() {
            self.selected = self.books.len() - 1;
        }
    }
}

/// Selection state for the borrower roster view.
pub(crate) struct BorrowerScreen {
    pub(crate) borrowers: Vec<Borrower>,
    pub(crate) selected: usize,
}

impl BorrowerScreen {
    pub(crate) fn new(borrowers: Vec<Borrower>) -> Self {
        Self {
            borrowers,
            selected: 0,
        }
    }

    pub(crate) fn current_borrower(&self) -> Option<&Borrower> {
        self.borrowers.get(self.selected)
    }

    pub(crate) fn set_borrowers(&mut self, borrowers: Vec<Borrower>) {
        self.borrowers = borrowers;
        self.ensure_in_bounds();
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

    pub(crate) fn select_first(&mut self) {
        if !self.borrowers.is_empty() {
            self.selected = 0;
        }
    }

    pub(crate) fn select_last(&mut self) {
        if !self.borrowers.is_empty() {
            self.selected = self.borrowers.len() - 1;
        }
    }

    pub(crate) fn ensure_in_bounds(&mut self) {
        if self.borrowers.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.borrowers.len() {
            self.selected = self.borrowers.len() - 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LoanStatus;

    fn sample_book(id: i64) -> Book {
        Book {
            id,
            title: format!("Book {id}"),
            author: "Author".to_string(),
            year: None,
            genre: String::new(),
            status: LoanStatus::Available,
            borrower_id: None,
            borrow_date: None,
            return_date: None,
            borrowed_by: None,
        }
    }

    #[test]
    fn selection_clamps_at_both_ends() {
        let mut screen = BookScreen::new(vec![sample_book(1), sample_book(2), sample_book(3)]);
        screen.move_selection(-5);
        assert_eq!(screen.selected, 0);
        screen.move_selection(10);
        assert_eq!(screen.selected, 2);
    }

    #[test]
    fn replacing_rows_keeps_selection_in_bounds() {
        let mut screen = BookScreen::new(vec![sample_book(1), sample_book(2), sample_book(3)]);
        screen.select_last();
        screen.set_books(vec![sample_book(1)]);
        assert_eq!(screen.selected, 0);
        assert_eq!(screen.current_book().unwrap().id, 1);
    }

    #[test]
    fn select_id_restores_position_after_reload() {
        let mut screen = BookScreen::new(vec![sample_book(1), sample_book(2), sample_book(3)]);
        screen.select_id(2);
        assert_eq!(screen.selected, 1);
        screen.select_id(99);
        assert_eq!(screen.selected, 1);
    }
}
