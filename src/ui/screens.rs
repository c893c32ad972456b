use crate::models::Book;

/// The book table shown on the main screen. Holds either the whole catalog
/// or the results of the active search.
#[derive(Default)]
pub(crate) struct BookListScreen {
    pub(crate) books: Vec<Book>,
    pub(crate) search: Option<String>,
    pub(crate) selected: usize,
}

impl BookListScreen {
    pub(crate) fn new(books: Vec<Book>) -> Self {
        Self {
            books,
            search: None,
            selected: 0,
        }
    }

    /// Replace the visible rows, keeping the cursor on `focus_id` when it is
    /// still present.
    pub(crate) fn set_books(&mut self, books: Vec<Book>, focus_id: Option<i64>) {
        self.books = books;
        if let Some(id) = focus_id {
            if self.select_id(id) {
                return;
            }
        }
        self.ensure_in_bounds();
    }

    pub(crate) fn current_book(&self) -> Option<&Book> {
        self.books.get(self.selected)
    }

    /// Move the cursor to the row with `id`. Returns false when it is not listed.
    pub(crate) fn select_id(&mut self, id: i64) -> bool {
        match self.books.iter().position(|book| book.id == id) {
            Some(idx) => {
                self.selected = idx;
                true
            }
            None => false,
        }
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.books.is_empty() {
            return;
        }
        let len = self.books.len() as isize;
        let new = (self.selected as isize + offset).clamp(0, len - 1);
        self.selected = new as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.books.len().saturating_sub(1);
    }

    fn ensure_in_bounds(&mut self) {
        if self.selected >= self.books.len() {
            self.selected = self.books.len().saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: i64) -> Book {
        Book {
            id,
            title: format!("Book {id}"),
            author: "Anon".into(),
            genre: None,
            read: false,
        }
    }

    #[test]
    fn selection_is_clamped() {
        let mut screen = BookListScreen::new(vec![book(1), book(2), book(3)]);
        screen.move_selection(-5);
        assert_eq!(screen.selected, 0);
        screen.move_selection(10);
        assert_eq!(screen.selected, 2);
    }

    #[test]
    fn reload_keeps_focus_or_falls_back_to_last_row() {
        let mut screen = BookListScreen::new(vec![book(1), book(2), book(3)]);
        screen.select_last();

        screen.set_books(vec![book(1), book(2)], Some(3));
        assert_eq!(screen.selected, 1);

        screen.set_books(vec![book(1), book(2), book(7)], Some(7));
        assert_eq!(screen.current_book().map(|b| b.id), Some(7));

        screen.set_books(Vec::new(), None);
        assert_eq!(screen.selected, 0);
        assert!(screen.current_book().is_none());
    }
}
