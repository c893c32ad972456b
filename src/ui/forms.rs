use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Book, BookPatch, NewBook};

/// Typing this alone in the genre field while editing removes the genre.
pub(crate) const CLEAR_GENRE_TOKEN: &str = "-";

/// Fields available within the book form, in focus order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum BookField {
    #[default]
    Title,
    Author,
    Genre,
    Read,
}

impl BookField {
    pub(crate) const ALL: [BookField; 4] = [
        BookField::Title,
        BookField::Author,
        BookField::Genre,
        BookField::Read,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            BookField::Title => "Title",
            BookField::Author => "Author",
            BookField::Genre => "Genre",
            BookField::Read => "Read? (yes/no)",
        }
    }

    fn next(self) -> Self {
        match self {
            BookField::Title => BookField::Author,
            BookField::Author => BookField::Genre,
            BookField::Genre => BookField::Read,
            BookField::Read => BookField::Title,
        }
    }

    fn previous(self) -> Self {
        match self {
            BookField::Title => BookField::Read,
            BookField::Author => BookField::Title,
            BookField::Genre => BookField::Author,
            BookField::Read => BookField::Genre,
        }
    }
}

/// Form state shared by the add and edit dialogs.
///
/// When editing, every field starts blank and a blank field means "keep the
/// stored value"; the current values are shown as greyed placeholders.
#[derive(Default, Clone, Debug)]
pub(crate) struct BookForm {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) genre: String,
    pub(crate) read: String,
    pub(crate) active: BookField,
    pub(crate) error: Option<String>,
    original: Option<Book>,
}

impl BookForm {
    /// Blank form for editing `book`.
    pub(crate) fn for_edit(book: &Book) -> Self {
        Self {
            original: Some(book.clone()),
            ..Self::default()
        }
    }

    pub(crate) fn is_edit(&self) -> bool {
        self.original.is_some()
    }

    pub(crate) fn next_field(&mut self) {
        self.active = self.active.next();
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = self.active.previous();
    }

    /// Append a character to the active field. Control characters are ignored.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.value_mut(self.active).push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.value_mut(self.active).pop();
    }

    /// Validate an add form. Title and author are required, a blank genre is
    /// stored as absent and a blank read answer means unread.
    pub(crate) fn parse_new(&self) -> Result<NewBook> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(anyhow!("Title is required."));
        }
        let author = self.author.trim();
        if author.is_empty() {
            return Err(anyhow!("Author is required."));
        }

        let mut book = NewBook::new(title, author);
        let genre = self.genre.trim();
        if !genre.is_empty() {
            book = book.with_genre(genre);
        }
        Ok(book.with_read(parse_read_token(&self.read)?.unwrap_or(false)))
    }

    /// Validate an edit form into a patch holding only the filled-in fields.
    pub(crate) fn parse_patch(&self) -> Result<BookPatch> {
        let mut patch = BookPatch::default();

        let title = self.title.trim();
        if !title.is_empty() {
            patch = patch.title(title);
        }
        let author = self.author.trim();
        if !author.is_empty() {
            patch = patch.author(author);
        }
        match self.genre.trim() {
            "" => {}
            CLEAR_GENRE_TOKEN => patch = patch.genre(None),
            genre => patch = patch.genre(Some(genre.to_string())),
        }
        if let Some(read) = parse_read_token(&self.read)? {
            patch = patch.read(read);
        }

        Ok(patch)
    }

    /// Render a single labelled line for the dialog.
    pub(crate) fn build_line(&self, field: BookField) -> Line<'static> {
        let value = self.value(field);
        let is_active = self.active == field;

        let display = if value.is_empty() {
            self.placeholder(field)
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
            Span::raw(format!("{}: ", field.label())),
            Span::styled(display, style),
        ])
    }

    pub(crate) fn value_len(&self, field: BookField) -> usize {
        self.value(field).chars().count()
    }

    fn placeholder(&self, field: BookField) -> String {
        match (&self.original, field) {
            (None, BookField::Title | BookField::Author) => "<required>".to_string(),
            (None, BookField::Genre) => "<optional>".to_string(),
            (None, BookField::Read) => "<no>".to_string(),
            (Some(book), BookField::Title) => format!("<{}>", book.title),
            (Some(book), BookField::Author) => format!("<{}>", book.author),
            (Some(book), BookField::Genre) => match &book.genre {
                Some(genre) => format!("<{genre}>"),
                None => "<none>".to_string(),
            },
            (Some(book), BookField::Read) => format!("<{}>", book.read_label().to_lowercase()),
        }
    }

    fn value(&self, field: BookField) -> &str {
        match field {
            BookField::Title => &self.title,
            BookField::Author => &self.author,
            BookField::Genre => &self.genre,
            BookField::Read => &self.read,
        }
    }

    fn value_mut(&mut self, field: BookField) -> &mut String {
        match field {
            BookField::Title => &mut self.title,
            BookField::Author => &mut self.author,
            BookField::Genre => &mut self.genre,
            BookField::Read => &mut self.read,
        }
    }
}

/// Translate a yes/no answer into the read flag. Blank input is `None`.
pub(crate) fn parse_read_token(raw: &str) -> Result<Option<bool>> {
    match raw.trim().to_lowercase().as_str() {
        "" => Ok(None),
        "y" | "yes" | "s" | "si" | "sí" => Ok(Some(true)),
        "n" | "no" => Ok(Some(false)),
        other => Err(anyhow!("Read must be yes or no, not '{other}'.")),
    }
}

/// Convert a typed book id. Anything but a whole number is rejected here and
/// never reaches the catalog.
pub(crate) fn parse_book_id(raw: &str) -> Result<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Book ID is required."));
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| anyhow!("Book ID must be a whole number."))
}

/// Single-line text prompt used for searching and jumping to an id.
#[derive(Default, Clone, Debug)]
pub(crate) struct Prompt {
    pub(crate) input: String,
    pub(crate) error: Option<String>,
}

impl Prompt {
    pub(crate) fn push_char(&mut self, ch: char) {
        if !ch.is_control() {
            self.input.push(ch);
            self.error = None;
        }
    }

    pub(crate) fn backspace(&mut self) {
        self.input.pop();
    }
}

/// State for confirming a permanent deletion.
#[derive(Clone, Debug)]
pub(crate) struct ConfirmBookDelete {
    pub(crate) book: Book,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(form: &mut BookForm, field: BookField, text: &str) {
        form.active = field;
        for ch in text.chars() {
            form.push_char(ch);
        }
    }

    fn sample() -> Book {
        Book {
            id: 3,
            title: "Dune".into(),
            author: "Frank Herbert".into(),
            genre: Some("Sci-Fi".into()),
            read: false,
        }
    }

    #[test]
    fn read_tokens() {
        assert_eq!(parse_read_token("").unwrap(), None);
        assert_eq!(parse_read_token("  YES ").unwrap(), Some(true));
        assert_eq!(parse_read_token("Sí").unwrap(), Some(true));
        assert_eq!(parse_read_token("no").unwrap(), Some(false));
        assert!(parse_read_token("maybe").is_err());
    }

    #[test]
    fn book_ids_must_be_numeric() {
        assert_eq!(parse_book_id(" 42 ").unwrap(), 42);
        assert!(parse_book_id("").is_err());
        assert!(parse_book_id("forty-two").is_err());
        assert!(parse_book_id("4.2").is_err());
    }

    #[test]
    fn new_book_requires_title_and_author() {
        let mut form = BookForm::default();
        typed(&mut form, BookField::Title, "  Dune ");
        assert!(form.parse_new().is_err());

        typed(&mut form, BookField::Author, "Frank Herbert");
        let book = form.parse_new().unwrap();
        assert_eq!(book, NewBook::new("Dune", "Frank Herbert"));
    }

    #[test]
    fn new_book_reads_genre_and_read_answer() {
        let mut form = BookForm::default();
        typed(&mut form, BookField::Title, "Dune");
        typed(&mut form, BookField::Author, "Frank Herbert");
        typed(&mut form, BookField::Genre, " Sci-Fi ");
        typed(&mut form, BookField::Read, "y");

        let book = form.parse_new().unwrap();
        assert_eq!(book.genre.as_deref(), Some("Sci-Fi"));
        assert!(book.read);
    }

    #[test]
    fn blank_edit_form_is_an_empty_patch() {
        let form = BookForm::for_edit(&sample());
        assert!(form.is_edit());
        assert!(form.parse_patch().unwrap().is_empty());
    }

    #[test]
    fn edit_form_only_carries_filled_fields() {
        let mut form = BookForm::for_edit(&sample());
        typed(&mut form, BookField::Author, "F. Herbert");
        typed(&mut form, BookField::Read, "yes");

        let patch = form.parse_patch().unwrap();
        assert_eq!(patch, BookPatch::default().author("F. Herbert").read(true));
    }

    #[test]
    fn dash_clears_genre_when_editing() {
        let mut form = BookForm::for_edit(&sample());
        typed(&mut form, BookField::Genre, CLEAR_GENRE_TOKEN);
        assert_eq!(form.parse_patch().unwrap().genre, Some(None));
    }

    #[test]
    fn focus_wraps_both_ways() {
        let mut form = BookForm::default();
        form.previous_field();
        assert_eq!(form.active, BookField::Read);
        form.next_field();
        assert_eq!(form.active, BookField::Title);
    }
}
