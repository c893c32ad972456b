//! Domain models that mirror the `books` table and get passed between the
//! catalog service and the TUI. These stay plain data holders so the other
//! layers can focus on persistence and presentation.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
/// One persisted book record.
pub struct Book {
    /// Primary key assigned by SQLite at insert time. Never changes afterwards.
    pub id: i64,
    pub title: String,
    pub author: String,
    /// `None` maps to SQL `NULL`, which is not the same as an empty genre.
    pub genre: Option<String>,
    pub read: bool,
}

impl Book {
    /// Human label for the read flag used by the list view.
    pub fn read_label(&self) -> &'static str {
        if self.read {
            "Yes"
        } else {
            "No"
        }
    }

    /// Genre text for display, blank when the genre is absent.
    pub fn genre_label(&self) -> &str {
        self.genre.as_deref().unwrap_or("")
    }
}

impl fmt::Display for Book {
    /// `Title - Author`, the form used in status messages and dialogs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.title, self.author)
    }
}

/// Input for a new record. The id is left to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub read: bool,
}

impl NewBook {
    /// A new unread book without a genre.
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            genre: None,
            read: false,
        }
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_read(mut self, read: bool) -> Self {
        self.read = read;
        self
    }
}

/// Partial update for an existing record. Only fields that are `Some` are
/// written; everything else keeps its stored value.
///
/// `genre` is doubly optional so callers can tell "leave the genre alone"
/// (`None`) apart from "clear the genre" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<Option<String>>,
    pub read: Option<bool>,
}

impl BookPatch {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn genre(mut self, genre: Option<String>) -> Self {
        self.genre = Some(genre);
        self
    }

    pub fn read(mut self, read: bool) -> Self {
        self.read = Some(read);
        self
    }

    /// True when no field was supplied.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.genre.is_none() && self.read.is_none()
    }
}

/// Result of an update. "Not found" and "nothing to update" are ordinary
/// outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    NotFound,
    NothingToUpdate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_patch_is_empty() {
        assert!(BookPatch::default().is_empty());
    }

    #[test]
    fn clearing_genre_counts_as_a_field() {
        let patch = BookPatch::default().genre(None);
        assert!(!patch.is_empty());
        assert_eq!(patch.genre, Some(None));
    }

    #[test]
    fn new_book_defaults_to_unread_without_genre() {
        let book = NewBook::new("Dune", "Frank Herbert");
        assert_eq!(book.genre, None);
        assert!(!book.read);

        let book = book.with_genre("Sci-Fi").with_read(true);
        assert_eq!(book.genre.as_deref(), Some("Sci-Fi"));
        assert!(book.read);
    }

    #[test]
    fn labels_render_missing_genre_as_blank() {
        let book = Book {
            id: 1,
            title: "Dune".into(),
            author: "Frank Herbert".into(),
            genre: None,
            read: true,
        };
        assert_eq!(book.genre_label(), "");
        assert_eq!(book.read_label(), "Yes");
        assert_eq!(book.to_string(), "Dune - Frank Herbert");
    }
}
