use log::{error, info};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::connection::Storage;
use super::error::CatalogResult;
use crate::models::{Book, BookPatch, NewBook, UpdateOutcome};

const BOOK_COLUMNS: &str = "id, title, author, genre, read";
/// SQL name of the Unicode-aware lowercase function used by search. SQLite's
/// built-in `LOWER` only folds ASCII.
const UNICODE_LOWER_FN: &str = "unicode_lower";

/// CRUD operations over the `books` table. This is the error boundary of the
/// crate: every failure is logged here with the action that triggered it
/// before it is handed back to the caller as a [`CatalogError`].
///
/// [`CatalogError`]: super::error::CatalogError
#[derive(Debug, Clone)]
pub struct Catalog {
    storage: Storage,
}

impl Catalog {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Insert a new book and return the id SQLite assigned to it. Title and
    /// author are expected to be validated by the caller; the table's CHECK
    /// constraints reject empty values with an integrity error.
    pub fn add_book(&self, book: &NewBook) -> CatalogResult<i64> {
        let result = self.storage.with_connection(|conn| {
            conn.execute(
                "INSERT INTO books (title, author, genre, read) VALUES (?1, ?2, ?3, ?4)",
                params![book.title, book.author, book.genre, book.read],
            )?;
            Ok(conn.last_insert_rowid())
        });

        let id = log_failure("book_add", result)?;
        info!("event=book_add module=catalog status=ok id={id}");
        Ok(id)
    }

    /// Every book in insertion (id) order. An empty catalog is an empty vec.
    pub fn list_books(&self) -> CatalogResult<Vec<Book>> {
        let result = self.storage.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY id"))?;
            let books = stmt
                .query_map([], book_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(books)
        });

        let books = log_failure("book_list", result)?;
        info!("event=book_list module=catalog status=ok count={}", books.len());
        Ok(books)
    }

    /// Case-insensitive substring match on title or author. `%`, `_` and `\`
    /// in the query match themselves rather than acting as LIKE wildcards.
    pub fn search_books(&self, query: &str) -> CatalogResult<Vec<Book>> {
        let pattern = format!("%{}%", escape_like(&query.to_lowercase()));
        let result = self.storage.with_connection(|conn| {
            register_unicode_lower(conn)?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {BOOK_COLUMNS} FROM books
                 WHERE {UNICODE_LOWER_FN}(title) LIKE ?1 ESCAPE '\\'
                    OR {UNICODE_LOWER_FN}(author) LIKE ?1 ESCAPE '\\'
                 ORDER BY id"
            ))?;
            let books = stmt
                .query_map([&pattern], book_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(books)
        });

        let books = log_failure("book_search", result)?;
        info!(
            "event=book_search module=catalog status=ok matches={}",
            books.len()
        );
        Ok(books)
    }

    /// Fetch a single book, `None` when the id is unknown.
    pub fn get_book(&self, id: i64) -> CatalogResult<Option<Book>> {
        let result = self.storage.with_connection(|conn| {
            conn.query_row(
                &format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"),
                [id],
                book_from_row,
            )
            .optional()
        });
        log_failure("book_get", result)
    }

    /// Apply only the fields present in `patch`. An empty patch never touches
    /// the store.
    pub fn update_book(&self, id: i64, patch: &BookPatch) -> CatalogResult<UpdateOutcome> {
        if patch.is_empty() {
            info!("event=book_update module=catalog status=noop id={id}");
            return Ok(UpdateOutcome::NothingToUpdate);
        }

        let (sql, values) = build_update(id, patch);
        let result = self
            .storage
            .with_connection(|conn| conn.execute(&sql, params_from_iter(values)));

        let outcome = match log_failure("book_update", result)? {
            0 => UpdateOutcome::NotFound,
            _ => UpdateOutcome::Updated,
        };
        info!("event=book_update module=catalog status=ok id={id} outcome={outcome:?}");
        Ok(outcome)
    }

    /// Remove a book. `Ok(false)` means no row carried that id.
    pub fn delete_book(&self, id: i64) -> CatalogResult<bool> {
        let result = self
            .storage
            .with_connection(|conn| conn.execute("DELETE FROM books WHERE id = ?1", [id]));

        let deleted = log_failure("book_delete", result)? > 0;
        info!("event=book_delete module=catalog status=ok id={id} deleted={deleted}");
        Ok(deleted)
    }
}

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        genre: row.get(3)?,
        read: row.get(4)?,
    })
}

/// Build `UPDATE books SET ... WHERE id = ?n` from the present fields. Column
/// names come from this function only; every value is a bound parameter.
fn build_update(id: i64, patch: &BookPatch) -> (String, Vec<Value>) {
    let mut columns: Vec<&'static str> = Vec::with_capacity(4);
    let mut values: Vec<Value> = Vec::with_capacity(5);

    if let Some(title) = &patch.title {
        columns.push("title");
        values.push(Value::Text(title.clone()));
    }
    if let Some(author) = &patch.author {
        columns.push("author");
        values.push(Value::Text(author.clone()));
    }
    if let Some(genre) = &patch.genre {
        columns.push("genre");
        values.push(genre.clone().map_or(Value::Null, Value::Text));
    }
    if let Some(read) = patch.read {
        columns.push("read");
        values.push(Value::Integer(i64::from(read)));
    }

    let assignments = columns
        .iter()
        .enumerate()
        .map(|(idx, column)| format!("{column} = ?{}", idx + 1))
        .collect::<Vec<_>>()
        .join(", ");
    values.push(Value::Integer(id));
    let sql = format!("UPDATE books SET {assignments} WHERE id = ?{}", values.len());

    (sql, values)
}

/// Lowercase with Rust's full Unicode mapping so stored text folds exactly
/// like the query does. `NULL` stays `NULL`.
fn register_unicode_lower(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        UNICODE_LOWER_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|value| value.to_lowercase()))
        },
    )
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn log_failure<T>(event: &str, result: CatalogResult<T>) -> CatalogResult<T> {
    if let Err(err) = &result {
        error!(
            "event={event} module=catalog status=error error_kind={} error={}",
            err.kind(),
            err
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{CatalogError, StorageConfig};
    use tempfile::TempDir;

    fn catalog() -> (TempDir, Catalog) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(StorageConfig::new(dir.path().join("catalog.sqlite")));
        storage.ensure_schema().unwrap();
        (dir, Catalog::new(storage))
    }

    #[test]
    fn add_then_list_returns_new_unread_record() {
        let (_dir, catalog) = catalog();
        assert!(catalog.list_books().unwrap().is_empty());

        let first = catalog.add_book(&NewBook::new("Dune", "Frank Herbert")).unwrap();
        let second = catalog.add_book(&NewBook::new("Emma", "Jane Austen")).unwrap();
        assert!(second > first);

        let books = catalog.list_books().unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(
            books[0],
            Book {
                id: first,
                title: "Dune".into(),
                author: "Frank Herbert".into(),
                genre: None,
                read: false,
            }
        );
        assert_eq!(books[1].id, second);
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let (_dir, catalog) = catalog();
        let first = catalog.add_book(&NewBook::new("A", "B")).unwrap();
        assert!(catalog.delete_book(first).unwrap());

        let next = catalog.add_book(&NewBook::new("C", "D")).unwrap();
        assert!(next > first);
    }

    #[test]
    fn full_record_round_trips() {
        let (_dir, catalog) = catalog();
        let id = catalog
            .add_book(&NewBook::new("A", "B").with_genre("C").with_read(true))
            .unwrap();

        let stored = catalog.get_book(id).unwrap().unwrap();
        assert_eq!(stored.title, "A");
        assert_eq!(stored.author, "B");
        assert_eq!(stored.genre.as_deref(), Some("C"));
        assert!(stored.read);
    }

    #[test]
    fn empty_genre_is_kept_apart_from_missing_genre() {
        let (_dir, catalog) = catalog();
        let id = catalog.add_book(&NewBook::new("A", "B").with_genre("")).unwrap();
        assert_eq!(catalog.get_book(id).unwrap().unwrap().genre, Some(String::new()));
    }

    #[test]
    fn empty_title_is_rejected_without_leaving_a_row() {
        let (_dir, catalog) = catalog();
        let err = catalog.add_book(&NewBook::new("", "Someone")).unwrap_err();
        assert!(matches!(err, CatalogError::Integrity(_)), "{err:?}");
        assert!(catalog.list_books().unwrap().is_empty());
    }

    #[test]
    fn search_is_case_insensitive_on_title_and_author() {
        let (_dir, catalog) = catalog();
        let gatsby = catalog
            .add_book(&NewBook::new("The Great Gatsby", "F. Scott Fitzgerald"))
            .unwrap();
        catalog.add_book(&NewBook::new("Dune", "Frank Herbert")).unwrap();

        for query in ["great", "GATSBY", "the great gatsby", "fitzGERALD"] {
            let hits = catalog.search_books(query).unwrap();
            assert_eq!(hits.len(), 1, "query {query:?}");
            assert_eq!(hits[0].id, gatsby);
        }
        assert!(catalog.search_books("nonexistent").unwrap().is_empty());
    }

    #[test]
    fn search_folds_non_ascii_case() {
        let (_dir, catalog) = catalog();
        let zola = catalog
            .add_book(&NewBook::new("ÉMILE ZOLA", "Ørjan Ÿ"))
            .unwrap();
        catalog.add_book(&NewBook::new("Dune", "Frank Herbert")).unwrap();

        for query in ["ÉMILE", "émile", "Ørjan", "øRJAN", "ÿ", "ZOLA"] {
            let hits = catalog.search_books(query).unwrap();
            assert_eq!(hits.len(), 1, "query {query:?}");
            assert_eq!(hits[0].id, zola);
        }
        assert!(catalog.search_books("emile").unwrap().is_empty());
    }

    #[test]
    fn search_matches_wildcards_literally() {
        let (_dir, catalog) = catalog();
        catalog.add_book(&NewBook::new("100% Pure", "Anon")).unwrap();
        catalog.add_book(&NewBook::new("1000 Pure", "Anon")).unwrap();
        catalog.add_book(&NewBook::new("snake_case", "Anon")).unwrap();

        let hits = catalog.search_books("0%").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "100% Pure");

        let hits = catalog.search_books("e_c").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "snake_case");
    }

    #[test]
    fn update_read_only_touches_read_and_is_idempotent() {
        let (_dir, catalog) = catalog();
        let id = catalog
            .add_book(&NewBook::new("Dune", "Frank Herbert").with_genre("Sci-Fi"))
            .unwrap();
        let before = catalog.get_book(id).unwrap().unwrap();
        let patch = BookPatch::default().read(true);

        assert_eq!(catalog.update_book(id, &patch).unwrap(), UpdateOutcome::Updated);
        let after_first = catalog.get_book(id).unwrap().unwrap();
        assert_eq!(after_first, Book { read: true, ..before });

        assert_eq!(catalog.update_book(id, &patch).unwrap(), UpdateOutcome::Updated);
        assert_eq!(catalog.get_book(id).unwrap().unwrap(), after_first);
    }

    #[test]
    fn update_can_clear_genre_and_change_several_fields() {
        let (_dir, catalog) = catalog();
        let id = catalog
            .add_book(&NewBook::new("Dune", "Frank Herbert").with_genre("Sci-Fi"))
            .unwrap();

        let patch = BookPatch::default()
            .title("Dune Messiah")
            .author("F. Herbert")
            .genre(None);
        assert_eq!(catalog.update_book(id, &patch).unwrap(), UpdateOutcome::Updated);

        let stored = catalog.get_book(id).unwrap().unwrap();
        assert_eq!(stored.title, "Dune Messiah");
        assert_eq!(stored.author, "F. Herbert");
        assert_eq!(stored.genre, None);
        assert!(!stored.read);
    }

    #[test]
    fn update_of_unknown_id_is_not_found() {
        let (_dir, catalog) = catalog();
        catalog.add_book(&NewBook::new("Dune", "Frank Herbert")).unwrap();
        let before = catalog.list_books().unwrap();

        let outcome = catalog
            .update_book(9999, &BookPatch::default().title("X"))
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::NotFound);
        assert_eq!(catalog.list_books().unwrap(), before);
    }

    #[test]
    fn empty_patch_is_a_noop() {
        let (_dir, catalog) = catalog();
        let id = catalog.add_book(&NewBook::new("Dune", "Frank Herbert")).unwrap();
        let before = catalog.get_book(id).unwrap();

        let outcome = catalog.update_book(id, &BookPatch::default()).unwrap();
        assert_eq!(outcome, UpdateOutcome::NothingToUpdate);
        assert_eq!(catalog.get_book(id).unwrap(), before);
    }

    #[test]
    fn update_to_empty_author_is_an_integrity_error() {
        let (_dir, catalog) = catalog();
        let id = catalog.add_book(&NewBook::new("Dune", "Frank Herbert")).unwrap();

        let err = catalog
            .update_book(id, &BookPatch::default().author(""))
            .unwrap_err();
        assert!(matches!(err, CatalogError::Integrity(_)), "{err:?}");
        assert_eq!(catalog.get_book(id).unwrap().unwrap().author, "Frank Herbert");
    }

    #[test]
    fn delete_removes_only_the_target() {
        let (_dir, catalog) = catalog();
        let keep = catalog.add_book(&NewBook::new("Keep", "Me")).unwrap();
        let gone = catalog.add_book(&NewBook::new("Drop", "Me")).unwrap();

        assert!(catalog.delete_book(gone).unwrap());
        assert!(!catalog.delete_book(gone).unwrap());

        let remaining = catalog.list_books().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, keep);
    }

    #[test]
    fn operations_on_missing_schema_are_query_errors() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(StorageConfig::new(dir.path().join("catalog.sqlite")));
        let catalog = Catalog::new(storage);

        let err = catalog.list_books().unwrap_err();
        assert!(matches!(err, CatalogError::Query(_)), "{err:?}");
    }

    #[test]
    fn update_sql_binds_every_value() {
        let patch = BookPatch::default().author("Robert'); DROP TABLE books;--").read(false);
        let (sql, values) = build_update(7, &patch);
        assert_eq!(sql, "UPDATE books SET author = ?1, read = ?2 WHERE id = ?3");
        assert_eq!(values.len(), 3);
        assert_eq!(values[2], Value::Integer(7));
    }
}
