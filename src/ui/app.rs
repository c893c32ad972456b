use std::mem;

use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;

use crate::db::Catalog;
use crate::models::{Book, BookPatch, UpdateOutcome};

use super::forms::{parse_book_id, BookField, BookForm, ConfirmBookDelete, Prompt};
use super::helpers::{centered_rect, cursor_in, failure_message, surface_error};
use super::screens::BookListScreen;

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows skipped by PageUp / PageDown.
const PAGE_STEP: isize = 10;

/// Fine-grained modes layered over the book table.
enum Mode {
    Normal,
    AddingBook(BookForm),
    EditingBook { id: i64, form: BookForm },
    ConfirmDelete(ConfirmBookDelete),
    Searching(Prompt),
    GoToId(Prompt),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
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

/// Menu state on top of the catalog. Catalog failures are turned into footer
/// messages here; nothing the store does can end the session.
pub struct App {
    catalog: Catalog,
    list: BookListScreen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(catalog: Catalog, books: Vec<Book>) -> Self {
        Self {
            catalog,
            list: BookListScreen::new(books),
            mode: Mode::Normal,
            status: None,
        }
    }

    /// Process one key press. Returns true when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::AddingBook(form) => self.handle_add_book(code, form),
            Mode::EditingBook { id, form } => self.handle_edit_book(code, id, form),
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm),
            Mode::Searching(prompt) => self.handle_search(code, prompt),
            Mode::GoToId(prompt) => self.handle_go_to_id(code, prompt),
        };

        exit
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc => {
                if self.list.search.is_some() {
                    self.clear_status();
                    self.show_all(None);
                } else {
                    *exit = true;
                }
            }
            KeyCode::Up => self.list.move_selection(-1),
            KeyCode::Down => self.list.move_selection(1),
            KeyCode::PageUp => self.list.move_selection(-PAGE_STEP),
            KeyCode::PageDown => self.list.move_selection(PAGE_STEP),
            KeyCode::Home => self.list.select_first(),
            KeyCode::End => self.list.select_last(),
            KeyCode::Char('a') | KeyCode::Char('A') => {
                self.clear_status();
                return Mode::AddingBook(BookForm::default());
            }
            KeyCode::Char('e') | KeyCode::Char('E') => match self.list.current_book() {
                Some(book) => {
                    let id = book.id;
                    let form = BookForm::for_edit(book);
                    self.clear_status();
                    return Mode::EditingBook { id, form };
                }
                None => self.set_status("No book selected to edit.", StatusKind::Error),
            },
            KeyCode::Char('d') | KeyCode::Char('D') => match self.list.current_book() {
                Some(book) => {
                    let book = book.clone();
                    self.clear_status();
                    return Mode::ConfirmDelete(ConfirmBookDelete { book });
                }
                None => self.set_status("No book selected to delete.", StatusKind::Error),
            },
            KeyCode::Char('r') | KeyCode::Char('R') => self.toggle_read(),
            KeyCode::Char('l') | KeyCode::Char('L') => {
                self.clear_status();
                self.show_all(None);
            }
            KeyCode::Char('/') => {
                self.clear_status();
                return Mode::Searching(Prompt::default());
            }
            KeyCode::Char('g') | KeyCode::Char('G') => {
                self.clear_status();
                return Mode::GoToId(Prompt::default());
            }
            _ => {}
        }
        Mode::Normal
    }

    fn handle_add_book(&mut self, code: KeyCode, mut form: BookForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Add book cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Enter => {
                let book = match form.parse_new() {
                    Ok(book) => book,
                    Err(err) => {
                        form.error = Some(surface_error(&err));
                        return Mode::AddingBook(form);
                    }
                };
                match self.catalog.add_book(&book) {
                    Ok(id) => {
                        if self.reload(Some(id)) {
                            self.set_status(format!("Added '{}'.", book.title), StatusKind::Info);
                        }
                    }
                    Err(err) => {
                        self.set_status(failure_message("add book", &err), StatusKind::Error)
                    }
                }
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::AddingBook(form)
    }

    fn handle_edit_book(&mut self, code: KeyCode, id: i64, mut form: BookForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Enter => {
                let patch = match form.parse_patch() {
                    Ok(patch) => patch,
                    Err(err) => {
                        form.error = Some(surface_error(&err));
                        return Mode::EditingBook { id, form };
                    }
                };
                self.apply_patch(id, &patch);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::EditingBook { id, form }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmBookDelete) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                let book = &confirm.book;
                match self.catalog.delete_book(book.id) {
                    Ok(true) => {
                        if self.reload(None) {
                            self.set_status(format!("Deleted '{}'.", book.title), StatusKind::Info);
                        }
                    }
                    Ok(false) => {
                        if self.reload(None) {
                            self.set_status(
                                format!("No book with ID {} to delete.", book.id),
                                StatusKind::Error,
                            );
                        }
                    }
                    Err(err) => {
                        self.set_status(failure_message("delete book", &err), StatusKind::Error)
                    }
                }
                Mode::Normal
            }
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    fn handle_search(&mut self, code: KeyCode, mut prompt: Prompt) -> Mode {
        match code {
            KeyCode::Esc => return Mode::Normal,
            KeyCode::Enter => {
                let query = prompt.input.trim().to_string();
                if query.is_empty() {
                    prompt.error = Some("Search query cannot be empty.".to_string());
                    return Mode::Searching(prompt);
                }
                self.run_search(query);
                return Mode::Normal;
            }
            KeyCode::Backspace => prompt.backspace(),
            KeyCode::Char(ch) => prompt.push_char(ch),
            _ => {}
        }
        Mode::Searching(prompt)
    }

    fn handle_go_to_id(&mut self, code: KeyCode, mut prompt: Prompt) -> Mode {
        match code {
            KeyCode::Esc => return Mode::Normal,
            KeyCode::Enter => {
                let id = match parse_book_id(&prompt.input) {
                    Ok(id) => id,
                    Err(err) => {
                        prompt.error = Some(surface_error(&err));
                        return Mode::GoToId(prompt);
                    }
                };
                match self.catalog.get_book(id) {
                    Ok(Some(book)) => {
                        if !self.list.select_id(id) {
                            self.show_all(Some(id));
                        }
                        self.set_status(format!("Selected '{}'.", book.title), StatusKind::Info);
                    }
                    Ok(None) => {
                        prompt.error = Some(format!("No book with ID {id}."));
                        return Mode::GoToId(prompt);
                    }
                    Err(err) => {
                        self.set_status(failure_message("look up book", &err), StatusKind::Error)
                    }
                }
                return Mode::Normal;
            }
            KeyCode::Backspace => prompt.backspace(),
            KeyCode::Char(ch) => prompt.push_char(ch),
            _ => {}
        }
        Mode::GoToId(prompt)
    }

    fn toggle_read(&mut self) {
        let Some(book) = self.list.current_book() else {
            self.set_status("No book selected.", StatusKind::Error);
            return;
        };
        let id = book.id;
        let patch = BookPatch::default().read(!book.read);
        self.apply_patch(id, &patch);
    }

    fn apply_patch(&mut self, id: i64, patch: &BookPatch) {
        match self.catalog.update_book(id, patch) {
            Ok(UpdateOutcome::Updated) => {
                if self.reload(Some(id)) {
                    self.set_status(format!("Updated book {id}."), StatusKind::Info);
                }
            }
            Ok(UpdateOutcome::NotFound) => {
                if self.reload(None) {
                    self.set_status(format!("No book with ID {id}."), StatusKind::Error);
                }
            }
            Ok(UpdateOutcome::NothingToUpdate) => {
                self.set_status("Nothing to update.", StatusKind::Info);
            }
            Err(err) => self.set_status(failure_message("update book", &err), StatusKind::Error),
        }
    }

    fn run_search(&mut self, query: String) {
        match self.catalog.search_books(&query) {
            Ok(books) => {
                let message = if books.is_empty() {
                    (format!("No books match '{query}'."), StatusKind::Error)
                } else {
                    (
                        format!("{} book(s) match '{query}'. Esc shows all.", books.len()),
                        StatusKind::Info,
                    )
                };
                self.list.search = Some(query);
                self.list.set_books(books, None);
                self.list.select_first();
                self.set_status(message.0, message.1);
            }
            Err(err) => self.set_status(failure_message("search books", &err), StatusKind::Error),
        }
    }

    fn show_all(&mut self, focus_id: Option<i64>) {
        self.list.search = None;
        self.reload(focus_id);
    }

    /// Refresh the visible rows from the store, re-running the active search.
    /// On failure the error is left in the footer and false is returned, so
    /// callers must not overwrite it with a success message.
    fn reload(&mut self, focus_id: Option<i64>) -> bool {
        let result = match &self.list.search {
            Some(query) => self.catalog.search_books(query),
            None => self.catalog.list_books(),
        };
        match result {
            Ok(books) => {
                self.list.set_books(books, focus_id);
                true
            }
            Err(err) => {
                self.set_status(failure_message("list books", &err), StatusKind::Error);
                false
            }
        }
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

        self.draw_book_table(frame, content_area);

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingBook(form) => self.draw_book_form(frame, area, "Add Book", form),
            Mode::EditingBook { id, form } => {
                self.draw_book_form(frame, area, &format!("Edit Book {id}"), form)
            }
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Searching(prompt) => self.draw_prompt(frame, area, "Search", "Title or author: ", prompt),
            Mode::GoToId(prompt) => self.draw_prompt(frame, area, "Go To Book", "Book ID: ", prompt),
            Mode::Normal => {}
        }
    }

    fn draw_book_table(&self, frame: &mut Frame, area: Rect) {
        let title = match &self.list.search {
            Some(query) => format!("Search '{query}' ({})", self.list.books.len()),
            None => format!("Books ({})", self.list.books.len()),
        };
        let block = Block::default().borders(Borders::ALL).title(title);

        if self.list.books.is_empty() {
            let text = if self.list.search.is_some() {
                "No books match this search. Press Esc to show all."
            } else {
                "No books in the catalog yet. Press 'a' to add one."
            };
            let message = Paragraph::new(text)
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let header = Row::new(["ID", "Title", "Author", "Genre", "Read"])
            .style(Style::default().add_modifier(Modifier::BOLD));
        let rows = self.list.books.iter().map(|book| {
            Row::new([
                Cell::from(book.id.to_string()),
                Cell::from(book.title.clone()),
                Cell::from(book.author.clone()),
                Cell::from(book.genre_label().to_string()),
                Cell::from(book.read_label()),
            ])
        });
        let widths = [
            Constraint::Length(6),
            Constraint::Percentage(38),
            Constraint::Percentage(28),
            Constraint::Percentage(20),
            Constraint::Length(5),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("> ");

        let mut state = TableState::default().with_selected(Some(self.list.selected));
        frame.render_stateful_widget(table, area, &mut state);
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

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let hints: &[(&'static str, &'static str)] = match &self.mode {
            Mode::Normal if self.list.search.is_some() => &[
                ("[a]", " Add   "),
                ("[e]", " Edit   "),
                ("[d]", " Delete   "),
                ("[r]", " Read   "),
                ("[/]", " Search   "),
                ("[l]", " List all   "),
                ("[Esc]", " Show all   "),
                ("[q]", " Quit"),
            ],
            Mode::Normal => &[
                ("[a]", " Add   "),
                ("[e]", " Edit   "),
                ("[d]", " Delete   "),
                ("[r]", " Read   "),
                ("[/]", " Search   "),
                ("[l]", " List all   "),
                ("[g]", " Go to ID   "),
                ("[q]", " Quit"),
            ],
            Mode::AddingBook(_) | Mode::EditingBook { .. } => &[
                ("[Tab]", " Next field   "),
                ("[Enter]", " Save   "),
                ("[Esc]", " Cancel"),
            ],
            Mode::ConfirmDelete(_) => &[("[y]", " Delete   "), ("[n]", " Keep")],
            Mode::Searching(_) | Mode::GoToId(_) => &[("[Enter]", " Go   "), ("[Esc]", " Cancel")],
        };

        let spans = hints
            .iter()
            .flat_map(|(key, text)| [Span::styled(*key, key_style), Span::raw(*text)])
            .collect::<Vec<_>>();
        Line::from(spans)
    }

    fn draw_book_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &BookForm) {
        let popup_area = centered_rect(70, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = BookField::ALL
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else if form.is_edit() {
            lines.push(Line::from(Span::styled(
                "Leave blank to keep • '-' clears the genre • Enter to save • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let row = BookField::ALL
            .iter()
            .position(|field| *field == form.active)
            .unwrap_or(0);
        let column = form.active.label().chars().count() + 2 + form.value_len(form.active);
        frame.set_cursor_position(cursor_in(inner, column, row));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmBookDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Confirm Deletion")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!("Delete book {} ({})?", confirm.book.id, confirm.book)),
            Line::from("This cannot be undone."),
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

    fn draw_prompt(&self, frame: &mut Frame, area: Rect, title: &str, label: &str, prompt: &Prompt) {
        let height = 4u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title(title.to_string());
        let mut lines = vec![Line::from(format!("{label}{}", prompt.input))];
        if let Some(error) = &prompt.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        }
        let paragraph = Paragraph::new(lines).block(block.clone());
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let column = label.chars().count() + prompt.input.chars().count();
        frame.set_cursor_position(cursor_in(inner, column, 0));
    }
}
