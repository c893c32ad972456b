//! Ratatui front-end: a book table with modal dialogs for adding, editing,
//! deleting, searching and jumping to a book by id.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
