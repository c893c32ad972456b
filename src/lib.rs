//! Core library surface for the book catalog.
//!
//! `db` holds the storage gateway and the catalog service, `models` the record
//! types they exchange, and `ui` the terminal menu that drives them. The binary
//! only wires these together.
pub mod db;
pub mod logging;
pub mod models;
pub mod ui;

/// Convenience re-exports for the persistence layer.
pub use db::{Catalog, CatalogError, CatalogResult, Storage, StorageConfig};

/// Record types shared by every layer.
pub use models::{Book, BookPatch, NewBook, UpdateOutcome};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
