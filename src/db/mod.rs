//! Persistence layer split into the storage gateway (connection lifecycle and
//! schema) and the catalog service (book CRUD).

mod books;
mod connection;
mod error;

pub use books::Catalog;
pub use connection::{Storage, StorageConfig, DB_PATH_ENV};
pub use error::{CatalogError, CatalogResult};
