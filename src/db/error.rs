use std::path::PathBuf;

use rusqlite::{Error as SqlError, ErrorCode};
use thiserror::Error;

/// Failures surfaced by the storage gateway and the catalog service.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The backing file could not be opened or is not usable as a database.
    #[error("cannot open book catalog at {}: {source}", .path.display())]
    Connection {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// A write was rejected by a table constraint.
    #[error("constraint violation: {0}")]
    Integrity(#[source] SqlError),
    /// A statement failed for any other reason.
    #[error("query failed: {0}")]
    Query(#[source] SqlError),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl CatalogError {
    /// Sort a SQLite error into the catalog taxonomy. Errors raised while
    /// talking to a file that turned out to be unreadable are connection
    /// problems even though they only show up on the first statement.
    pub(crate) fn classify(err: SqlError, path: &std::path::Path) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => CatalogError::Integrity(err),
            Some(
                ErrorCode::CannotOpen
                | ErrorCode::NotADatabase
                | ErrorCode::DatabaseCorrupt
                | ErrorCode::PermissionDenied
                | ErrorCode::ReadOnly
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::SystemIoFailure,
            ) => CatalogError::Connection {
                path: path.to_path_buf(),
                source: Box::new(err),
            },
            _ => CatalogError::Query(err),
        }
    }

    /// Short tag used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogError::Connection { .. } => "connection",
            CatalogError::Integrity(_) => "integrity",
            CatalogError::Query(_) => "query",
        }
    }
}
