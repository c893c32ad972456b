use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::BaseDirs;
use log::{error, info};
use rusqlite::Connection;

use super::error::{CatalogError, CatalogResult};

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".book-catalog";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "catalog.sqlite";
/// Environment variable that overrides the database location.
pub const DB_PATH_ENV: &str = "BOOK_CATALOG_DB";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the catalog lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub path: PathBuf,
}

impl StorageConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolve the database path from `BOOK_CATALOG_DB`, falling back to
    /// `~/.book-catalog/catalog.sqlite`. Returns `None` only when neither the
    /// variable nor a home directory is available.
    pub fn from_env() -> Option<Self> {
        Self::resolve(env::var_os(DB_PATH_ENV), || {
            BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
        })
    }

    /// An explicit, non-empty override wins; otherwise the catalog goes under
    /// the home directory. `home` is only consulted when there is no override.
    fn resolve(
        override_path: Option<OsString>,
        home: impl FnOnce() -> Option<PathBuf>,
    ) -> Option<Self> {
        match override_path {
            Some(raw) if !raw.is_empty() => Some(Self::new(raw)),
            _ => home().map(|home| Self::new(home.join(DATA_DIR_NAME).join(DB_FILE_NAME))),
        }
    }
}

/// Gateway to the SQLite file. It only holds configuration; every call opens
/// its own connection and closes it before returning.
#[derive(Debug, Clone)]
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Open a live connection to the configured file.
    pub fn connect(&self) -> CatalogResult<Connection> {
        let path = self.path();
        let conn = Connection::open(path).map_err(|err| CatalogError::Connection {
            path: path.to_path_buf(),
            source: Box::new(err),
        })?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .and_then(|_| conn.busy_timeout(BUSY_TIMEOUT))
            .map_err(|err| CatalogError::classify(err, path))?;
        Ok(conn)
    }

    /// Scoped acquisition: open a connection, hand it to `work`, and drop it
    /// on every exit path. SQLite errors raised inside `work` are sorted into
    /// the catalog taxonomy.
    pub fn with_connection<T, F>(&self, work: F) -> CatalogResult<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self.connect()?;
        let result = work(&conn).map_err(|err| CatalogError::classify(err, self.path()));
        drop(conn);
        result
    }

    /// Create the parent directory, the database file and the `books` table
    /// if any of them are missing. Safe to run at every start-up.
    pub fn ensure_schema(&self) -> CatalogResult<()> {
        let path = self.path();
        info!(
            "event=ensure_schema module=db status=start path={}",
            path.display()
        );

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(err) = fs::create_dir_all(parent) {
                error!(
                    "event=ensure_schema module=db status=error error_code=data_dir_failed error={}",
                    err
                );
                return Err(CatalogError::Connection {
                    path: path.to_path_buf(),
                    source: Box::new(err),
                });
            }
        }

        let result = self.with_connection(|conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS books (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL CHECK (title <> ''),
                    author TEXT NOT NULL CHECK (author <> ''),
                    genre TEXT,
                    read INTEGER NOT NULL DEFAULT 0 CHECK (read IN (0, 1))
                )",
                [],
            )
        });

        match result {
            Ok(_) => {
                info!("event=ensure_schema module=db status=ok");
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=ensure_schema module=db status=error error_kind={} error={}",
                    err.kind(),
                    err
                );
                Err(err)
            }
        }
    }
}
