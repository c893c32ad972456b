//! Binary entry point: resolve where the catalog lives, start file logging,
//! make sure the table exists, then hand control to the TUI.
use anyhow::{anyhow, Context};
use book_catalog::logging::{init_logging, log_dir_for};
use book_catalog::db::DB_PATH_ENV;
use book_catalog::{run_app, App, Catalog, Storage, StorageConfig};

fn main() -> anyhow::Result<()> {
    let config = StorageConfig::from_env().ok_or_else(|| {
        anyhow!("could not locate home directory; set {DB_PATH_ENV} to a database path")
    })?;
    let _logger = init_logging(&log_dir_for(&config.path))?;

    let storage = Storage::new(config);
    storage
        .ensure_schema()
        .context("failed to prepare the book catalog")?;

    let catalog = Catalog::new(storage);
    let books = catalog.list_books().context("failed to load books")?;

    let mut app = App::new(catalog, books);
    run_app(&mut app)
}
