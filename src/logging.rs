//! File-backed logging bootstrap. The TUI owns the terminal, so log output
//! goes to rotating files next to the database instead of stderr.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::info;

const LOG_FILE_BASENAME: &str = "book-catalog";
const LOG_DIR_NAME: &str = "logs";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;

/// Start the logger. `RUST_LOG` overrides the build-mode default level.
///
/// The returned handle flushes buffered lines when dropped, so the caller must
/// keep it alive until the program exits.
pub fn init_logging(log_dir: &Path) -> Result<LoggerHandle> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let handle = Logger::try_with_env_or_str(default_log_level())
        .context("invalid log specification")?
        .log_to_file(
            FileSpec::default()
                .directory(log_dir)
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .context("failed to start logger")?;

    info!(
        "event=app_start module=core status=ok version={} log_dir={}",
        env!("CARGO_PKG_VERSION"),
        log_dir.display()
    );
    Ok(handle)
}

/// Logs live in a `logs/` folder beside the database file.
pub fn log_dir_for(db_path: &Path) -> PathBuf {
    db_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .join(LOG_DIR_NAME)
}

fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_dir_sits_next_to_database() {
        let dir = log_dir_for(Path::new("/home/reader/.book-catalog/catalog.sqlite"));
        assert_eq!(dir, PathBuf::from("/home/reader/.book-catalog/logs"));
    }

    #[test]
    fn bare_file_name_logs_to_working_directory() {
        assert_eq!(log_dir_for(Path::new("catalog.sqlite")), PathBuf::from("./logs"));
    }
}
