//! Logging helpers
//!
//! Consistent message formats for file operations and table-level stages.

use std::path::Path;
use std::time::Duration;

/// Log an operation start
pub fn log_operation_start(operation: &str, path: &Path) {
    log::info!("{} {}", operation, path.display());
}

/// Log an operation completion
///
/// # Arguments
/// * `operation` - Past-tense description, e.g. "read"
/// * `path` - File or directory that was operated on
/// * `items` - Number of items processed
/// * `elapsed` - Optional elapsed time
pub fn log_operation_complete(
    operation: &str,
    path: &Path,
    items: usize,
    elapsed: Option<Duration>,
) {
    match elapsed {
        Some(duration) => log::info!(
            "Successfully {} {} items from {} in {:?}",
            operation,
            items,
            path.display(),
            duration
        ),
        None => log::info!(
            "Successfully {} {} items from {}",
            operation,
            items,
            path.display()
        ),
    }
}

/// Log a table stage with its row counts
pub fn log_stage(stage: &str, rows_in: usize, rows_out: usize, elapsed: Duration) {
    if rows_in == rows_out {
        log::info!("{stage}: {rows_out} rows in {elapsed:?}");
    } else {
        log::info!(
            "{stage}: {rows_in} -> {rows_out} rows ({} removed) in {elapsed:?}",
            rows_in - rows_out.min(rows_in)
        );
    }
}

/// Log a warning, optionally tied to a path
pub fn log_warning(message: &str, path: Option<&Path>) {
    if let Some(path) = path {
        log::warn!("{}: {}", message, path.display());
    } else {
        log::warn!("{message}");
    }
}
