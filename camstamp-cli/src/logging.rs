// ============================================================================
// camstamp-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: Console or file logging for the CLI
//
// Console logging goes through `env_logger` on stderr, so it never mixes
// with JSON progress on stdout. `RUST_LOG` overrides the default level.
// With `--log-file` every record goes to a file through the core's log4rs
// setup instead.

use crate::error::CliResult;
use camstamp_core::CoreError;
use camstamp_core::file_logging::setup_file_logging;
use log::LevelFilter;
use std::path::{Path, PathBuf};

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Resolves `--log-file`: an existing directory gets a timestamped file.
#[must_use]
pub fn log_file_path(requested: &Path) -> PathBuf {
    if requested.is_dir() {
        requested.join(format!("camstamp_{}.log", get_timestamp()))
    } else {
        requested.to_path_buf()
    }
}

/// Initialises logging for this process.
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> CliResult<()> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    if let Some(requested) = log_file {
        let path = log_file_path(requested);
        setup_file_logging(&path, level).map_err(|e| {
            CoreError::OperationFailed(format!(
                "Failed to set up log file {}: {e}",
                path.display()
            ))
        })?;
        log::info!("camstamp {} logging to {}", env!("CARGO_PKG_VERSION"), path.display());
        return Ok(());
    }

    // Console output is for problems unless asked otherwise; the reporter
    // already narrates progress.
    let console_default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(console_default))
        .format_timestamp(None)
        .format_target(false)
        .try_init()
        .map_err(|e| CoreError::OperationFailed(format!("Failed to initialise logging: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_has_expected_shape() {
        let ts = get_timestamp();
        assert_eq!(ts.len(), 15);
        assert_eq!(ts.as_bytes()[8], b'_');
    }

    #[test]
    fn directory_gets_timestamped_log_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = log_file_path(dir.path());
        assert_eq!(path.parent(), Some(dir.path()));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("camstamp_") && name.ends_with(".log"));

        let explicit = dir.path().join("run.log");
        assert_eq!(log_file_path(&explicit), explicit);
    }
}
