// ============================================================================
// camstamp-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Custom Error Types for camstamp-core
//
// This module defines the error taxonomy used throughout the library. Process
// failures, discovery problems and missing metadata each get their own variant
// so callers can react to them without string matching.
//
// KEY COMPONENTS:
// - CoreError: enum of all library failures
// - CoreResult: result alias
// - Helper constructors for external command failures
//
// The `MetadataUnavailable` variant is special: it must surface to the caller
// as-is and is never converted into a substitute timestamp.

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use thiserror::Error;

/// Errors produced by camstamp-core.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Path error: {0}")]
    PathError(String),

    #[error("No .MTS files found")]
    NoFilesFound,

    #[error("Required tool '{0}' was not found. Install FFmpeg or place it next to the camstamp executable.")]
    DependencyNotFound(String),

    #[error("Failed to start {0}: {1}")]
    CommandStart(String, #[source] io::Error),

    #[error("Failed while waiting for {0}: {1}")]
    CommandWait(String, #[source] io::Error),

    #[error("{0} exited with {1}: {2}")]
    CommandFailed(String, ExitStatus, String),

    /// Neither the recording-date marker nor the container creation tag
    /// yielded a timestamp.
    #[error("Could not extract recording time metadata from {}: {reason}", display_name(.path))]
    MetadataUnavailable { path: PathBuf, reason: String },

    #[error(transparent)]
    InvalidPosition(#[from] crate::config::PositionParseError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid input pattern: {0}")]
    Glob(String),

    #[error("{0}")]
    OperationFailed(String),
}

impl CoreError {
    /// Returns true when this error reports that no recording timestamp
    /// could be resolved for an input.
    #[must_use]
    pub fn is_metadata_unavailable(&self) -> bool {
        matches!(self, CoreError::MetadataUnavailable { .. })
    }

    pub(crate) fn metadata_unavailable(path: &Path, reason: impl Into<String>) -> Self {
        CoreError::MetadataUnavailable {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Result type for camstamp-core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Builds the error returned when an external command cannot be spawned.
pub fn command_start_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    let cmd = cmd.into();
    if err.kind() == io::ErrorKind::NotFound {
        CoreError::DependencyNotFound(cmd)
    } else {
        CoreError::CommandStart(cmd, err)
    }
}

/// Builds the error returned when waiting on a spawned command fails.
pub fn command_wait_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandWait(cmd.into(), err)
}

/// Builds the error returned when a command exits unsuccessfully.
pub fn command_failed_error(
    cmd: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed(cmd.into(), status, stderr.into())
}
