// ============================================================================
// camstamp-cli/src/error.rs
// ============================================================================
//
// The CLI reuses the core error type and only prefixes context on the way out.

use camstamp_core::{CoreError, CoreResult};

use std::fmt;

pub type CliResult<T> = CoreResult<T>;

/// Prefixes `context` to the error of `result`, e.g.
/// `FFmpeg is not available: Required dependency 'ffmpeg' not found`.
pub fn with_context<T>(result: CoreResult<T>, context: impl fmt::Display) -> CliResult<T> {
    result.map_err(|e| CoreError::OperationFailed(format!("{context}: {e}")))
}
