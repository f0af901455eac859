// camstamp-cli/src/lib.rs
//
// Library portion of the camstamp CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;

// Re-export items needed by the binary or integration tests
pub use cli::Cli;
pub use commands::convert::{build_config, run_batch, run_legacy};
pub use commands::inspect::run_inspect;
pub use error::{CliResult, with_context};

use camstamp_core::{CoreError, Reporter};
use std::sync::Arc;

/// Dispatches to inspection, single-file or batch conversion.
/// Returns `(successes, failures)`.
pub fn run(cli: &Cli, reporter: Arc<dyn Reporter>) -> CliResult<(usize, usize)> {
    if cli.inspect {
        return run_inspect(cli, reporter.as_ref());
    }
    match cli.legacy_target() {
        Some(_) if cli.output_dir.is_some() => Err(CoreError::Config(
            "--output-dir cannot be combined with an explicit .mp4 output".to_string(),
        )),
        Some((input, output)) => run_legacy(cli, &input, &output, reporter),
        None => run_batch(cli, reporter),
    }
}
