// camstamp-cli/src/main.rs
//
// Entry point for the camstamp binary.
//
// Parses arguments, sets up logging, picks a reporter and maps the run's
// result onto the process exit code: 0 when every item succeeded (or there
// was nothing to do), 1 when any item failed or the run could not start.

use camstamp::{Cli, logging, run};
use camstamp_core::reporting::ReporterError;
use camstamp_core::{JsonReporter, Reporter, TerminalReporter};
use clap::Parser;
use std::process;
use std::sync::Arc;

fn main() {
    let cli = Cli::parse();

    let reporter: Arc<dyn Reporter> = if cli.progress_json {
        Arc::new(JsonReporter::new())
    } else {
        Arc::new(TerminalReporter::new())
    };

    if let Err(e) = logging::init_logging(cli.verbose, cli.log_file.as_deref()) {
        // Logging is optional; carry on without it.
        reporter.warning(&e.to_string());
    }

    let code = match run(&cli, Arc::clone(&reporter)) {
        Ok((successes, failures)) => {
            log::info!("Finished: {successes} succeeded, {failures} failed");
            i32::from(failures > 0)
        }
        Err(e) => {
            log::error!("{e}");
            reporter.error(&ReporterError {
                title: "camstamp could not run".to_string(),
                message: e.to_string(),
                context: None,
                suggestion: None,
            });
            1
        }
    };
    process::exit(code);
}
