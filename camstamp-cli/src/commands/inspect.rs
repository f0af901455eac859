// camstamp-cli/src/commands/inspect.rs
//
// Prints the bytes around each input's recording-date marker together with
// the decoded value, for diagnosing clips whose timestamp comes out wrong.

use crate::cli::Cli;
use crate::error::CliResult;

use camstamp_core::metadata::marker::{dump_marker_region, read_leading_bytes};
use camstamp_core::utils::display_filename;
use camstamp_core::{CoreError, Reporter, resolve_inputs};

use console::style;
use log::warn;
use std::path::Path;

/// Bytes shown ahead of the marker.
const BYTES_BEFORE: usize = 16;
/// Bytes shown from the marker onward.
const BYTES_AFTER: usize = 48;

/// Renders the inspection report for one file.
pub fn describe_file(path: &Path) -> std::io::Result<String> {
    let bytes = read_leading_bytes(path)?;
    let mut out = format!("{}\n", display_filename(path));
    match dump_marker_region(&bytes, BYTES_BEFORE, BYTES_AFTER) {
        Some(dump) => {
            out.push_str(&format!("  Marker at offset {:#x}\n", dump.marker_offset));
            out.push_str(&dump.to_hex());
            match dump.decoded {
                Some(dt) => out.push_str(&format!("  Decoded: {}\n", dt.format("%Y-%m-%d %H:%M:%S"))),
                None => out.push_str("  Decoded: invalid date block\n"),
            }
        }
        None => out.push_str("  Marker: not found\n"),
    }
    Ok(out)
}

/// Inspects every resolved input. Returns `(inspected, unreadable)`.
pub fn run_inspect(cli: &Cli, reporter: &dyn Reporter) -> CliResult<(usize, usize)> {
    let files = resolve_inputs(&cli.inputs)?;
    if files.is_empty() {
        reporter.warning(&format!("{}.", CoreError::NoFilesFound));
        return Ok((0, 0));
    }

    let mut inspected = 0;
    let mut unreadable = 0;
    for file in &files {
        match describe_file(file) {
            Ok(report) => {
                print!("{report}");
                inspected += 1;
            }
            Err(e) => {
                warn!("Could not read {}: {e}", file.display());
                println!(
                    "{}\n  {}",
                    display_filename(file),
                    style(format!("Unreadable: {e}")).red()
                );
                unreadable += 1;
            }
        }
    }
    Ok((inspected, unreadable))
}
