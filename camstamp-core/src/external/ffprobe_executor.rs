//! ffprobe integration for recording-time and duration queries.
//!
//! The probe is run through `std::process::Command` against the configured
//! executable path so that bundled or overridden tools are honoured.

use crate::error::{CoreError, CoreResult, command_failed_error, command_start_error};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Probe queries needed by the conversion driver.
pub trait FfprobeExecutor {
    /// Returns the raw output of the creation-time tag query: one line per
    /// matching tag, possibly empty.
    fn creation_time_tag(&self, input_path: &Path) -> CoreResult<String>;

    /// Returns the container duration in seconds.
    fn duration(&self, input_path: &Path) -> CoreResult<f64>;
}

/// [`FfprobeExecutor`] that shells out to an ffprobe executable.
#[derive(Debug, Clone)]
pub struct CommandFfprobeExecutor {
    ffprobe: PathBuf,
}

impl CommandFfprobeExecutor {
    pub fn new(ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe: ffprobe.into(),
        }
    }

    fn run(&self, args: &[&str], input_path: &Path) -> CoreResult<Output> {
        let mut cmd = Command::new(&self.ffprobe);
        cmd.args(args).arg(input_path);
        log::debug!("Running ffprobe: {cmd:?}");

        cmd.output()
            .map_err(|e| command_start_error(self.ffprobe.display().to_string(), e))
    }
}

fn failure(input_path: &Path, output: &Output) -> CoreError {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    log::debug!(
        "ffprobe failed for {} with {}: {stderr}",
        input_path.display(),
        output.status
    );
    command_failed_error("ffprobe", output.status, stderr)
}

/// Arguments for the creation-time tag query (input path appended).
pub const CREATION_TIME_ARGS: &[&str] = &[
    "-v",
    "quiet",
    "-select_streams",
    "v:0",
    "-show_entries",
    "format_tags=creation_time:stream_tags=creation_time",
    "-of",
    "csv=p=0",
];

/// Arguments for the duration query (input path appended).
pub const DURATION_ARGS: &[&str] = &[
    "-v",
    "error",
    "-show_entries",
    "format=duration",
    "-of",
    "default=noprint_wrappers=1:nokey=1",
];

impl FfprobeExecutor for CommandFfprobeExecutor {
    fn creation_time_tag(&self, input_path: &Path) -> CoreResult<String> {
        let output = self.run(CREATION_TIME_ARGS, input_path)?;
        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        // Usable output wins over the exit status.
        if text.trim().is_empty() && !output.status.success() {
            return Err(failure(input_path, &output));
        }
        if !output.status.success() {
            log::debug!(
                "ffprobe exited with {} for {} but printed a tag",
                output.status,
                input_path.display()
            );
        }
        log::debug!("ffprobe creation_time for {}: {:?}", input_path.display(), text.trim());
        Ok(text)
    }

    fn duration(&self, input_path: &Path) -> CoreResult<f64> {
        let output = self.run(DURATION_ARGS, input_path)?;
        if !output.status.success() {
            return Err(failure(input_path, &output));
        }
        let text = String::from_utf8_lossy(&output.stdout);
        parse_duration(&text).ok_or_else(|| {
            CoreError::OperationFailed(format!(
                "ffprobe returned no usable duration for {}: {:?}",
                input_path.display(),
                text.trim()
            ))
        })
    }
}

/// Parses the first numeric line of a duration query.
pub(crate) fn parse_duration(text: &str) -> Option<f64> {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| line.parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs > 0.0)
}
