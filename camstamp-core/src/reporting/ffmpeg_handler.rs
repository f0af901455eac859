//! `FFmpeg` progress handler
//!
//! Turns the event stream of one encode into [`ProgressSnapshot`]s for the
//! reporter, forwards encoder log lines to the `ffmpeg_log` target and keeps
//! the error lines so a failed encode can explain itself.

use super::{ProgressSnapshot, Reporter};
use crate::error::CoreResult;
use crate::utils::{format_duration, parse_ffmpeg_time};
use ffmpeg_sidecar::event::{FfmpegEvent, FfmpegProgress, LogLevel as FfmpegLogLevel};
use std::time::Duration;

/// Number of error lines kept for failure messages.
const MAX_ERROR_LINES: usize = 20;

/// Handler for the events of a single encode.
pub struct FfmpegProgressHandler<'a> {
    duration: Option<f64>,
    reporter: &'a dyn Reporter,
    last_logged_threshold: i32,
    last_percent: Option<f64>,
    error_lines: Vec<String>,
}

impl<'a> FfmpegProgressHandler<'a> {
    /// `duration` is the clip length in seconds; `None` disables percentages.
    #[must_use]
    pub fn new(duration: Option<f64>, reporter: &'a dyn Reporter) -> Self {
        Self {
            duration: duration.filter(|d| *d > 0.0),
            reporter,
            last_logged_threshold: -1,
            last_percent: None,
            error_lines: Vec::new(),
        }
    }

    pub fn handle_event(&mut self, event: FfmpegEvent) -> CoreResult<()> {
        match event {
            FfmpegEvent::Progress(progress) => self.handle_progress(&progress),
            FfmpegEvent::Log(level, message) => self.handle_log(&level, &message),
            FfmpegEvent::Error(error) => self.handle_error(error),
            _ => {}
        }
        Ok(())
    }

    /// Last computed completion percentage.
    #[must_use]
    pub fn last_percent(&self) -> Option<f64> {
        self.last_percent
    }

    /// Error output collected so far, newest last.
    #[must_use]
    pub fn error_output(&self) -> String {
        self.error_lines.join("\n")
    }

    /// Completion percentage for an elapsed encode time, capped at 100.
    #[must_use]
    pub fn percent_for(&self, current_secs: f64) -> Option<f64> {
        self.duration
            .map(|total| (current_secs / total * 100.0).clamp(0.0, 100.0))
    }

    fn handle_progress(&mut self, progress: &FfmpegProgress) {
        let current_secs = parse_ffmpeg_time(&progress.time).unwrap_or(0.0);
        let percent = self.percent_for(current_secs);
        let eta = match self.duration {
            Some(total) if progress.speed > 0.01 && total > current_secs => Some(
                Duration::from_secs_f64((total - current_secs) / f64::from(progress.speed)),
            ),
            Some(_) => Some(Duration::ZERO),
            None => None,
        };

        self.reporter.encoding_progress(&ProgressSnapshot {
            percent: percent.map(|p| p as f32),
            current_secs,
            total_secs: self.duration,
            speed: progress.speed,
            fps: progress.fps,
            eta,
        });

        if let Some(percent) = percent {
            let threshold = (percent as i32 / 10) * 10;
            if threshold > self.last_logged_threshold {
                log::info!(
                    target: "camstamp::progress",
                    "Encoding progress: {percent:.1}% | Time: {} / {} | Speed: {:.2}x",
                    format_duration(current_secs),
                    format_duration(self.duration.unwrap_or(0.0)),
                    progress.speed,
                );
                self.last_logged_threshold = threshold;
            }
        }
        self.last_percent = percent;
    }

    fn handle_log(&mut self, level: &FfmpegLogLevel, message: &str) {
        let log_level = map_ffmpeg_log_level(level);
        if log_level <= log::Level::Error {
            self.push_error(message.to_string());
        }
        if log_level == log::Level::Info {
            log::debug!(target: "ffmpeg_log", "{message}");
        } else {
            log::log!(target: "ffmpeg_log", log_level, "{message}");
        }
    }

    fn handle_error(&mut self, error: String) {
        log::debug!(target: "ffmpeg_log", "ffmpeg error: {error}");
        self.push_error(error);
    }

    fn push_error(&mut self, line: String) {
        if self.error_lines.len() == MAX_ERROR_LINES {
            self.error_lines.remove(0);
        }
        self.error_lines.push(line);
    }
}

/// Maps `FFmpeg` log level to Rust log level
fn map_ffmpeg_log_level(level: &FfmpegLogLevel) -> log::Level {
    match level {
        FfmpegLogLevel::Fatal | FfmpegLogLevel::Error => log::Level::Error,
        FfmpegLogLevel::Warning => log::Level::Warn,
        FfmpegLogLevel::Info => log::Level::Info,
        _ => log::Level::Trace,
    }
}
