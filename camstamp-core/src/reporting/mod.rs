//! Progress and result reporting.
//!
//! The conversion driver and batch orchestrator describe what they are
//! doing through the [`Reporter`] trait. Reporters may be called from the
//! batch worker thread and from the caller's thread, so they are
//! `Send + Sync` and keep their state behind mutexes.

pub mod ffmpeg_handler;

use crate::processing::batch::{BatchRun, ConversionOutcome};
use crate::utils::format_duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub use ffmpeg_handler::FfmpegProgressHandler;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Batch start metadata.
#[derive(Clone, Debug)]
pub struct BatchStartInfo {
    pub total_files: usize,
    pub file_list: Vec<String>,
    /// `None` when outputs are written next to their inputs.
    pub output_dir: Option<String>,
}

/// Current item within a batch.
#[derive(Clone, Debug)]
pub struct FileProgressContext {
    pub current_file: usize,
    pub total_files: usize,
    pub input_file: String,
}

/// Description of an item once its recording time is known.
#[derive(Clone, Debug)]
pub struct ItemStartInfo {
    pub input_file: String,
    pub output_file: String,
    pub recorded_at: String,
    pub timestamp_source: String,
}

/// Snapshot of encoder progress. `percent` and `eta` are absent when the
/// clip duration is unknown.
#[derive(Clone, Debug)]
pub struct ProgressSnapshot {
    pub percent: Option<f32>,
    pub current_secs: f64,
    pub total_secs: Option<f64>,
    pub speed: f32,
    pub fps: f32,
    pub eta: Option<Duration>,
}

/// High-level error message.
#[derive(Clone, Debug)]
pub struct ReporterError {
    pub title: String,
    pub message: String,
    pub context: Option<String>,
    pub suggestion: Option<String>,
}

/// Reporter interface implemented by the terminal and JSON reporters.
pub trait Reporter: Send + Sync {
    fn batch_started(&self, _info: &BatchStartInfo) {}
    fn file_progress(&self, _context: &FileProgressContext) {}
    fn item_started(&self, _info: &ItemStartInfo) {}
    fn encoding_started(&self, _total_secs: Option<f64>) {}
    fn encoding_progress(&self, _progress: &ProgressSnapshot) {}
    fn item_complete(&self, _outcome: &ConversionOutcome) {}
    fn batch_complete(&self, _run: &BatchRun) {}
    fn warning(&self, _message: &str) {}
    fn error(&self, _error: &ReporterError) {}
    fn operation_complete(&self, _message: &str) {}
}

/// No-op reporter that discards all updates.
pub struct NullReporter;

impl Reporter for NullReporter {}

// ============================================================================
// TERMINAL REPORTER
// ============================================================================

/// Human-friendly reporter with a progress bar per encode.
pub struct TerminalReporter {
    progress: Mutex<Option<ProgressBar>>,
    max_percent: Mutex<f32>,
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalReporter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            progress: Mutex::new(None),
            max_percent: Mutex::new(0.0),
        }
    }

    fn finish_progress(&self) {
        if let Some(pb) = lock(&self.progress).take() {
            pb.finish_and_clear();
        }
        *lock(&self.max_percent) = 0.0;
    }
}

impl Reporter for TerminalReporter {
    fn batch_started(&self, info: &BatchStartInfo) {
        println!("\n{}", style("BATCH").bold().cyan());
        let destination = info
            .output_dir
            .as_deref()
            .unwrap_or("next to each input");
        println!(
            "  Converting {} file(s) -> {}",
            info.total_files,
            style(destination).bold()
        );
        for (idx, name) in info.file_list.iter().enumerate() {
            println!("  {}. {}", idx + 1, name);
        }
    }

    fn file_progress(&self, context: &FileProgressContext) {
        println!(
            "\n{} {}/{}: {}",
            style("Converting").bold(),
            context.current_file,
            context.total_files,
            context.input_file
        );
    }

    fn item_started(&self, info: &ItemStartInfo) {
        println!("  {:<9} {}", style("Output:").bold(), info.output_file);
        println!(
            "  {:<9} {} ({})",
            style("Recorded:").bold(),
            info.recorded_at,
            style(&info.timestamp_source).dim()
        );
    }

    fn encoding_started(&self, total_secs: Option<f64>) {
        self.finish_progress();
        let pb = match total_secs {
            Some(_) => {
                let pb = ProgressBar::new(100);
                let bar_style = ProgressStyle::default_bar()
                    .template("  Encoding [{bar:40}] {percent:>3}% | {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> ");
                pb.set_style(bar_style);
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                let spinner_style = ProgressStyle::default_spinner()
                    .template("  {spinner} Encoding | {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner());
                pb.set_style(spinner_style);
                pb
            }
        };
        pb.enable_steady_tick(Duration::from_millis(120));
        *lock(&self.progress) = Some(pb);
    }

    fn encoding_progress(&self, progress: &ProgressSnapshot) {
        let guard = lock(&self.progress);
        let Some(pb) = guard.as_ref() else {
            return;
        };
        if let Some(percent) = progress.percent {
            let mut max_percent = lock(&self.max_percent);
            let clamped = percent.clamp(0.0, 100.0);
            if clamped >= *max_percent {
                *max_percent = clamped;
                pb.set_position(clamped as u64);
            }
        }
        let eta = progress
            .eta
            .map_or_else(|| "--:--:--".to_string(), |eta| format_duration(eta.as_secs_f64()));
        pb.set_message(format!(
            "{} | speed {:.1}x, fps {:.1}, eta {eta}",
            format_duration(progress.current_secs),
            progress.speed,
            progress.fps,
        ));
    }

    fn item_complete(&self, outcome: &ConversionOutcome) {
        self.finish_progress();
        match (&outcome.output_file, &outcome.error) {
            (Some(output), _) if outcome.success => println!(
                "  {} {}",
                style("✓ Saved to").green().bold(),
                style(output.display()).green()
            ),
            (_, error) => eprintln!(
                "  {} {}",
                style("✗ Failed:").red().bold(),
                error.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    fn batch_complete(&self, run: &BatchRun) {
        self.finish_progress();
        println!("\n{}", style("=".repeat(40)).dim());
        println!("{}", style("Batch conversion complete:").bold());
        println!("  Total: {} files", run.len());
        println!("  Successful: {}", style(run.success_count()).green());
        println!("  Failed: {}", style(run.failure_count()).red());
        if run.failure_count() > 0 {
            println!("\n{}", style("Failed files:").red().bold());
            for (name, error) in run.failures() {
                println!("  - {name}: {error}");
            }
        }
    }

    fn warning(&self, message: &str) {
        let guard = lock(&self.progress);
        let line = format!("  {}", style(format!("WARN: {message}")).yellow().bold());
        match guard.as_ref() {
            Some(pb) => pb.println(line),
            None => println!("{line}"),
        }
    }

    fn error(&self, error: &ReporterError) {
        self.finish_progress();
        eprintln!(
            "\n{} {}",
            style("ERROR").red().bold(),
            style(&error.title).red().bold()
        );
        eprintln!("  {}", error.message);
        if let Some(ctx) = &error.context {
            eprintln!("  Context: {ctx}");
        }
        if let Some(suggestion) = &error.suggestion {
            eprintln!("  Suggestion: {suggestion}");
        }
    }

    fn operation_complete(&self, message: &str) {
        println!("\n{} {}", style("✓").green().bold(), style(message).bold());
    }
}

// ============================================================================
// JSON REPORTER
// ============================================================================

/// Reporter emitting one JSON object per line, for wrapper scripts.
pub struct JsonReporter {
    writer: Mutex<Box<dyn Write + Send>>,
    last_progress_bucket: Mutex<i32>,
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    #[must_use]
    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
            last_progress_bucket: Mutex::new(-1),
        }
    }

    fn timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    fn write_value(&self, value: serde_json::Value) {
        let mut writer = lock(&self.writer);
        let _ = writeln!(writer, "{value}");
        let _ = writer.flush();
    }
}

impl Reporter for JsonReporter {
    fn batch_started(&self, info: &BatchStartInfo) {
        self.write_value(json!({
            "type": "batch_started",
            "total_files": info.total_files,
            "file_list": info.file_list,
            "output_dir": info.output_dir,
            "timestamp": Self::timestamp(),
        }));
    }

    fn file_progress(&self, context: &FileProgressContext) {
        self.write_value(json!({
            "type": "file_progress",
            "current_file": context.current_file,
            "total_files": context.total_files,
            "input_file": context.input_file,
            "timestamp": Self::timestamp(),
        }));
    }

    fn item_started(&self, info: &ItemStartInfo) {
        self.write_value(json!({
            "type": "item_started",
            "input_file": info.input_file,
            "output_file": info.output_file,
            "recorded_at": info.recorded_at,
            "timestamp_source": info.timestamp_source,
            "timestamp": Self::timestamp(),
        }));
    }

    fn encoding_started(&self, _total_secs: Option<f64>) {
        *lock(&self.last_progress_bucket) = -1;
    }

    fn encoding_progress(&self, progress: &ProgressSnapshot) {
        let Some(percent) = progress.percent else {
            return;
        };
        let bucket = (percent as i32) / 5;
        {
            let mut guard = lock(&self.last_progress_bucket);
            if bucket <= *guard && percent < 99.0 {
                return;
            }
            *guard = bucket;
        }
        self.write_value(json!({
            "type": "encoding_progress",
            "percent": percent,
            "current_secs": progress.current_secs,
            "total_secs": progress.total_secs,
            "speed": progress.speed,
            "fps": progress.fps,
            "eta_seconds": progress.eta.map(|d| d.as_secs()),
            "timestamp": Self::timestamp(),
        }));
    }

    fn item_complete(&self, outcome: &ConversionOutcome) {
        let mut value = serde_json::to_value(outcome).unwrap_or_else(|_| json!({}));
        value["type"] = json!("item_complete");
        value["timestamp"] = json!(Self::timestamp());
        self.write_value(value);
    }

    fn batch_complete(&self, run: &BatchRun) {
        let failures: Vec<_> = run
            .failures()
            .map(|(file, error)| json!({ "input_file": file, "error": error }))
            .collect();
        self.write_value(json!({
            "type": "batch_complete",
            "total_files": run.len(),
            "successful_count": run.success_count(),
            "failed_count": run.failure_count(),
            "failures": failures,
            "timestamp": Self::timestamp(),
        }));
    }

    fn warning(&self, message: &str) {
        self.write_value(json!({
            "type": "warning",
            "message": message,
            "timestamp": Self::timestamp(),
        }));
    }

    fn error(&self, error: &ReporterError) {
        self.write_value(json!({
            "type": "error",
            "title": error.title,
            "message": error.message,
            "context": error.context,
            "suggestion": error.suggestion,
            "timestamp": Self::timestamp(),
        }));
    }

    fn operation_complete(&self, message: &str) {
        self.write_value(json!({
            "type": "operation_complete",
            "message": message,
            "timestamp": Self::timestamp(),
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    /// Writer that appends into a shared buffer.
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn lines(&self) -> Vec<serde_json::Value> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }
    }

    fn snapshot(percent: f32) -> ProgressSnapshot {
        ProgressSnapshot {
            percent: Some(percent),
            current_secs: 1.0,
            total_secs: Some(100.0),
            speed: 1.0,
            fps: 25.0,
            eta: Some(Duration::from_secs(10)),
        }
    }

    #[test]
    fn json_progress_is_bucketed() {
        let buffer = SharedBuffer::default();
        let reporter = JsonReporter::with_writer(Box::new(buffer.clone()));
        reporter.encoding_started(Some(100.0));
        for percent in [0.0, 1.0, 2.0, 5.5, 6.0, 99.5, 100.0] {
            reporter.encoding_progress(&snapshot(percent));
        }
        let percents: Vec<f64> = buffer
            .lines()
            .iter()
            .map(|v| v["percent"].as_f64().unwrap())
            .collect();
        assert_eq!(percents, [0.0, 5.5, 99.5, 100.0]);
    }

    #[test]
    fn json_item_complete_carries_outcome() {
        let buffer = SharedBuffer::default();
        let reporter = JsonReporter::with_writer(Box::new(buffer.clone()));
        reporter.item_complete(&ConversionOutcome::failed(
            PathBuf::from("/v/b.MTS"),
            "Could not extract recording time metadata from b.MTS".to_string(),
        ));
        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["type"], "item_complete");
        assert_eq!(lines[0]["success"], false);
        assert!(lines[0]["error"].as_str().unwrap().contains("metadata"));
    }

    #[test]
    fn unknown_duration_emits_no_json_progress() {
        let buffer = SharedBuffer::default();
        let reporter = JsonReporter::with_writer(Box::new(buffer.clone()));
        reporter.encoding_progress(&ProgressSnapshot {
            percent: None,
            current_secs: 3.0,
            total_secs: None,
            speed: 1.0,
            fps: 25.0,
            eta: None,
        });
        assert!(buffer.lines().is_empty());
    }
}
