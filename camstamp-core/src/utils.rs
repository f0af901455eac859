//! Utility functions for formatting and path handling.
//!
//! General-purpose helpers used throughout camstamp-core: duration
//! formatting, ffmpeg time parsing and filename extraction.

use crate::config::SOURCE_EXTENSION;
use std::path::Path;

/// Checks whether the path is an existing file with the camcorder source
/// extension (case-insensitive).
#[must_use]
pub fn is_valid_source_file(path: &Path) -> bool {
    path.is_file() && has_source_extension(path)
}

/// Checks the extension only, without touching the file system.
#[must_use]
pub fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION))
}

/// Formats seconds as HH:MM:SS (e.g., 3725.0 -> "01:02:05"). Returns "??:??:??" for invalid inputs.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "??:??:??".to_string();
    }

    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Parses FFmpeg time string (HH:MM:SS.MS) to seconds. Returns None if invalid.
#[must_use]
pub fn parse_ffmpeg_time(time: &str) -> Option<f64> {
    let parts: Vec<&str> = time.trim().split(':').collect();
    if parts.len() == 3 {
        let hours = parts[0].parse::<f64>().ok()?;
        let minutes = parts[1].parse::<f64>().ok()?;
        let seconds = parts[2].parse::<f64>().ok()?;
        Some(hours * 3600.0 + minutes * 60.0 + seconds)
    } else {
        None
    }
}

/// Extracts the filename for display, falling back to the full path.
#[must_use]
pub fn display_filename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Safely extracts the file stem with consistent error handling.
pub fn get_stem_safe(path: &Path) -> crate::CoreResult<String> {
    Ok(path
        .file_stem()
        .ok_or_else(|| {
            crate::CoreError::PathError(format!(
                "Failed to get filename stem for {}",
                path.display()
            ))
        })?
        .to_string_lossy()
        .to_string())
}
