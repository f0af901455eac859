//! Configuration structures and constants for the camstamp-core library.
//!
//! This module provides the explicit configuration value passed to the
//! conversion driver: tool locations, overlay appearance, scaling preset and
//! the fixed encoding profile. There is no process-wide state; every caller
//! builds a [`CoreConfig`] and hands it down.

use crate::external::EncoderTools;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

// Default constants

/// Pixel distance between the overlay text and the frame edges.
pub const DEFAULT_MARGIN: u32 = 20;

/// Default overlay font size in pixels.
pub const DEFAULT_FONT_SIZE: u32 = 24;

/// Extension (case-insensitive) of camcorder source files picked up by discovery.
pub const SOURCE_EXTENSION: &str = "mts";

/// Container extension written by the encoder.
pub const OUTPUT_EXTENSION: &str = "mp4";

/// Number of leading bytes scanned for the recording-date marker.
pub const MARKER_SCAN_LIMIT: usize = 65_536;

/// Default x264 constant-quality value.
pub const DEFAULT_CRF: u8 = 23;

/// Default x264 speed preset.
pub const DEFAULT_X264_PRESET: &str = "medium";

/// Default AAC audio bitrate.
pub const DEFAULT_AUDIO_BITRATE: &str = "192k";

// ============================================================================
// OVERLAY POSITION
// ============================================================================

/// Corner of the frame the timestamp is drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OverlayPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

impl OverlayPosition {
    /// Machine-friendly identifier for this position.
    pub const fn as_str(self) -> &'static str {
        match self {
            OverlayPosition::TopLeft => "top-left",
            OverlayPosition::TopRight => "top-right",
            OverlayPosition::BottomLeft => "bottom-left",
            OverlayPosition::BottomRight => "bottom-right",
        }
    }

    /// Returns the supported position identifiers.
    pub const fn variants() -> &'static [&'static str] {
        &["top-left", "top-right", "bottom-left", "bottom-right"]
    }

    /// Returns every position, in declaration order.
    pub const fn all() -> [OverlayPosition; 4] {
        [
            OverlayPosition::TopLeft,
            OverlayPosition::TopRight,
            OverlayPosition::BottomLeft,
            OverlayPosition::BottomRight,
        ]
    }

    /// Parses an optional position name; `None` yields the default position.
    pub fn from_name(name: Option<&str>) -> Result<Self, PositionParseError> {
        name.map_or(Ok(Self::default()), str::parse)
    }
}

impl fmt::Display for OverlayPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing position names from strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionParseError {
    invalid_value: String,
}

impl PositionParseError {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self {
            invalid_value: value.into(),
        }
    }
}

impl fmt::Display for PositionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid position '{}'. Must be one of: {}",
            self.invalid_value,
            OverlayPosition::variants().join(", ")
        )
    }
}

impl std::error::Error for PositionParseError {}

impl FromStr for OverlayPosition {
    type Err = PositionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OverlayPosition::all()
            .into_iter()
            .find(|position| s.eq_ignore_ascii_case(position.as_str()))
            .ok_or_else(|| PositionParseError::new(s))
    }
}

// ============================================================================
// RESOLUTION PRESET
// ============================================================================

/// Named output frame size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResolutionPreset {
    /// Keep the source frame size; no scaling filter is added.
    #[default]
    Original,
    /// 1920x1080
    P1080,
    /// 1280x720
    P720,
    /// 854x480
    P480,
}

impl ResolutionPreset {
    pub const fn as_str(self) -> &'static str {
        match self {
            ResolutionPreset::Original => "original",
            ResolutionPreset::P1080 => "1080p",
            ResolutionPreset::P720 => "720p",
            ResolutionPreset::P480 => "480p",
        }
    }

    pub const fn variants() -> &'static [&'static str] {
        &["original", "1080p", "720p", "480p"]
    }

    pub const fn all() -> [ResolutionPreset; 4] {
        [
            ResolutionPreset::Original,
            ResolutionPreset::P1080,
            ResolutionPreset::P720,
            ResolutionPreset::P480,
        ]
    }

    /// Nominal (width, height) of the preset, `None` for `Original`.
    pub const fn dimensions(self) -> Option<(u32, u32)> {
        match self {
            ResolutionPreset::Original => None,
            ResolutionPreset::P1080 => Some((1920, 1080)),
            ResolutionPreset::P720 => Some((1280, 720)),
            ResolutionPreset::P480 => Some((854, 480)),
        }
    }

    /// Target width; height is derived by the encoder.
    pub const fn width(self) -> Option<u32> {
        match self.dimensions() {
            Some((width, _)) => Some(width),
            None => None,
        }
    }
}

impl fmt::Display for ResolutionPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing resolution presets from strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionParseError {
    invalid_value: String,
}

impl ResolutionParseError {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self {
            invalid_value: value.into(),
        }
    }
}

impl fmt::Display for ResolutionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid resolution '{}'. Must be one of: {}",
            self.invalid_value,
            ResolutionPreset::variants().join(", ")
        )
    }
}

impl std::error::Error for ResolutionParseError {}

impl FromStr for ResolutionPreset {
    type Err = ResolutionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResolutionPreset::all()
            .into_iter()
            .find(|preset| s.eq_ignore_ascii_case(preset.as_str()))
            .ok_or_else(|| ResolutionParseError::new(s))
    }
}

// ============================================================================
// TIMESTAMP PRECISION
// ============================================================================

/// Granularity of the rendered clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimestampPrecision {
    /// `YYYY-MM-DD HH:MM`, advancing once per minute of playback.
    #[default]
    Minutes,
    /// `YYYY-MM-DD HH:MM:SS`
    Seconds,
}

impl TimestampPrecision {
    pub const fn as_str(self) -> &'static str {
        match self {
            TimestampPrecision::Minutes => "minutes",
            TimestampPrecision::Seconds => "seconds",
        }
    }

    pub const fn variants() -> &'static [&'static str] {
        &["minutes", "seconds"]
    }
}

impl fmt::Display for TimestampPrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing precision names from strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecisionParseError {
    invalid_value: String,
}

impl fmt::Display for PrecisionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid precision '{}'. Must be one of: {}",
            self.invalid_value,
            TimestampPrecision::variants().join(", ")
        )
    }
}

impl std::error::Error for PrecisionParseError {}

impl FromStr for TimestampPrecision {
    type Err = PrecisionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("minutes") {
            Ok(TimestampPrecision::Minutes)
        } else if s.eq_ignore_ascii_case("seconds") {
            Ok(TimestampPrecision::Seconds)
        } else {
            Err(PrecisionParseError {
                invalid_value: s.to_string(),
            })
        }
    }
}

// ============================================================================
// OPTIONS AND PROFILE
// ============================================================================

/// Per-item overlay options resolved from the caller's settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayOptions {
    pub position: OverlayPosition,
    pub resolution: ResolutionPreset,
    pub font_size: u32,
    pub margin: u32,
    pub precision: TimestampPrecision,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            position: OverlayPosition::default(),
            resolution: ResolutionPreset::default(),
            font_size: DEFAULT_FONT_SIZE,
            margin: DEFAULT_MARGIN,
            precision: TimestampPrecision::default(),
        }
    }
}

/// Fixed encoding profile: constant-quality H.264, AAC audio, faststart MP4.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeProfile {
    pub video_codec: String,
    pub preset: String,
    pub crf: u8,
    pub audio_codec: String,
    pub audio_bitrate: String,
}

impl Default for EncodeProfile {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            preset: DEFAULT_X264_PRESET.to_string(),
            crf: DEFAULT_CRF,
            audio_codec: "aac".to_string(),
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
        }
    }
}

/// Configuration shared by every conversion in a run.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Locations of the encoder and probe executables.
    pub tools: EncoderTools,

    /// Directory for converted files; `None` writes next to each input.
    pub output_dir: Option<PathBuf>,

    /// Overlay appearance applied to every item.
    pub overlay: OverlayOptions,

    /// Encoder settings.
    pub encode: EncodeProfile,
}

impl CoreConfig {
    pub fn new(tools: EncoderTools) -> Self {
        Self {
            tools,
            output_dir: None,
            overlay: OverlayOptions::default(),
            encode: EncodeProfile::default(),
        }
    }

    #[must_use]
    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    #[must_use]
    pub fn with_overlay(mut self, overlay: OverlayOptions) -> Self {
        self.overlay = overlay;
        self
    }

    /// Validates option ranges before any conversion starts.
    pub fn validate(&self) -> crate::CoreResult<()> {
        if self.overlay.font_size == 0 || self.overlay.font_size > 512 {
            return Err(crate::CoreError::Config(format!(
                "font size must be between 1 and 512, got {}",
                self.overlay.font_size
            )));
        }
        if self.encode.crf > 51 {
            return Err(crate::CoreError::Config(format!(
                "CRF must be between 0 and 51, got {}",
                self.encode.crf
            )));
        }
        if let Some(dir) = &self.output_dir {
            if dir.is_file() {
                return Err(crate::CoreError::Config(format!(
                    "output directory '{}' is an existing file",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}
