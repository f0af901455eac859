// ============================================================================
// camstamp-core/src/metadata/mod.rs
// ============================================================================
//
// RECORDING TIME: Resolving when a clip was filmed
//
// Two sources are consulted in strict order:
//   1. The recording-date marker in the first 64 KiB of the container.
//   2. The container `creation_time` tag reported by the probe.
// If neither yields a value the result is `CoreError::MetadataUnavailable`.
// File-system times and the wall clock are never consulted.

pub mod marker;
pub mod tag;

use crate::error::{CoreError, CoreResult};
use crate::external::FfprobeExecutor;
use chrono::{Local, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Where a [`RecordingTimestamp`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampSource {
    Marker,
    ContainerTag,
}

impl TimestampSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Marker => "recording marker",
            Self::ContainerTag => "container creation_time tag",
        }
    }
}

/// The wall-clock date-time at which footage was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingTimestamp {
    datetime: NaiveDateTime,
    source: TimestampSource,
}

impl RecordingTimestamp {
    pub(crate) fn new(datetime: NaiveDateTime, source: TimestampSource) -> Self {
        Self { datetime, source }
    }

    #[must_use]
    pub fn datetime(&self) -> NaiveDateTime {
        self.datetime
    }

    #[must_use]
    pub fn source(&self) -> TimestampSource {
        self.source
    }

    /// Seconds since the Unix epoch of this wall-clock time read in the
    /// local zone, so that the encoder's `localtime` rendering reproduces
    /// the recorded value. Ambiguous local times take the earlier instant;
    /// nonexistent ones fall back to UTC.
    #[must_use]
    pub fn overlay_epoch(&self) -> i64 {
        Local
            .from_local_datetime(&self.datetime)
            .earliest()
            .map(|dt| dt.timestamp())
            .unwrap_or_else(|| Utc.from_utc_datetime(&self.datetime).timestamp())
    }
}

impl fmt::Display for RecordingTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.datetime.format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Resolves the recording time of `path`, marker first, then container tag.
pub fn resolve_recording_time<P>(probe: &P, path: &Path) -> CoreResult<RecordingTimestamp>
where
    P: FfprobeExecutor + ?Sized,
{
    if let Some(datetime) = marker::extract_marker_datetime_from_file(path) {
        log::debug!("Recording marker found in {}: {datetime}", path.display());
        return Ok(RecordingTimestamp::new(datetime, TimestampSource::Marker));
    }
    log::debug!(
        "No recording marker in {}, querying container creation_time",
        path.display()
    );

    let output = probe.creation_time_tag(path).map_err(|e| {
        CoreError::metadata_unavailable(
            path,
            format!("no recording marker and the creation_time probe failed: {e}"),
        )
    })?;

    let Some(value) = tag::first_tag_value(&output) else {
        return Err(CoreError::metadata_unavailable(
            path,
            "no recording marker and no creation_time tag",
        ));
    };

    match tag::parse_creation_time(value) {
        Some(datetime) => {
            log::debug!("creation_time tag for {}: {datetime}", path.display());
            Ok(RecordingTimestamp::new(datetime, TimestampSource::ContainerTag))
        }
        None => Err(CoreError::metadata_unavailable(
            path,
            format!("no recording marker and unrecognized creation_time '{value}'"),
        )),
    }
}
