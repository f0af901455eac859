//! Recording-date marker decoding.
//!
//! Camcorder streams carry a small vendor block near the start of the file
//! holding the recording date as packed BCD. The block is located by a
//! three-byte ASCII marker; the date fields sit at fixed offsets counted from
//! the first marker byte:
//!
//! ```text
//! offset  0 1 2 | 3    4    | 5     | 6   | 7   | 8    | 9      | 10
//!         M D P | year-hi/lo| month | --  | day | hour | minute | second
//! ```
//!
//! A missing marker, a truncated block or an out-of-range field are all the
//! same outcome: no timestamp. Nothing in this module returns an error for
//! malformed input.

use crate::config::MARKER_SCAN_LIMIT;
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Marker preceding the recording-date block.
pub const RECORDING_MARKER: &[u8; 3] = b"MDP";

/// Minimum number of bytes that must follow the marker.
pub const MIN_BYTES_AFTER_MARKER: usize = 14;

const YEAR_HI: usize = 3;
const YEAR_LO: usize = 4;
const MONTH: usize = 5;
const DAY: usize = 7;
const HOUR: usize = 8;
const MINUTE: usize = 9;
const SECOND: usize = 10;

const MIN_YEAR: u32 = 1990;
const MAX_YEAR: u32 = 2100;

/// Decodes one packed BCD byte (`0x25` -> 25).
#[inline]
#[must_use]
pub fn decode_bcd(byte: u8) -> u32 {
    u32::from(byte >> 4) * 10 + u32::from(byte & 0x0F)
}

/// Reads at most [`MARKER_SCAN_LIMIT`] bytes from the start of a file.
pub fn read_leading_bytes(path: &Path) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(MARKER_SCAN_LIMIT);
    File::open(path)?
        .take(MARKER_SCAN_LIMIT as u64)
        .read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Returns the offset of the first marker occurrence in `buffer`.
#[must_use]
pub fn find_marker(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(RECORDING_MARKER.len())
        .position(|window| window == RECORDING_MARKER)
}

/// Decodes the recording date-time from a buffer holding the leading bytes
/// of a container. Returns `None` when the marker is absent, the block is
/// truncated, or any decoded field is out of range.
#[must_use]
pub fn extract_marker_datetime(buffer: &[u8]) -> Option<NaiveDateTime> {
    let start = find_marker(buffer)?;
    let block = &buffer[start..];
    if block.len() - RECORDING_MARKER.len() < MIN_BYTES_AFTER_MARKER {
        log::debug!(
            "Recording marker at offset {start} is truncated ({} bytes follow)",
            block.len() - RECORDING_MARKER.len()
        );
        return None;
    }

    let year = decode_bcd(block[YEAR_HI]) * 100 + decode_bcd(block[YEAR_LO]);
    let month = decode_bcd(block[MONTH]);
    let day = decode_bcd(block[DAY]);
    let hour = decode_bcd(block[HOUR]);
    let minute = decode_bcd(block[MINUTE]);
    let second = decode_bcd(block[SECOND]);

    let in_range = (MIN_YEAR..=MAX_YEAR).contains(&year)
        && (1..=12).contains(&month)
        && (1..=31).contains(&day)
        && hour <= 23
        && minute <= 59
        && second <= 59;
    if !in_range {
        log::debug!(
            "Recording marker at offset {start} has out-of-range fields: \
             {year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
        );
        return None;
    }

    // Day 31 in a 30-day month passes the field checks but is not a date.
    NaiveDate::from_ymd_opt(year as i32, month, day)?.and_hms_opt(hour, minute, second)
}

/// Reads the leading bytes of `path` and decodes the marker. I/O errors are
/// logged and reported as "not found".
#[must_use]
pub fn extract_marker_datetime_from_file(path: &Path) -> Option<NaiveDateTime> {
    match read_leading_bytes(path) {
        Ok(buffer) => extract_marker_datetime(&buffer),
        Err(e) => {
            log::debug!("Could not read leading bytes of {}: {e}", path.display());
            None
        }
    }
}

// ============================================================================
// DIAGNOSTIC DUMP
// ============================================================================

/// Raw bytes surrounding a marker, for offline analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerDump {
    /// Offset of the first marker byte within the scanned window.
    pub marker_offset: usize,
    /// Offset of `bytes[0]` within the scanned window.
    pub window_start: usize,
    pub bytes: Vec<u8>,
    /// Decoded date-time, if the block is valid.
    pub decoded: Option<NaiveDateTime>,
}

impl MarkerDump {
    /// Renders the window as `offset: hex  |ascii|` rows of 16 bytes.
    #[must_use]
    pub fn to_hex(&self) -> String {
        let mut out = String::new();
        for (row, chunk) in self.bytes.chunks(16).enumerate() {
            let offset = self.window_start + row * 16;
            let _ = write!(out, "{offset:08x}: ");
            for i in 0..16 {
                match chunk.get(i) {
                    Some(byte) => {
                        let _ = write!(out, "{byte:02x} ");
                    }
                    None => out.push_str("   "),
                }
            }
            out.push_str(" |");
            out.extend(chunk.iter().map(|&b| {
                if b.is_ascii_graphic() || b == b' ' {
                    b as char
                } else {
                    '.'
                }
            }));
            out.push_str("|\n");
        }
        out
    }
}

/// Captures `before` bytes ahead of the marker and `after` bytes from the
/// marker onward. Returns `None` when the marker is absent.
#[must_use]
pub fn dump_marker_region(buffer: &[u8], before: usize, after: usize) -> Option<MarkerDump> {
    let marker_offset = find_marker(buffer)?;
    let window_start = marker_offset.saturating_sub(before);
    let window_end = (marker_offset + after).min(buffer.len());
    Some(MarkerDump {
        marker_offset,
        window_start,
        bytes: buffer[window_start..window_end].to_vec(),
        decoded: extract_marker_datetime(buffer),
    })
}
