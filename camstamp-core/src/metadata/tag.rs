//! Parsing of the container `creation_time` tag reported by the probe.

use chrono::NaiveDateTime;

/// Accepted tag layouts, tried in order.
pub const CREATION_TIME_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
];

/// Parses one tag value. The first matching format wins.
#[must_use]
pub fn parse_creation_time(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    CREATION_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

/// Extracts the tag value from raw probe output: the first non-empty line,
/// with surrounding commas and whitespace removed.
#[must_use]
pub fn first_tag_value(probe_output: &str) -> Option<&str> {
    probe_output
        .lines()
        .map(|line| line.trim().trim_matches(',').trim())
        .find(|line| !line.is_empty())
}

/// Parses raw probe output into a date-time.
#[must_use]
pub fn parse_probe_output(probe_output: &str) -> Option<NaiveDateTime> {
    first_tag_value(probe_output).and_then(parse_creation_time)
}
