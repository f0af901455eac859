//! Overlay filter construction.
//!
//! The burned-in clock is a `drawtext` filter whose text is the encoder's
//! `pts:localtime` expansion: it starts at the recording epoch and advances
//! with playback. Minutes precision renders `YYYY-MM-DD HH:MM`, seconds
//! precision appends `:SS`. When a resolution preset is active the scale
//! filter runs first so the font size applies to output pixels.

use crate::config::{OverlayOptions, OverlayPosition, ResolutionPreset, TimestampPrecision};
use crate::error::CoreResult;
use crate::external::VideoFilterChain;
use crate::metadata::RecordingTimestamp;

/// drawtext coordinates for a corner placement.
#[must_use]
pub fn position_coordinates(position: OverlayPosition, margin: u32) -> String {
    match position {
        OverlayPosition::TopLeft => format!("x={margin}:y={margin}"),
        OverlayPosition::TopRight => format!("x=w-tw-{margin}:y={margin}"),
        OverlayPosition::BottomLeft => format!("x={margin}:y=h-th-{margin}"),
        OverlayPosition::BottomRight => format!("x=w-tw-{margin}:y=h-th-{margin}"),
    }
}

/// Name-based form of [`position_coordinates`]; `None` selects the default
/// corner and unknown names are rejected.
pub fn get_position_coordinates(position: Option<&str>, margin: u32) -> CoreResult<String> {
    let position = OverlayPosition::from_name(position)?;
    Ok(position_coordinates(position, margin))
}

/// strftime layout for the overlay. Colons inside the filter value need a
/// triple backslash to survive both filter-graph and drawtext escaping.
fn time_layout(precision: TimestampPrecision) -> &'static str {
    match precision {
        TimestampPrecision::Minutes => r"%Y-%m-%d %H\\\:%M",
        TimestampPrecision::Seconds => r"%Y-%m-%d %H\\\:%M\\\:%S",
    }
}

/// The drawtext filter for a clock starting at `epoch`.
#[must_use]
pub fn drawtext_filter(epoch: i64, options: &OverlayOptions) -> String {
    format!(
        r"drawtext=text='%{{pts\:localtime\:{epoch}\:{layout}}}':fontsize={size}:fontcolor=white:borderw=2:bordercolor=black:{coords}",
        layout = time_layout(options.precision),
        size = options.font_size,
        coords = position_coordinates(options.position, options.margin),
    )
}

/// Scale filter for a preset; `None` for the original size. Height is
/// derived and kept even.
#[must_use]
pub fn scale_filter(resolution: ResolutionPreset) -> Option<String> {
    resolution.width().map(|width| format!("scale={width}:-2"))
}

/// The complete `-vf` value for one conversion.
#[must_use]
pub fn build_filter_graph(timestamp: &RecordingTimestamp, options: &OverlayOptions) -> String {
    VideoFilterChain::new()
        .add_optional(scale_filter(options.resolution))
        .add_filter(drawtext_filter(timestamp.overlay_epoch(), options))
        .build()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MARGIN;
    use crate::error::CoreError;
    use crate::metadata::TimestampSource;
    use chrono::NaiveDateTime;

    #[test]
    fn corners_map_to_fixed_expressions() {
        assert_eq!(position_coordinates(OverlayPosition::TopLeft, 20), "x=20:y=20");
        assert_eq!(position_coordinates(OverlayPosition::TopRight, 20), "x=w-tw-20:y=20");
        assert_eq!(position_coordinates(OverlayPosition::BottomLeft, 20), "x=20:y=h-th-20");
        assert_eq!(
            position_coordinates(OverlayPosition::BottomRight, 20),
            "x=w-tw-20:y=h-th-20"
        );
        assert_eq!(position_coordinates(OverlayPosition::TopLeft, 5), "x=5:y=5");
    }

    #[test]
    fn coordinates_are_pure() {
        for position in OverlayPosition::all() {
            assert_eq!(
                position_coordinates(position, DEFAULT_MARGIN),
                position_coordinates(position, DEFAULT_MARGIN)
            );
        }
    }

    #[test]
    fn named_lookup_defaults_and_rejects() {
        assert_eq!(
            get_position_coordinates(None, 20).unwrap(),
            get_position_coordinates(Some("bottom-right"), 20).unwrap()
        );
        let err = get_position_coordinates(Some("center"), 20).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPosition(_)));
        assert!(err.to_string().contains("center"));
    }

    #[test]
    fn drawtext_renders_minutes_by_default() {
        let filter = drawtext_filter(1_700_000_000, &OverlayOptions::default());
        assert_eq!(
            filter,
            r"drawtext=text='%{pts\:localtime\:1700000000\:%Y-%m-%d %H\\\:%M}':fontsize=24:fontcolor=white:borderw=2:bordercolor=black:x=w-tw-20:y=h-th-20"
        );
    }

    #[test]
    fn seconds_precision_adds_seconds_field() {
        let options = OverlayOptions {
            precision: TimestampPrecision::Seconds,
            position: OverlayPosition::TopLeft,
            font_size: 32,
            ..OverlayOptions::default()
        };
        let filter = drawtext_filter(0, &options);
        assert!(filter.contains(r"%H\\\:%M\\\:%S}'"));
        assert!(filter.contains(":fontsize=32:"));
        assert!(filter.ends_with(":x=20:y=20"));
    }

    #[test]
    fn scaling_precedes_overlay() {
        let datetime =
            NaiveDateTime::parse_from_str("2020-05-01 08:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let ts = RecordingTimestamp::new(datetime, TimestampSource::Marker);

        let original = build_filter_graph(&ts, &OverlayOptions::default());
        assert!(original.starts_with("drawtext="));

        let options = OverlayOptions {
            resolution: ResolutionPreset::P720,
            ..OverlayOptions::default()
        };
        let scaled = build_filter_graph(&ts, &options);
        assert!(scaled.starts_with("scale=1280:-2,drawtext="));
        assert!(scaled.contains(&ts.overlay_epoch().to_string()));
    }

    #[test]
    fn original_preset_has_no_scale() {
        assert_eq!(scale_filter(ResolutionPreset::Original), None);
        assert_eq!(scale_filter(ResolutionPreset::P480).as_deref(), Some("scale=854:-2"));
    }
}
