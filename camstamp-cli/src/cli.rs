// camstamp-cli/src/cli.rs
//
// Defines the command-line argument structure using clap.

use camstamp_core::config::{DEFAULT_CRF, DEFAULT_FONT_SIZE, OUTPUT_EXTENSION};
use camstamp_core::{OverlayPosition, ResolutionPreset, TimestampPrecision};
use clap::Parser;
use std::path::PathBuf;

const EXAMPLES: &str = "\
Examples:
  camstamp video.MTS                     Convert a single file
  camstamp video.MTS output.mp4          Convert to a specific output file
  camstamp '*.MTS'                       Convert every match of a pattern
  camstamp clip1.MTS clip2.MTS           Convert several files
  camstamp ./videos/ -o ./converted/     Convert a directory into another folder
  camstamp --inspect video.MTS           Show the raw recording-date marker";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "camstamp: convert camcorder .MTS clips to MP4 with a recording-time overlay",
    long_about = "Converts camcorder .MTS clips to MP4 with the original recording date and \
                  time burned into the picture. The clock advances with playback.",
    after_help = EXAMPLES
)]
pub struct Cli {
    /// Input .MTS files, directories or glob patterns. Exactly two arguments
    /// where the second ends in .mp4 convert one file to that output.
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<String>,

    /// Directory for converted files (created if missing); defaults to each
    /// input's own directory. Not allowed with an explicit OUTPUT.mp4
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Corner for the timestamp: top-left, top-right, bottom-left, bottom-right
    #[arg(short = 'p', long, value_name = "POS", default_value_t = OverlayPosition::default())]
    pub position: OverlayPosition,

    /// Output size: original, 1080p, 720p, 480p
    #[arg(short = 'r', long, value_name = "PRESET", default_value_t = ResolutionPreset::default())]
    pub resolution: ResolutionPreset,

    /// Overlay font size in pixels
    #[arg(long, value_name = "N", default_value_t = DEFAULT_FONT_SIZE,
          value_parser = clap::value_parser!(u32).range(1..=512))]
    pub font_size: u32,

    /// Timestamp precision: minutes or seconds
    #[arg(long, value_name = "P", default_value_t = TimestampPrecision::default())]
    pub precision: TimestampPrecision,

    /// x264 constant quality (0-51, lower is better)
    #[arg(long, value_name = "N", default_value_t = DEFAULT_CRF,
          value_parser = clap::value_parser!(u8).range(0..=51))]
    pub crf: u8,

    /// Path to the ffmpeg executable
    #[arg(long, value_name = "PATH", env = "CAMSTAMP_FFMPEG")]
    pub ffmpeg: Option<PathBuf>,

    /// Path to the ffprobe executable
    #[arg(long, value_name = "PATH", env = "CAMSTAMP_FFPROBE")]
    pub ffprobe: Option<PathBuf>,

    /// Dump the recording-date marker bytes instead of converting
    #[arg(long)]
    pub inspect: bool,

    /// Emit progress as JSON lines on stdout
    #[arg(long)]
    pub progress_json: bool,

    /// Write logs to this file (or to a timestamped file in this directory)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Cli {
    /// The `<INPUT> <OUTPUT.mp4>` form: exactly two inputs, the second ending
    /// in the output extension (case-insensitive).
    #[must_use]
    pub fn legacy_target(&self) -> Option<(PathBuf, PathBuf)> {
        match self.inputs.as_slice() {
            [input, output] if has_output_extension(output) => {
                Some((PathBuf::from(input), PathBuf::from(output)))
            }
            _ => None,
        }
    }
}

fn has_output_extension(path: &str) -> bool {
    path.rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(OUTPUT_EXTENSION))
}
