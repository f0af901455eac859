//! Core library for converting camcorder footage with a burned-in recording
//! timestamp.
//!
//! The recording time of each clip is read from the camcorder's embedded
//! date marker, falling back to the container `creation_time` tag. When
//! neither is available the item fails with
//! [`CoreError::MetadataUnavailable`]; no substitute time is ever used.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use camstamp_core::{BatchConverter, CoreConfig, Converter, EncoderTools, resolve_inputs};
//!
//! let config = CoreConfig::new(EncoderTools::locate());
//! config.validate().unwrap();
//! config.tools.check_available().unwrap();
//!
//! let files = resolve_inputs(["/path/to/clips"]).unwrap();
//! let converter = Converter::from_config(config);
//! let items: Vec<_> = files.into_iter().map(|f| converter.item_for(f)).collect();
//!
//! let run = BatchConverter::new(converter).run(&items, None);
//! println!("{}", run.summary_text());
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod external;
pub mod file_logging;
pub mod metadata;
pub mod output_path;
pub mod processing;
pub mod reporting;
pub mod utils;

// Re-exports for public API
pub use config::{
    CoreConfig, EncodeProfile, OverlayOptions, OverlayPosition, ResolutionPreset,
    TimestampPrecision,
};
pub use discovery::{find_processable_files, resolve_inputs};
pub use error::{CoreError, CoreResult};
pub use external::EncoderTools;
pub use metadata::{RecordingTimestamp, TimestampSource, resolve_recording_time};
pub use output_path::allocate_output_path;
pub use processing::{
    BatchConverter, BatchEvent, BatchHandle, BatchRun, CancellationToken, ConversionItem,
    ConversionOutcome, Converter, FailureKind, ItemConverter, ReportEvent, spawn_batch,
};
pub use reporting::{JsonReporter, NullReporter, Reporter, TerminalReporter};
pub use utils::{format_duration, parse_ffmpeg_time};
