//! Optional log-file sink.

pub mod setup;

pub use setup::{setup_file_logging, LOG_PATTERN};
