//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of one mode of operation.

/// Batch and single-file conversion.
pub mod convert;

/// Marker inspection (`--inspect`).
pub mod inspect;
