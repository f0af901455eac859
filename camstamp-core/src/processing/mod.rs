// ============================================================================
// camstamp-core/src/processing/mod.rs
// ============================================================================
//
// PROCESSING: Overlay construction, per-item conversion and batch orchestration
//
// - overlay: drawtext/scale filter graph for a resolved recording time
// - convert: the per-item driver that runs the encoder
// - batch: the sequential orchestrator, cancellation and worker-thread events

pub mod batch;
pub mod convert;
pub mod overlay;

pub use batch::{
    BatchConverter, BatchEvent, BatchHandle, BatchRun, CancellationToken, ConversionOutcome,
    FailureKind, ItemConverter, ReportEvent, spawn_batch,
};
pub use convert::{ConversionItem, Converter};
pub use overlay::{build_filter_graph, get_position_coordinates, position_coordinates};
