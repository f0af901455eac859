// ============================================================================
// camstamp-core/src/processing/batch.rs
// ============================================================================
//
// BATCH ORCHESTRATOR: Sequential conversion with failure isolation
//
// Items are converted strictly one at a time, in list order. Every item
// yields exactly one `ConversionOutcome`, appended to the run before the
// progress callback fires for it. A failing item, including one whose
// driver panics, never stops the loop. The cancellation token is checked
// before each item; items not yet started when it is set are simply absent
// from the run.
//
// `spawn_batch` runs the same loop on a worker thread. Every reporter call
// the worker makes is turned into a `BatchEvent` and streamed back over a
// channel, so the caller renders everything, in order, on its own thread.

use crate::error::{CoreError, CoreResult};
use crate::external::{FfmpegSpawner, FfprobeExecutor};
use crate::processing::convert::{ConversionItem, Converter};
use crate::reporting::{
    FileProgressContext, ItemStartInfo, NullReporter, ProgressSnapshot, Reporter, ReporterError,
};
use crate::utils::display_filename;

use serde::Serialize;
use std::any::Any;
use std::fmt::Write as _;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

// ============================================================================
// OUTCOMES
// ============================================================================

/// Broad category of a failed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The input could not be read or the output could not be placed.
    Input,
    /// No recording time could be resolved.
    MetadataUnavailable,
    /// The encoder could not be started or exited unsuccessfully.
    Encoder,
    /// Anything else, including a panic in the driver.
    Internal,
}

impl FailureKind {
    #[must_use]
    pub fn classify(error: &CoreError) -> Self {
        match error {
            CoreError::MetadataUnavailable { .. } => Self::MetadataUnavailable,
            CoreError::PathError(_) | CoreError::Io(_) => Self::Input,
            CoreError::DependencyNotFound(_)
            | CoreError::CommandStart(..)
            | CoreError::CommandWait(..)
            | CoreError::CommandFailed(..) => Self::Encoder,
            _ => Self::Internal,
        }
    }
}

/// Result of converting one item. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionOutcome {
    pub input_file: PathBuf,
    /// Present only on success.
    pub output_file: Option<PathBuf>,
    pub success: bool,
    /// Present only on failure.
    pub error: Option<String>,
    pub failure_kind: Option<FailureKind>,
}

impl ConversionOutcome {
    #[must_use]
    pub fn succeeded(input_file: PathBuf, output_file: PathBuf) -> Self {
        Self {
            input_file,
            output_file: Some(output_file),
            success: true,
            error: None,
            failure_kind: None,
        }
    }

    #[must_use]
    pub fn failed(input_file: PathBuf, error: String) -> Self {
        Self::failed_with_kind(input_file, error, FailureKind::Internal)
    }

    #[must_use]
    pub fn from_error(input_file: PathBuf, error: &CoreError) -> Self {
        Self::failed_with_kind(input_file, error.to_string(), FailureKind::classify(error))
    }

    fn failed_with_kind(input_file: PathBuf, error: String, kind: FailureKind) -> Self {
        Self {
            input_file,
            output_file: None,
            success: false,
            error: Some(error),
            failure_kind: Some(kind),
        }
    }
}

/// Ordered outcomes of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchRun {
    outcomes: Vec<ConversionOutcome>,
    cancelled: bool,
}

impl BatchRun {
    #[must_use]
    pub fn outcomes(&self) -> &[ConversionOutcome] {
        &self.outcomes
    }

    #[must_use]
    pub fn into_outcomes(self) -> Vec<ConversionOutcome> {
        self.outcomes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    #[must_use]
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }

    /// `(successes, failures)`.
    #[must_use]
    pub fn counts(&self) -> (usize, usize) {
        (self.success_count(), self.failure_count())
    }

    /// True when the run stopped early on cancellation.
    #[must_use]
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    /// File name and error text of each failed item, in order.
    pub fn failures(&self) -> impl Iterator<Item = (String, &str)> + '_ {
        self.outcomes.iter().filter(|o| !o.success).map(|o| {
            (
                display_filename(&o.input_file),
                o.error.as_deref().unwrap_or("unknown error"),
            )
        })
    }

    /// Plain-text summary listing totals and every failed item.
    #[must_use]
    pub fn summary_text(&self) -> String {
        let mut text = String::new();
        let _ = writeln!(text, "Batch conversion complete:");
        let _ = writeln!(text, "  Total: {} files", self.len());
        let _ = writeln!(text, "  Successful: {}", self.success_count());
        let _ = writeln!(text, "  Failed: {}", self.failure_count());
        if self.cancelled {
            let _ = writeln!(text, "  Cancelled before all files were started");
        }
        if self.failure_count() > 0 {
            let _ = writeln!(text, "\nFailed files:");
            for (name, error) in self.failures() {
                let _ = writeln!(text, "  - {name}: {error}");
            }
        }
        text
    }
}

// ============================================================================
// CANCELLATION
// ============================================================================

/// Cooperative cancellation flag, checked before each item starts.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

/// Anything that turns one item into one outcome.
pub trait ItemConverter {
    fn convert_item(&self, item: &ConversionItem) -> ConversionOutcome;

    /// Replaces the reporter used while converting. Converters that report
    /// nothing can ignore this.
    fn set_reporter(&mut self, _reporter: Arc<dyn Reporter>) {}
}

impl<S, P> ItemConverter for Converter<S, P>
where
    S: FfmpegSpawner,
    P: FfprobeExecutor,
{
    fn convert_item(&self, item: &ConversionItem) -> ConversionOutcome {
        Converter::convert_item(self, item)
    }

    fn set_reporter(&mut self, reporter: Arc<dyn Reporter>) {
        Converter::set_reporter(self, reporter);
    }
}

/// Progress callback: 1-based index, total, item input path.
pub type ProgressCallback<'a> = &'a mut dyn FnMut(usize, usize, &Path);

/// Sequential batch driver.
pub struct BatchConverter<C> {
    converter: C,
    cancel: CancellationToken,
    reporter: Arc<dyn Reporter>,
}

impl<C: ItemConverter> BatchConverter<C> {
    pub fn new(converter: C) -> Self {
        Self {
            converter,
            cancel: CancellationToken::new(),
            reporter: Arc::new(NullReporter),
        }
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops the run at the next item boundary.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Converts every item in order. The callback, when given, fires once per
    /// item after its outcome has been recorded.
    pub fn run(&self, items: &[ConversionItem], progress: Option<ProgressCallback<'_>>) -> BatchRun {
        match progress {
            Some(callback) => self.run_with(items, |index, total, item, _| {
                callback(index, total, &item.input);
            }),
            None => self.run_with(items, |_, _, _, _| {}),
        }
    }

    fn run_with<F>(&self, items: &[ConversionItem], mut after_item: F) -> BatchRun
    where
        F: FnMut(usize, usize, &ConversionItem, &ConversionOutcome),
    {
        let total = items.len();
        let mut run = BatchRun::default();
        log::info!("Starting batch of {total} file(s)");

        for (i, item) in items.iter().enumerate() {
            if self.cancel.is_cancelled() {
                log::info!("Batch cancelled after {i} of {total} file(s)");
                run.cancelled = true;
                break;
            }
            let index = i + 1;
            self.reporter.file_progress(&FileProgressContext {
                current_file: index,
                total_files: total,
                input_file: display_filename(&item.input),
            });

            let outcome = self.convert_isolated(item);
            run.outcomes.push(outcome);
            if let Some(outcome) = run.outcomes.last() {
                after_item(index, total, item, outcome);
            }
        }

        log::info!(
            "Batch finished: {} succeeded, {} failed",
            run.success_count(),
            run.failure_count()
        );
        run
    }

    fn convert_isolated(&self, item: &ConversionItem) -> ConversionOutcome {
        match panic::catch_unwind(AssertUnwindSafe(|| self.converter.convert_item(item))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::error!(
                    "Conversion of {} panicked: {message}",
                    item.input.display()
                );
                ConversionOutcome::failed(
                    item.input.clone(),
                    format!("Unexpected failure: {message}"),
                )
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ============================================================================
// WORKER THREAD
// ============================================================================

/// A reporter call made on the worker thread, carried to the consumer.
#[derive(Debug, Clone)]
pub enum ReportEvent {
    FileProgress(FileProgressContext),
    ItemStarted(ItemStartInfo),
    EncodingStarted(Option<f64>),
    EncodingProgress(ProgressSnapshot),
    Warning(String),
    Error(ReporterError),
}

/// Events streamed from a batch running on a worker thread.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// Progress within the current item.
    Report(ReportEvent),
    /// An item finished; `index` is 1-based.
    ItemFinished {
        index: usize,
        total: usize,
        outcome: ConversionOutcome,
    },
    /// The run ended, normally or by cancellation.
    Finished(BatchRun),
}

impl BatchEvent {
    /// Replays this event on `reporter`.
    pub fn deliver(&self, reporter: &dyn Reporter) {
        match self {
            BatchEvent::Report(report) => match report {
                ReportEvent::FileProgress(context) => reporter.file_progress(context),
                ReportEvent::ItemStarted(info) => reporter.item_started(info),
                ReportEvent::EncodingStarted(total_secs) => reporter.encoding_started(*total_secs),
                ReportEvent::EncodingProgress(progress) => reporter.encoding_progress(progress),
                ReportEvent::Warning(message) => reporter.warning(message),
                ReportEvent::Error(error) => reporter.error(error),
            },
            BatchEvent::ItemFinished { outcome, .. } => reporter.item_complete(outcome),
            BatchEvent::Finished(run) => reporter.batch_complete(run),
        }
    }
}

/// Reporter installed on the worker: forwards every call over the channel.
struct ChannelReporter {
    tx: Sender<BatchEvent>,
}

impl ChannelReporter {
    fn forward(&self, event: ReportEvent) {
        // A dropped receiver only means nobody is listening.
        let _ = self.tx.send(BatchEvent::Report(event));
    }
}

impl Reporter for ChannelReporter {
    fn file_progress(&self, context: &FileProgressContext) {
        self.forward(ReportEvent::FileProgress(context.clone()));
    }

    fn item_started(&self, info: &ItemStartInfo) {
        self.forward(ReportEvent::ItemStarted(info.clone()));
    }

    fn encoding_started(&self, total_secs: Option<f64>) {
        self.forward(ReportEvent::EncodingStarted(total_secs));
    }

    fn encoding_progress(&self, progress: &ProgressSnapshot) {
        self.forward(ReportEvent::EncodingProgress(progress.clone()));
    }

    fn warning(&self, message: &str) {
        self.forward(ReportEvent::Warning(message.to_string()));
    }

    fn error(&self, error: &ReporterError) {
        self.forward(ReportEvent::Error(error.clone()));
    }
}

/// Handle to a batch running on a worker thread.
pub struct BatchHandle {
    events: Receiver<BatchEvent>,
    cancel: CancellationToken,
    thread: JoinHandle<BatchRun>,
}

impl BatchHandle {
    /// Blocking iterator over events; ends after [`BatchEvent::Finished`].
    pub fn events(&self) -> impl Iterator<Item = BatchEvent> + '_ {
        self.events.iter()
    }

    /// Stops the run at the next item boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Waits for the worker and returns the final run.
    pub fn join(self) -> CoreResult<BatchRun> {
        self.thread
            .join()
            .map_err(|payload| CoreError::OperationFailed(format!(
                "batch worker panicked: {}",
                panic_message(payload.as_ref())
            )))
    }
}

/// Runs `batch` over `items` on a dedicated thread.
///
/// Any reporter set on `batch` or its converter is replaced by one that
/// forwards to the returned handle's events; pass each event to
/// [`BatchEvent::deliver`] to render it.
pub fn spawn_batch<C>(mut batch: BatchConverter<C>, items: Vec<ConversionItem>) -> CoreResult<BatchHandle>
where
    C: ItemConverter + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let forwarder: Arc<dyn Reporter> = Arc::new(ChannelReporter { tx: tx.clone() });
    batch.converter.set_reporter(Arc::clone(&forwarder));
    batch.reporter = forwarder;
    let cancel = batch.cancellation_token();
    let thread = thread::Builder::new()
        .name("camstamp-batch".to_string())
        .spawn(move || {
            let run = batch.run_with(&items, |index, total, _, outcome| {
                // A dropped receiver only means nobody is listening.
                let _ = tx.send(BatchEvent::ItemFinished {
                    index,
                    total,
                    outcome: outcome.clone(),
                });
            });
            let _ = tx.send(BatchEvent::Finished(run.clone()));
            run
        })?;

    Ok(BatchHandle {
        events: rx,
        cancel,
        thread,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverlayOptions;
    use std::cell::RefCell;

    /// Converter scripted by file name: "fail" fails, "panic" panics.
    struct Scripted {
        seen: RefCell<Vec<PathBuf>>,
    }

    impl ItemConverter for Scripted {
        fn convert_item(&self, item: &ConversionItem) -> ConversionOutcome {
            self.seen.borrow_mut().push(item.input.clone());
            let name = display_filename(&item.input);
            if name.starts_with("fail") {
                ConversionOutcome::failed(item.input.clone(), "encoder exited with 1".into())
            } else if name.starts_with("panic") {
                panic!("encoder crashed");
            } else {
                ConversionOutcome::succeeded(item.input.clone(), item.input.with_extension("mp4"))
            }
        }
    }

    fn scripted() -> Scripted {
        Scripted {
            seen: RefCell::new(Vec::new()),
        }
    }

    fn items(names: &[&str]) -> Vec<ConversionItem> {
        names
            .iter()
            .map(|n| ConversionItem::new(format!("/v/{n}"), OverlayOptions::default()))
            .collect()
    }

    #[test]
    fn middle_failure_does_not_stop_batch() {
        let batch = BatchConverter::new(scripted());
        let run = batch.run(&items(&["a.MTS", "fail.MTS", "c.MTS"]), None);

        assert_eq!(run.len(), 3);
        let names: Vec<_> = run
            .outcomes()
            .iter()
            .map(|o| display_filename(&o.input_file))
            .collect();
        assert_eq!(names, ["a.MTS", "fail.MTS", "c.MTS"]);
        let failed: Vec<usize> = run
            .outcomes()
            .iter()
            .enumerate()
            .filter(|(_, o)| !o.success)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(failed, [1]);
        assert_eq!(run.counts(), (2, 1));
    }

    #[test]
    fn progress_fires_once_per_item_in_order() {
        let batch = BatchConverter::new(scripted());
        let list = items(&["a.MTS", "fail.MTS", "c.MTS", "d.MTS"]);
        let mut calls = Vec::new();
        let mut record = |i: usize, total: usize, path: &Path| calls.push((i, total, path.to_path_buf()));
        batch.run(&list, Some(&mut record));

        assert_eq!(calls.len(), 4);
        for (n, (index, total, path)) in calls.iter().enumerate() {
            assert_eq!(*index, n + 1);
            assert_eq!(*total, 4);
            assert_eq!(path, &list[n].input);
        }
    }

    #[derive(Default)]
    struct Positions(std::sync::Mutex<Vec<usize>>);

    impl Reporter for Positions {
        fn file_progress(&self, context: &FileProgressContext) {
            self.0.lock().unwrap().push(context.current_file);
        }
    }

    #[test]
    fn inline_run_announces_each_item() {
        let positions = Arc::new(Positions::default());
        let batch = BatchConverter::new(scripted()).with_reporter(positions.clone());
        batch.run(&items(&["a.MTS", "fail.MTS", "c.MTS"]), None);
        assert_eq!(*positions.0.lock().unwrap(), [1, 2, 3]);
    }

    #[test]
    fn panic_becomes_failed_outcome() {
        let batch = BatchConverter::new(scripted());
        let run = batch.run(&items(&["panic.MTS", "b.MTS"]), None);
        assert_eq!(run.counts(), (1, 1));
        let first = &run.outcomes()[0];
        assert_eq!(first.failure_kind, Some(FailureKind::Internal));
        assert!(first.error.as_deref().unwrap().contains("encoder crashed"));
    }

    #[test]
    fn cancellation_keeps_completed_outcomes_only() {
        let batch = BatchConverter::new(scripted());
        let token = batch.cancellation_token();
        let list = items(&["a.MTS", "b.MTS", "c.MTS"]);
        let mut cancel_after_first = |i: usize, _: usize, _: &Path| {
            if i == 1 {
                token.cancel();
            }
        };
        let run = batch.run(&list, Some(&mut cancel_after_first));

        assert_eq!(run.len(), 1);
        assert!(run.was_cancelled());
        assert_eq!(run.counts(), (1, 0));
        assert_eq!(batch.converter.seen.borrow().len(), 1);
    }

    #[test]
    fn empty_batch_has_zero_counts() {
        let batch = BatchConverter::new(scripted());
        let run = batch.run(&[], None);
        assert!(run.is_empty());
        assert_eq!(run.counts(), (0, 0));
    }

    #[test]
    fn summary_names_failed_files() {
        let batch = BatchConverter::new(scripted());
        let run = batch.run(&items(&["a.MTS", "fail.MTS"]), None);
        let text = run.summary_text();
        assert!(text.contains("Total: 2 files"));
        assert!(text.contains("Successful: 1"));
        assert!(text.contains("Failed: 1"));
        assert!(text.contains("  - fail.MTS: encoder exited with 1"));
    }

    /// `Scripted` uses a RefCell, so the worker test uses a Send converter.
    struct Echo;

    impl ItemConverter for Echo {
        fn convert_item(&self, item: &ConversionItem) -> ConversionOutcome {
            if display_filename(&item.input).starts_with("fail") {
                ConversionOutcome::failed(item.input.clone(), "boom".into())
            } else {
                ConversionOutcome::succeeded(item.input.clone(), item.input.with_extension("mp4"))
            }
        }
    }

    #[test]
    fn worker_streams_events_then_finishes() {
        let handle = spawn_batch(
            BatchConverter::new(Echo),
            items(&["a.MTS", "fail.MTS", "c.MTS"]),
        )
        .unwrap();

        let mut finished_indices = Vec::new();
        let mut final_run = None;
        for event in handle.events() {
            match event {
                BatchEvent::ItemFinished { index, total, .. } => {
                    assert_eq!(total, 3);
                    finished_indices.push(index);
                }
                BatchEvent::Finished(run) => final_run = Some(run),
                BatchEvent::Report(_) => {}
            }
        }
        assert_eq!(finished_indices, [1, 2, 3]);
        let final_run = final_run.unwrap();
        assert_eq!(final_run.counts(), (2, 1));
        assert_eq!(handle.join().unwrap(), final_run);
    }

    #[test]
    fn worker_progress_precedes_each_outcome() {
        let handle = spawn_batch(BatchConverter::new(Echo), items(&["a.MTS", "b.MTS"])).unwrap();

        let kinds: Vec<String> = handle
            .events()
            .map(|event| match event {
                BatchEvent::Report(ReportEvent::FileProgress(ctx)) => {
                    format!("progress {}", ctx.current_file)
                }
                BatchEvent::Report(other) => format!("{other:?}"),
                BatchEvent::ItemFinished { index, .. } => format!("finished {index}"),
                BatchEvent::Finished(_) => "done".to_string(),
            })
            .collect();
        assert_eq!(kinds, ["progress 1", "finished 1", "progress 2", "finished 2", "done"]);
        handle.join().unwrap();
    }
}
