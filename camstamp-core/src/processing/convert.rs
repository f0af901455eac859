// ============================================================================
// camstamp-core/src/processing/convert.rs
// ============================================================================
//
// CONVERSION DRIVER: One input file to one timestamped MP4
//
// Steps for each item:
//   1. Check the input exists (warn, but continue, on a non-.mts extension)
//   2. Allocate the output path unless one was given explicitly
//   3. Resolve the recording time (marker, then container tag)
//   4. Build the scale + drawtext filter graph
//   5. Probe the duration for progress percentages (optional)
//   6. Run the encoder, streaming its events to the progress handler
//
// `convert` returns a typed error; `convert_item` turns every failure into
// a `ConversionOutcome` so that nothing escapes to the batch loop.

use crate::config::{CoreConfig, OverlayOptions};
use crate::error::{CoreError, CoreResult, command_failed_error};
use crate::external::{
    CommandFfprobeExecutor, EncodeCommandBuilder, FfmpegProcess, FfmpegSpawner, FfprobeExecutor,
    SidecarSpawner,
};
use crate::metadata::resolve_recording_time;
use crate::output_path::allocate_output_path;
use crate::processing::batch::ConversionOutcome;
use crate::processing::overlay::build_filter_graph;
use crate::reporting::{FfmpegProgressHandler, ItemStartInfo, NullReporter, Reporter};
use crate::utils::{display_filename, has_source_extension};

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One input to convert, with its resolved overlay options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionItem {
    pub input: PathBuf,
    /// Explicit destination; allocated automatically when `None`.
    pub output: Option<PathBuf>,
    pub options: OverlayOptions,
}

impl ConversionItem {
    pub fn new(input: impl Into<PathBuf>, options: OverlayOptions) -> Self {
        Self {
            input: input.into(),
            output: None,
            options,
        }
    }

    #[must_use]
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }
}

/// Converts single items using an encoder spawner and a probe.
pub struct Converter<S, P> {
    spawner: S,
    probe: P,
    config: CoreConfig,
    reporter: Arc<dyn Reporter>,
}

impl Converter<SidecarSpawner, CommandFfprobeExecutor> {
    /// Converter using the real encoder and probe named by `config.tools`.
    #[must_use]
    pub fn from_config(config: CoreConfig) -> Self {
        let probe = CommandFfprobeExecutor::new(config.tools.ffprobe.clone());
        Self::new(SidecarSpawner, probe, config)
    }
}

impl<S, P> Converter<S, P>
where
    S: FfmpegSpawner,
    P: FfprobeExecutor,
{
    pub fn new(spawner: S, probe: P, config: CoreConfig) -> Self {
        Self {
            spawner,
            probe,
            config,
            reporter: Arc::new(NullReporter),
        }
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Replaces the reporter in place.
    pub fn set_reporter(&mut self, reporter: Arc<dyn Reporter>) {
        self.reporter = reporter;
    }

    #[must_use]
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Builds an item for `input` with this converter's overlay options.
    #[must_use]
    pub fn item_for(&self, input: impl Into<PathBuf>) -> ConversionItem {
        ConversionItem::new(input, self.config.overlay)
    }

    /// Converts one item and returns the written output path.
    pub fn convert(&self, item: &ConversionItem) -> CoreResult<PathBuf> {
        let input = item.input.as_path();
        if !input.is_file() {
            return Err(CoreError::PathError(format!(
                "Input file '{}' not found",
                input.display()
            )));
        }
        if !has_source_extension(input) {
            let message = format!(
                "{} is not an .MTS file, proceeding anyway",
                display_filename(input)
            );
            log::warn!("{message}");
            self.reporter.warning(&message);
        }

        let output = self.resolve_output(item)?;
        let timestamp = resolve_recording_time(&self.probe, input)?;
        log::info!(
            "Converting {} -> {} (recorded {timestamp}, from {})",
            input.display(),
            output.display(),
            timestamp.source().as_str()
        );
        self.reporter.item_started(&ItemStartInfo {
            input_file: display_filename(input),
            output_file: output.display().to_string(),
            recorded_at: timestamp.to_string(),
            timestamp_source: timestamp.source().as_str().to_string(),
        });

        let filter = build_filter_graph(&timestamp, &item.options);
        log::debug!("Filter graph: {filter}");

        let duration = match self.probe.duration(input) {
            Ok(secs) => Some(secs),
            Err(e) => {
                log::warn!(
                    "Duration of {} unknown, progress percentage disabled: {e}",
                    display_filename(input)
                );
                None
            }
        };

        let cmd = EncodeCommandBuilder::new(&self.config.tools.ffmpeg, input, &output, &self.config.encode)
            .with_filter(Some(filter))
            .build();

        self.reporter.encoding_started(duration);
        let mut process = self.spawner.spawn(cmd)?;
        let mut handler = FfmpegProgressHandler::new(duration, self.reporter.as_ref());
        process.handle_events(|event| handler.handle_event(event))?;
        let status = process.wait()?;

        if !status.success() {
            let stderr = handler.error_output();
            let stderr = if stderr.is_empty() {
                "no error output".to_string()
            } else {
                stderr
            };
            log::error!("ffmpeg failed for {}: {status}", input.display());
            return Err(command_failed_error("ffmpeg", status, stderr));
        }

        log::info!("Finished {}", output.display());
        Ok(output)
    }

    /// Converts one item, folding any failure into the outcome.
    pub fn convert_item(&self, item: &ConversionItem) -> ConversionOutcome {
        match self.convert(item) {
            Ok(output) => ConversionOutcome::succeeded(item.input.clone(), output),
            Err(e) => {
                log::error!("Conversion of {} failed: {e}", item.input.display());
                ConversionOutcome::from_error(item.input.clone(), &e)
            }
        }
    }

    fn resolve_output(&self, item: &ConversionItem) -> CoreResult<PathBuf> {
        if let Some(output) = &item.output {
            ensure_parent(output)?;
            return Ok(output.clone());
        }
        if let Some(dir) = &self.config.output_dir {
            std::fs::create_dir_all(dir)?;
        }
        allocate_output_path(&item.input, self.config.output_dir.as_deref())
    }
}

fn ensure_parent(path: &Path) -> CoreResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent)?;
            Ok(())
        }
        _ => Ok(()),
    }
}
