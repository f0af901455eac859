// ============================================================================
// camstamp-cli/src/commands/convert.rs
// ============================================================================
//
// CONVERT COMMAND: Batch and single-file conversion
//
// Builds the core configuration from the parsed arguments, resolves inputs,
// checks the external tools and drives the core batch engine. The batch runs
// on its own thread; this thread replays its events on the reporter.

use crate::cli::Cli;
use crate::error::{CliResult, with_context};

use camstamp_core::config::DEFAULT_MARGIN;
use camstamp_core::reporting::{BatchStartInfo, ReporterError};
use camstamp_core::utils::display_filename;
use camstamp_core::{
    BatchConverter, ConversionItem, Converter, CoreConfig, CoreError, EncoderTools,
    OverlayOptions, Reporter, resolve_inputs, spawn_batch,
};

use log::{debug, info};
use std::path::Path;
use std::sync::Arc;

/// Translates the parsed arguments into a core configuration.
pub fn build_config(cli: &Cli) -> CoreConfig {
    let tools = EncoderTools::locate_with_overrides(cli.ffmpeg.clone(), cli.ffprobe.clone());
    let overlay = OverlayOptions {
        position: cli.position,
        resolution: cli.resolution,
        font_size: cli.font_size,
        margin: DEFAULT_MARGIN,
        precision: cli.precision,
    };
    let mut config = CoreConfig::new(tools)
        .with_output_dir(cli.output_dir.clone())
        .with_overlay(overlay);
    config.encode.crf = cli.crf;
    config
}

fn prepare(config: &CoreConfig) -> CliResult<()> {
    config.validate()?;
    with_context(config.tools.check_available(), "FFmpeg is not available")?;
    debug!(
        "Using ffmpeg at {} and ffprobe at {}",
        config.tools.ffmpeg.display(),
        config.tools.ffprobe.display()
    );
    Ok(())
}

/// Converts every discovered input. Returns `(successes, failures)`.
pub fn run_batch(cli: &Cli, reporter: Arc<dyn Reporter>) -> CliResult<(usize, usize)> {
    let files = resolve_inputs(&cli.inputs)?;
    if files.is_empty() {
        reporter.warning(&format!("{}.", CoreError::NoFilesFound));
        return Ok((0, 0));
    }

    let config = build_config(cli);
    prepare(&config)?;

    info!("Converting {} file(s)", files.len());
    reporter.batch_started(&BatchStartInfo {
        total_files: files.len(),
        file_list: files.iter().map(|f| display_filename(f)).collect(),
        output_dir: config
            .output_dir
            .as_ref()
            .map(|dir| dir.display().to_string()),
    });

    let converter = Converter::from_config(config);
    let items: Vec<ConversionItem> = files.into_iter().map(|f| converter.item_for(f)).collect();
    let handle = spawn_batch(BatchConverter::new(converter), items)?;

    // All rendering happens here, in the order the worker produced it.
    for event in handle.events() {
        event.deliver(reporter.as_ref());
    }

    let run = handle.join()?;
    Ok(run.counts())
}

/// Converts one input to an explicit output path. Returns `(1, 0)` or `(0, 1)`.
pub fn run_legacy(
    cli: &Cli,
    input: &Path,
    output: &Path,
    reporter: Arc<dyn Reporter>,
) -> CliResult<(usize, usize)> {
    let config = build_config(cli);
    prepare(&config)?;

    let converter = Converter::from_config(config).with_reporter(Arc::clone(&reporter));
    let item = converter.item_for(input).with_output(output);
    match converter.convert(&item) {
        Ok(written) => {
            reporter.operation_complete(&format!(
                "Success! Output saved to: {}",
                written.display()
            ));
            Ok((1, 0))
        }
        Err(e) => {
            let suggestion = e.is_metadata_unavailable().then(|| {
                "Only camcorder clips with an embedded recording date can be stamped".to_string()
            });
            reporter.error(&ReporterError {
                title: "Conversion failed".to_string(),
                message: e.to_string(),
                context: Some(format!("Input: {}", input.display())),
                suggestion,
            });
            Ok((0, 1))
        }
    }
}
