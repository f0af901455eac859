#![cfg(unix)]
//! End-to-end batch runs against the scripted encoder and probe.

use camstamp_core::external::mocks::{MockFfmpegSpawner, MockFfprobeExecutor};
use camstamp_core::reporting::{FileProgressContext, ItemStartInfo};
use camstamp_core::{
    BatchConverter, BatchEvent, BatchRun, ConversionItem, ConversionOutcome, Converter, CoreConfig,
    EncoderTools, FailureKind, OverlayOptions, OverlayPosition, Reporter, ResolutionPreset,
    resolve_inputs, spawn_batch,
};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread::{self, ThreadId};

/// Leading bytes with a recording marker for 2022-12-24 17:30:05.
fn marker_clip() -> Vec<u8> {
    let mut data = vec![0x47u8; 188];
    data.extend_from_slice(b"MDP");
    data.extend_from_slice(&[0x20, 0x22, 0x12, 0x00, 0x24, 0x17, 0x30, 0x05]);
    data.extend_from_slice(&[0u8; 64]);
    data
}

fn write_clip(dir: &Path, name: &str, with_marker: bool) -> PathBuf {
    let path = dir.join(name);
    let data = if with_marker { marker_clip() } else { vec![0u8; 512] };
    std::fs::write(&path, data).unwrap();
    path
}

fn config() -> CoreConfig {
    CoreConfig::new(EncoderTools::from_paths("ffmpeg", "ffprobe"))
}

fn items_for(converter: &Converter<MockFfmpegSpawner, MockFfprobeExecutor>, files: &[PathBuf]) -> Vec<ConversionItem> {
    files.iter().map(|f| converter.item_for(f)).collect()
}

#[test]
fn two_good_clips_convert_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    write_clip(dir.path(), "a.MTS", true);
    write_clip(dir.path(), "b.MTS", true);

    let spawner = MockFfmpegSpawner::new();
    spawner.add_success_expectation("a.MTS", vec![], true);
    spawner.add_success_expectation("b.MTS", vec![], true);
    let probe = MockFfprobeExecutor::new();

    let files = resolve_inputs([dir.path().to_string_lossy()]).unwrap();
    assert_eq!(files.len(), 2);

    let converter = Converter::new(spawner.clone(), probe, config());
    let items = items_for(&converter, &files);
    let run = BatchConverter::new(converter).run(&items, None);

    assert_eq!(run.counts(), (2, 0));
    for outcome in run.outcomes() {
        let output = outcome.output_file.as_ref().unwrap();
        assert_eq!(output.extension().unwrap(), "mp4");
        assert!(output.exists());
        assert_eq!(outcome.error, None);
    }
    assert_eq!(spawner.pending_expectations(), 0);
}

#[test]
fn clip_without_metadata_fails_alone() {
    let dir = tempfile::tempdir().unwrap();
    write_clip(dir.path(), "a.MTS", true);
    let b = write_clip(dir.path(), "b.MTS", false);

    let spawner = MockFfmpegSpawner::new();
    spawner.add_success_expectation("a.MTS", vec![], true);
    let probe = MockFfprobeExecutor::new();

    let files = resolve_inputs([dir.path().to_string_lossy()]).unwrap();
    let converter = Converter::new(spawner.clone(), probe.clone(), config());
    let items = items_for(&converter, &files);
    let run = BatchConverter::new(converter).run(&items, None);

    assert_eq!(run.counts(), (1, 1));
    let failed = &run.outcomes()[1];
    assert!(!failed.success);
    assert_eq!(failed.output_file, None);
    assert_eq!(failed.failure_kind, Some(FailureKind::MetadataUnavailable));

    let summary = run.summary_text();
    assert!(summary.contains("b.MTS"));
    assert!(summary.contains("metadata"));

    // The encoder never ran for b, and only b needed the container tag.
    assert_eq!(spawner.get_received_calls().len(), 1);
    assert_eq!(probe.creation_time_queries(), [b.canonicalize().unwrap()]);
    assert!(!dir.path().join("b.mp4").exists());
}

#[test]
fn container_tag_rescues_clip_without_marker() {
    let dir = tempfile::tempdir().unwrap();
    let clip = write_clip(dir.path(), "tagged.MTS", false);

    let spawner = MockFfmpegSpawner::new();
    spawner.add_success_expectation("tagged.MTS", vec![], true);
    let probe = MockFfprobeExecutor::new();
    probe.expect_creation_time(&clip, "2019-04-01T09:15:00.000000Z\n");

    let converter = Converter::new(spawner, probe, config());
    let run = BatchConverter::new(converter).run(&[ConversionItem::new(&clip, OverlayOptions::default())], None);
    assert_eq!(run.counts(), (1, 0));
}

#[test]
fn shared_output_dir_resolves_name_collisions() {
    let src_one = tempfile::tempdir().unwrap();
    let src_two = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let first = write_clip(src_one.path(), "clip.MTS", true);
    let second = write_clip(src_two.path(), "clip.MTS", true);

    let spawner = MockFfmpegSpawner::new();
    spawner.add_success_expectation("clip.MTS", vec![], true);
    spawner.add_success_expectation("clip.MTS", vec![], true);
    let probe = MockFfprobeExecutor::new();

    let converter = Converter::new(
        spawner,
        probe,
        config().with_output_dir(Some(out.path().join("converted"))),
    );
    let items = items_for(&converter, &[first, second]);
    let run = BatchConverter::new(converter).run(&items, None);

    let outputs: Vec<_> = run
        .outcomes()
        .iter()
        .map(|o| o.output_file.clone().unwrap())
        .collect();
    assert_eq!(
        outputs,
        [
            out.path().join("converted").join("clip.mp4"),
            out.path().join("converted").join("clip_1.mp4"),
        ]
    );
}

#[test]
fn overlay_options_reach_the_encoder() {
    let dir = tempfile::tempdir().unwrap();
    let clip = write_clip(dir.path(), "a.MTS", true);

    let spawner = MockFfmpegSpawner::new();
    spawner.add_success_expectation("a.MTS", vec![], true);
    let probe = MockFfprobeExecutor::new();

    let overlay = OverlayOptions {
        position: OverlayPosition::TopLeft,
        resolution: ResolutionPreset::P1080,
        ..OverlayOptions::default()
    };
    let converter = Converter::new(spawner.clone(), probe, config().with_overlay(overlay));
    let run = BatchConverter::new(converter).run(&[ConversionItem::new(&clip, overlay)], None);
    assert_eq!(run.counts(), (1, 0));

    let args = &spawner.get_received_calls()[0];
    let vf = args.iter().position(|a| a == "-vf").unwrap();
    let filter = &args[vf + 1];
    assert!(filter.starts_with("scale=1920:-2,drawtext="));
    assert!(filter.ends_with(":x=20:y=20"));
}

#[test]
fn worker_thread_reports_every_item() {
    let dir = tempfile::tempdir().unwrap();
    write_clip(dir.path(), "a.MTS", true);
    write_clip(dir.path(), "b.MTS", false);
    write_clip(dir.path(), "c.MTS", true);

    let spawner = MockFfmpegSpawner::new();
    spawner.add_success_expectation("a.MTS", vec![], true);
    spawner.add_exit_error_expectation("c.MTS", vec![], 1);
    let probe = MockFfprobeExecutor::new();

    let files = resolve_inputs([dir.path().to_string_lossy()]).unwrap();
    let converter = Converter::new(spawner, probe, config());
    let items = items_for(&converter, &files);
    let handle = spawn_batch(BatchConverter::new(converter), items).unwrap();

    let mut seen = Vec::new();
    let mut finished = None;
    for event in handle.events() {
        match event {
            BatchEvent::ItemFinished { index, outcome, .. } => seen.push((index, outcome.success)),
            BatchEvent::Finished(run) => finished = Some(run),
            BatchEvent::Report(_) => {}
        }
    }
    assert_eq!(seen, [(1, true), (2, false), (3, false)]);
    let run = handle.join().unwrap();
    assert_eq!(run.counts(), (1, 2));
    assert_eq!(finished.unwrap(), run);
    assert_eq!(run.outcomes()[2].failure_kind, Some(FailureKind::Encoder));
}

#[test]
fn cancelled_worker_stops_at_item_boundary() {
    let dir = tempfile::tempdir().unwrap();
    write_clip(dir.path(), "a.MTS", true);
    write_clip(dir.path(), "b.MTS", true);

    let spawner = MockFfmpegSpawner::new();
    spawner.add_success_expectation("a.MTS", vec![], true);
    spawner.add_success_expectation("b.MTS", vec![], true);
    let probe = MockFfprobeExecutor::new();

    let files = resolve_inputs([dir.path().to_string_lossy()]).unwrap();
    let converter = Converter::new(spawner, probe, config());
    let items = items_for(&converter, &files);
    let batch = BatchConverter::new(converter);
    batch.cancellation_token().cancel();
    let handle = spawn_batch(batch, items).unwrap();

    let run = handle.join().unwrap();
    assert!(run.is_empty());
    assert!(run.was_cancelled());
    assert_eq!(run.counts(), (0, 0));
}

/// Records each reporter call with the thread it was made on.
#[derive(Default)]
struct Recording {
    calls: Mutex<Vec<(ThreadId, String)>>,
}

impl Recording {
    fn push(&self, label: String) {
        self.calls.lock().unwrap().push((thread::current().id(), label));
    }
}

impl Reporter for Recording {
    fn file_progress(&self, context: &FileProgressContext) {
        self.push(format!("file_progress {}", context.current_file));
    }

    fn item_started(&self, info: &ItemStartInfo) {
        self.push(format!("item_started {}", info.input_file));
    }

    fn encoding_started(&self, _total_secs: Option<f64>) {
        self.push("encoding_started".to_string());
    }

    fn item_complete(&self, outcome: &ConversionOutcome) {
        let name = outcome.input_file.file_name().unwrap().to_string_lossy().into_owned();
        self.push(format!("item_complete {name}"));
    }

    fn batch_complete(&self, run: &BatchRun) {
        self.push(format!("batch_complete {}", run.len()));
    }
}

#[test]
fn worker_reporting_is_rendered_in_order_on_consumer_thread() {
    let dir = tempfile::tempdir().unwrap();
    write_clip(dir.path(), "a.MTS", true);
    write_clip(dir.path(), "b.MTS", true);
    write_clip(dir.path(), "c.MTS", false);

    let spawner = MockFfmpegSpawner::new();
    spawner.add_success_expectation("a.MTS", vec![], true);
    spawner.add_success_expectation("b.MTS", vec![], true);
    let probe = MockFfprobeExecutor::new();

    let recording = Recording::default();
    let files = resolve_inputs([dir.path().to_string_lossy()]).unwrap();
    let converter = Converter::new(spawner, probe, config());
    let items = items_for(&converter, &files);
    let handle = spawn_batch(BatchConverter::new(converter), items).unwrap();
    for event in handle.events() {
        event.deliver(&recording);
    }
    handle.join().unwrap();

    let calls = recording.calls.lock().unwrap().clone();
    let consumer = thread::current().id();
    assert!(calls.iter().all(|(id, _)| *id == consumer));
    let labels: Vec<&str> = calls.iter().map(|(_, label)| label.as_str()).collect();
    assert_eq!(
        labels,
        [
            "file_progress 1",
            "item_started a.MTS",
            "encoding_started",
            "item_complete a.MTS",
            "file_progress 2",
            "item_started b.MTS",
            "encoding_started",
            "item_complete b.MTS",
            "file_progress 3",
            "item_complete c.MTS",
            "batch_complete 3",
        ]
    );
}
