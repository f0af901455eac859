// camstamp-core/src/external/mocks.rs
//
// Scripted encoder and probe implementations for tests. Compiled for unit
// tests and, for integration tests, under the "test-mocks" feature. State is
// shared behind `Arc<Mutex<..>>` so the mocks can cross into a batch worker
// thread and still be inspected afterwards.

use super::{FfmpegProcess, FfmpegSpawner, FfprobeExecutor};
use crate::error::{CoreError, CoreResult};
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use std::collections::HashMap;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Builds an exit status carrying `code` as the process exit code.
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    ExitStatus::from_raw(code << 8)
}

/// Mock implementation of [`FfmpegProcess`].
#[derive(Debug, Clone)]
pub struct MockFfmpegProcess {
    pub events_to_emit: Vec<FfmpegEvent>,
    pub exit_status: ExitStatus,
}

impl FfmpegProcess for MockFfmpegProcess {
    fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>,
    {
        for event in self.events_to_emit.clone() {
            handler(event)?;
        }
        Ok(())
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        Ok(self.exit_status)
    }
}

/// An expected ffmpeg call and its scripted result.
pub struct MockFfmpegExpectation {
    pub arg_pattern: String,
    pub result: CoreResult<MockFfmpegProcess>,
    pub create_dummy_output: bool,
}

/// Mock [`FfmpegSpawner`]. Each spawn consumes the first expectation whose
/// pattern occurs in any argument; unmatched calls panic.
#[derive(Clone, Default)]
pub struct MockFfmpegSpawner {
    expectations: Arc<Mutex<Vec<MockFfmpegExpectation>>>,
    received_calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MockFfmpegSpawner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_expectation(
        &self,
        arg_pattern: &str,
        result: CoreResult<MockFfmpegProcess>,
        create_dummy_output: bool,
    ) {
        lock(&self.expectations).push(MockFfmpegExpectation {
            arg_pattern: arg_pattern.to_string(),
            result,
            create_dummy_output,
        });
    }

    pub fn add_success_expectation(
        &self,
        arg_pattern: &str,
        events: Vec<FfmpegEvent>,
        create_dummy_output: bool,
    ) {
        let process = MockFfmpegProcess {
            events_to_emit: events,
            exit_status: exit_status(0),
        };
        self.add_expectation(arg_pattern, Ok(process), create_dummy_output);
    }

    pub fn add_spawn_error_expectation(&self, arg_pattern: &str, error: CoreError) {
        self.add_expectation(arg_pattern, Err(error), false);
    }

    pub fn add_exit_error_expectation(
        &self,
        arg_pattern: &str,
        events: Vec<FfmpegEvent>,
        exit_code: i32,
    ) {
        let process = MockFfmpegProcess {
            events_to_emit: events,
            exit_status: exit_status(exit_code),
        };
        self.add_expectation(arg_pattern, Ok(process), false);
    }

    /// Arguments of every spawn, in call order.
    #[must_use]
    pub fn get_received_calls(&self) -> Vec<Vec<String>> {
        lock(&self.received_calls).clone()
    }

    /// Number of expectations not yet consumed.
    #[must_use]
    pub fn pending_expectations(&self) -> usize {
        lock(&self.expectations).len()
    }
}

impl FfmpegSpawner for MockFfmpegSpawner {
    type Process = MockFfmpegProcess;

    fn spawn(&self, cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        let args: Vec<String> = cmd
            .get_args()
            .map(|s| s.to_string_lossy().into_owned())
            .collect();
        lock(&self.received_calls).push(args.clone());

        let expectation = {
            let mut expectations = lock(&self.expectations);
            let found = expectations
                .iter()
                .position(|exp| args.iter().any(|arg| arg.contains(&exp.arg_pattern)));
            match found {
                Some(index) => expectations.remove(index),
                None => panic!("MockFfmpegSpawner: no expectation for command args: {args:?}"),
            }
        };
        log::debug!(
            "MockFfmpegSpawner: matched expectation '{}'",
            expectation.arg_pattern
        );

        let process = expectation.result?;
        if expectation.create_dummy_output {
            if let Some(output) = args.last() {
                let output = PathBuf::from(output);
                if let Some(parent) = output.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::File::create(&output)?;
            }
        }
        Ok(process)
    }
}

/// Mock [`FfprobeExecutor`] with per-file scripted answers. Files with no
/// scripted tag answer with empty output; files with no scripted duration
/// fail the duration query.
#[derive(Clone, Default)]
pub struct MockFfprobeExecutor {
    creation_tags: Arc<Mutex<HashMap<PathBuf, Result<String, String>>>>,
    durations: Arc<Mutex<HashMap<PathBuf, f64>>>,
    tag_queries: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockFfprobeExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the raw output of the creation-time query for a file.
    pub fn expect_creation_time(&self, input_path: &Path, output: &str) {
        lock(&self.creation_tags).insert(input_path.to_path_buf(), Ok(output.to_string()));
    }

    /// Scripts a probe failure for the creation-time query.
    pub fn expect_creation_time_error(&self, input_path: &Path, message: &str) {
        lock(&self.creation_tags).insert(input_path.to_path_buf(), Err(message.to_string()));
    }

    pub fn expect_duration(&self, input_path: &Path, seconds: f64) {
        lock(&self.durations).insert(input_path.to_path_buf(), seconds);
    }

    /// Files the creation-time query was run against, in call order.
    #[must_use]
    pub fn creation_time_queries(&self) -> Vec<PathBuf> {
        lock(&self.tag_queries).clone()
    }
}

impl FfprobeExecutor for MockFfprobeExecutor {
    fn creation_time_tag(&self, input_path: &Path) -> CoreResult<String> {
        lock(&self.tag_queries).push(input_path.to_path_buf());
        match lock(&self.creation_tags).get(input_path) {
            Some(Ok(output)) => Ok(output.clone()),
            Some(Err(message)) => Err(CoreError::OperationFailed(message.clone())),
            None => Ok(String::new()),
        }
    }

    fn duration(&self, input_path: &Path) -> CoreResult<f64> {
        lock(&self.durations)
            .get(input_path)
            .copied()
            .ok_or_else(|| {
                CoreError::OperationFailed(format!(
                    "MockFfprobeExecutor: no duration for {}",
                    input_path.display()
                ))
            })
    }
}
