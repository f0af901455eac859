// ============================================================================
// camstamp-core/src/external/ffmpeg_executor.rs
// ============================================================================
//
// FFMPEG EXECUTOR: Encoder process management and abstraction
//
// The conversion driver never talks to ffmpeg-sidecar directly. It hands a
// built `FfmpegCommand` to an `FfmpegSpawner`, streams events from the
// returned `FfmpegProcess`, then waits for the exit status. Tests substitute
// the mock spawner from `external::mocks`.

use crate::error::{CoreError, CoreResult, command_start_error, command_wait_error};
use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use std::process::ExitStatus;

/// An active ffmpeg process.
pub trait FfmpegProcess {
    /// Feeds every event from the running command to `handler`.
    fn handle_events<F>(&mut self, handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>;

    /// Waits for the command to finish.
    fn wait(&mut self) -> CoreResult<ExitStatus>;
}

/// Something that can start an [`FfmpegProcess`].
pub trait FfmpegSpawner {
    type Process: FfmpegProcess;

    /// Spawns the command, consuming it.
    fn spawn(&self, cmd: FfmpegCommand) -> CoreResult<Self::Process>;
}

/// [`FfmpegProcess`] backed by an ffmpeg-sidecar child.
pub struct SidecarProcess(FfmpegChild);

impl FfmpegProcess for SidecarProcess {
    fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>,
    {
        let iterator = self.0.iter().map_err(|e| {
            log::error!("Failed to get ffmpeg event iterator: {e}");
            event_stream_error(e)
        })?;
        for event in iterator {
            handler(event)?;
        }
        Ok(())
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        self.0.wait().map_err(|e| command_wait_error("ffmpeg", e))
    }
}

/// The encoder's output could not be read; nothing is known about its exit.
fn event_stream_error(err: impl std::fmt::Display) -> CoreError {
    CoreError::OperationFailed(format!("Failed to read ffmpeg events: {err}"))
}

/// [`FfmpegSpawner`] that runs the real encoder through ffmpeg-sidecar.
#[derive(Debug, Clone, Copy, Default)]
pub struct SidecarSpawner;

impl FfmpegSpawner for SidecarSpawner {
    type Process = SidecarProcess;

    fn spawn(&self, mut cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        log::debug!("Spawning ffmpeg: {cmd:?}");
        cmd.spawn()
            .map(SidecarProcess)
            .map_err(|e| command_start_error("ffmpeg", e))
    }
}
