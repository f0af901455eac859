// ============================================================================
// camstamp-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with the encoder and probe executables
//
// This module encapsulates everything camstamp knows about ffmpeg and
// ffprobe: where to find them, how to check they run, and the traits the
// conversion driver uses to spawn them. Tool locations are an explicit value
// (`EncoderTools`) carried by `CoreConfig` rather than process-wide state.
//
// KEY COMPONENTS:
// - EncoderTools: resolved executable paths with bundled-first lookup
// - FfmpegSpawner / FfmpegProcess: encoder process abstraction
// - FfprobeExecutor: probe abstraction for creation tags and duration
// - mocks: scripted implementations for tests

use crate::error::{CoreError, CoreResult};

use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

/// Filter-chain and encoder-argument building
pub mod ffmpeg_builder;

/// Traits and implementations for executing ffmpeg commands
pub mod ffmpeg_executor;

/// Traits and implementations for executing ffprobe commands
pub mod ffprobe_executor;

#[cfg(all(unix, any(test, feature = "test-mocks")))]
pub mod mocks;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use ffmpeg_builder::{EncodeCommandBuilder, VideoFilterChain};
pub use ffmpeg_executor::{FfmpegProcess, FfmpegSpawner, SidecarProcess, SidecarSpawner};
pub use ffprobe_executor::{CommandFfprobeExecutor, FfprobeExecutor};

// ============================================================================
// TOOL LOCATION
// ============================================================================

/// Name of the ffmpeg subdirectory searched next to the executable.
const BUNDLE_SUBDIR: &str = "ffmpeg";

/// Resolved locations of the encoder and probe executables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderTools {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl EncoderTools {
    /// Uses the given paths verbatim.
    pub fn from_paths(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Looks for bundled tools next to the running executable, then in its
    /// `ffmpeg/` subdirectory, and otherwise relies on `PATH`.
    #[must_use]
    pub fn locate() -> Self {
        let base = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        Self {
            ffmpeg: find_executable(base.as_deref(), "ffmpeg"),
            ffprobe: find_executable(base.as_deref(), "ffprobe"),
        }
    }

    /// Like [`EncoderTools::locate`], but explicit overrides win per tool.
    #[must_use]
    pub fn locate_with_overrides(ffmpeg: Option<PathBuf>, ffprobe: Option<PathBuf>) -> Self {
        let located = Self::locate();
        Self {
            ffmpeg: ffmpeg.unwrap_or(located.ffmpeg),
            ffprobe: ffprobe.unwrap_or(located.ffprobe),
        }
    }

    /// Runs both tools with `-version`.
    pub fn check_available(&self) -> CoreResult<()> {
        check_dependency(&self.ffmpeg)?;
        check_dependency(&self.ffprobe)?;
        Ok(())
    }
}

fn executable_name(name: &str) -> String {
    if cfg!(windows) {
        format!("{name}.exe")
    } else {
        name.to_string()
    }
}

/// Resolves one tool name against an optional bundle directory.
pub(crate) fn find_executable(base: Option<&Path>, name: &str) -> PathBuf {
    let exe_name = executable_name(name);
    if let Some(base) = base {
        for candidate in [base.join(&exe_name), base.join(BUNDLE_SUBDIR).join(&exe_name)] {
            if candidate.is_file() {
                log::debug!("Using bundled {name}: {}", candidate.display());
                return candidate;
            }
        }
    }
    PathBuf::from(exe_name)
}

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks that an external command starts and exits successfully when run
/// with `-version`.
pub(crate) fn check_dependency(cmd: &Path) -> CoreResult<()> {
    let name = cmd.display().to_string();
    let result = Command::new(cmd)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(status) if status.success() => {
            log::debug!("Found dependency: {name}");
            Ok(())
        }
        Ok(status) => {
            log::warn!("Dependency '{name}' exited with {status} for -version");
            Err(CoreError::DependencyNotFound(name))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{name}' not found.");
            Err(CoreError::DependencyNotFound(name))
        }
        Err(e) => {
            log::error!("Failed to start dependency check command '{name}': {e}");
            Err(CoreError::CommandStart(name, e))
        }
    }
}
