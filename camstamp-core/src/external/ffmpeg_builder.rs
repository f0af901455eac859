//! FFmpeg command builder utilities
//!
//! Builders for the filter chain and the encode command used for every
//! conversion. The argument order is fixed: input, filter graph, video codec
//! settings, audio codec settings, container flags, overwrite, output. The
//! output path is always the final argument.

use crate::config::EncodeProfile;
use ffmpeg_sidecar::command::FfmpegCommand;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Builder for constructing video filter chains
#[derive(Debug, Default)]
pub struct VideoFilterChain {
    filters: Vec<String>,
}

impl VideoFilterChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter to the chain; empty strings are ignored.
    #[must_use]
    pub fn add_filter(mut self, filter: impl Into<String>) -> Self {
        let filter = filter.into();
        if !filter.is_empty() {
            self.filters.push(filter);
        }
        self
    }

    /// Adds a filter only when one is given.
    #[must_use]
    pub fn add_optional(self, filter: Option<String>) -> Self {
        match filter {
            Some(filter) => self.add_filter(filter),
            None => self,
        }
    }

    /// Joins the chain with commas; `None` when empty.
    #[must_use]
    pub fn build(self) -> Option<String> {
        if self.filters.is_empty() {
            None
        } else {
            Some(self.filters.join(","))
        }
    }
}

/// Builder for the single encode command run per conversion.
#[derive(Debug)]
pub struct EncodeCommandBuilder<'a> {
    ffmpeg: PathBuf,
    input: &'a Path,
    output: &'a Path,
    filter: Option<String>,
    profile: &'a EncodeProfile,
}

impl<'a> EncodeCommandBuilder<'a> {
    #[must_use]
    pub fn new(
        ffmpeg: impl Into<PathBuf>,
        input: &'a Path,
        output: &'a Path,
        profile: &'a EncodeProfile,
    ) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            input,
            output,
            filter: None,
            profile,
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }

    /// Encoder arguments excluding the executable, in invocation order.
    /// Paths are passed through untouched, so non-UTF-8 names survive.
    #[must_use]
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-i".into(), self.input.into()];
        if let Some(filter) = &self.filter {
            args.push("-vf".into());
            args.push(filter.into());
        }
        let profile = self.profile;
        let crf = profile.crf.to_string();
        for arg in [
            "-c:v",
            profile.video_codec.as_str(),
            "-preset",
            profile.preset.as_str(),
            "-crf",
            crf.as_str(),
            "-c:a",
            profile.audio_codec.as_str(),
            "-b:a",
            profile.audio_bitrate.as_str(),
            "-movflags",
            "+faststart",
            "-y",
        ] {
            args.push(arg.into());
        }
        args.push(self.output.into());
        args
    }

    /// Builds the ffmpeg-sidecar command.
    #[must_use]
    pub fn build(self) -> FfmpegCommand {
        let mut cmd = FfmpegCommand::new_with_path(&self.ffmpeg);
        cmd.hide_banner();
        cmd.args(self.args());
        cmd
    }
}
