use std::path::{Path, PathBuf};

use crate::extractors::AudioFormat;
use crate::policy::Bitrate;
use crate::target::OutputTarget;
use crate::utils;

/// Output sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// How the downloaded stream is converted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscodeSettings {
    pub format: AudioFormat,
    pub bitrate: Bitrate,
    pub sample_rate: u32,

    /// Keep the original container after conversion
    pub keep_source: bool,
}

impl TranscodeSettings {
    pub fn new(format: AudioFormat, bitrate: Bitrate) -> Self {
        Self {
            format,
            bitrate,
            sample_rate: DEFAULT_SAMPLE_RATE,
            keep_source: false,
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Extra arguments for the ffmpeg invocation
    pub fn ffmpeg_args(&self) -> Vec<String> {
        vec!["-ar".to_string(), self.sample_rate.to_string()]
    }
}

/// A single fetch+transcode request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeJob {
    /// Output path without extension; the transcoder appends its own
    pub output_stem: PathBuf,

    /// Where the finished artifact is expected to appear
    pub expected_output: PathBuf,

    pub settings: TranscodeSettings,

    /// Replace an existing artifact
    pub overwrite: bool,
}

impl TranscodeJob {
    pub fn new(target: &OutputTarget, settings: TranscodeSettings, overwrite: bool) -> Self {
        Self {
            output_stem: target.stem_path(),
            expected_output: target.path().to_path_buf(),
            settings,
            overwrite,
        }
    }
}

/// The ffmpeg binary yt-dlp hands converted streams to
#[derive(Debug, Clone)]
pub struct Transcoder {
    program: PathBuf,
}

impl Transcoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Check whether ffmpeg can be launched
    pub async fn is_available(&self) -> bool {
        let available = utils::check_command_available(&self.program, "-version").await;
        tracing::debug!(
            "Transcoder {} available: {}",
            self.program.display(),
            available
        );
        available
    }
}

impl Default for Transcoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}
