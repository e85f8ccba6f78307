use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod youtube;

use crate::download::ErrorKind;
use crate::policy::FetchPolicy;
use crate::source::SourceLocator;
use crate::transcode::TranscodeJob;

/// Title shown when the probe does not return one
pub const UNKNOWN_TITLE: &str = "Unknown";

/// Metadata returned by the probe step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    /// Title of the video
    pub title: Option<String>,

    /// Duration in whole seconds
    pub duration_seconds: Option<u64>,
}

impl TrackMetadata {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(UNKNOWN_TITLE)
    }
}

/// Supported target audio formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    M4a,
    Opus,
    Flac,
    Wav,
}

impl AudioFormat {
    /// File extension, without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::M4a => "m4a",
            AudioFormat::Opus => "opus",
            AudioFormat::Flac => "flac",
            AudioFormat::Wav => "wav",
        }
    }

    /// Codec name understood by yt-dlp's `--audio-format`
    pub fn codec(&self) -> &'static str {
        self.extension()
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "mp3" => Some(AudioFormat::Mp3),
            "m4a" | "aac" => Some(AudioFormat::M4a),
            "opus" => Some(AudioFormat::Opus),
            "flac" => Some(AudioFormat::Flac),
            "wav" => Some(AudioFormat::Wav),
            _ => None,
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Failures reported by an extraction service
#[derive(thiserror::Error, Debug)]
pub enum ExtractionError {
    /// The service explicitly reported a download error
    #[error("{0}")]
    Download(String),

    /// The probe answered but its output could not be read
    #[error("could not read video metadata: {0}")]
    Metadata(String),

    /// The service binary could not be started
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Anything else, e.g. a non-zero exit without an error report
    #[error("{0}")]
    Other(String),
}

impl ExtractionError {
    /// Outcome kind this failure is reported as
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractionError::Download(_) | ExtractionError::Metadata(_) => ErrorKind::NetworkError,
            ExtractionError::Launch { .. } | ExtractionError::Other(_) => ErrorKind::UnexpectedError,
        }
    }
}

/// A service that can probe a video and fetch its audio track
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExtractionService: Send + Sync {
    /// Fetch metadata only, without downloading the payload
    async fn probe(
        &self,
        locator: &SourceLocator,
        policy: &FetchPolicy,
    ) -> Result<TrackMetadata, ExtractionError>;

    /// Download the best audio stream and hand it to the transcoder
    async fn fetch_audio(
        &self,
        locator: &SourceLocator,
        policy: &FetchPolicy,
        job: &TranscodeJob,
    ) -> Result<(), ExtractionError>;

    /// Get the name of this service
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_title_falls_back_to_placeholder() {
        let meta = TrackMetadata::default();
        assert_eq!(meta.display_title(), "Unknown");

        let meta = TrackMetadata {
            title: Some("Never Gonna Give You Up".to_string()),
            duration_seconds: Some(213),
        };
        assert_eq!(meta.display_title(), "Never Gonna Give You Up");
    }

    #[test]
    fn audio_format_extensions() {
        assert_eq!(AudioFormat::default(), AudioFormat::Mp3);
        assert_eq!(AudioFormat::from_extension("MP3"), Some(AudioFormat::Mp3));
        assert_eq!(AudioFormat::from_extension("aac"), Some(AudioFormat::M4a));
        assert_eq!(AudioFormat::from_extension("webm"), None);
        assert_eq!(AudioFormat::Opus.to_string(), "opus");
    }

    #[test]
    fn extraction_errors_map_to_outcome_kinds() {
        assert_eq!(
            ExtractionError::Download("Video unavailable".into()).kind(),
            ErrorKind::NetworkError
        );
        assert_eq!(
            ExtractionError::Metadata("empty output".into()).kind(),
            ErrorKind::NetworkError
        );
        let launch = ExtractionError::Launch {
            program: "yt-dlp".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(launch.kind(), ErrorKind::UnexpectedError);
        assert_eq!(
            ExtractionError::Other("killed by signal".into()).kind(),
            ErrorKind::UnexpectedError
        );
    }
}
