//! Probe, fetch+transcode and verify, in that order.
//!
//! The [`Downloader`] never lets a raw error escape: every failure is turned
//! into a [`DownloadOutcome::Failure`] tagged with an [`ErrorKind`]. Nothing is
//! retried here; pacing and client fallback are handled by the extraction
//! service according to the [`FetchPolicy`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::extractors::{ExtractionService, TrackMetadata};
use crate::output::Reporter;
use crate::policy::FetchPolicy;
use crate::source::SourceLocator;
use crate::target::OutputTarget;
use crate::transcode::{TranscodeJob, TranscodeSettings, DEFAULT_SAMPLE_RATE};
use crate::verify;

/// Why a run failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The locator is not a supported URL
    InvalidSource,
    /// The remote resource could not be reached or read
    NetworkError,
    /// Every step succeeded but no file was produced
    ArtifactMissing,
    /// A collaborator failed in some other way
    UnexpectedError,
    /// The run was started without its preconditions
    PreconditionFailed,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::InvalidSource => "Invalid source",
            ErrorKind::NetworkError => "Download error",
            ErrorKind::ArtifactMissing => "Error",
            ErrorKind::UnexpectedError => "Unexpected error",
            ErrorKind::PreconditionFailed => "Precondition failed",
        };
        f.write_str(label)
    }
}

/// Terminal result of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Success { path: PathBuf, size: u64 },
    Failure { kind: ErrorKind, message: String },
}

impl DownloadOutcome {
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        DownloadOutcome::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Success { .. })
    }

    /// Failure kind, if any
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            DownloadOutcome::Success { .. } => None,
            DownloadOutcome::Failure { kind, .. } => Some(*kind),
        }
    }

    /// Process exit code for this outcome
    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

/// Checks performed by the caller before a run starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preconditions {
    /// The user agreed to replace an existing file
    pub overwrite_confirmed: bool,

    /// The transcoder binary was found
    pub transcoder_available: bool,
}

/// Drives a single download through the extraction service
pub struct Downloader<E> {
    extractor: E,
    sample_rate: u32,
    reporter: Reporter,
}

impl<E: ExtractionService> Downloader<E> {
    pub fn new(extractor: E) -> Self {
        Self {
            extractor,
            sample_rate: DEFAULT_SAMPLE_RATE,
            reporter: Reporter::default(),
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Run probe, fetch+transcode and verify for one locator
    pub async fn run(
        &self,
        locator: &SourceLocator,
        target: &OutputTarget,
        policy: &FetchPolicy,
        preconditions: Preconditions,
    ) -> DownloadOutcome {
        if !preconditions.transcoder_available {
            return DownloadOutcome::failure(
                ErrorKind::PreconditionFailed,
                "transcoder is not available",
            );
        }

        let overwrite = target.exists();
        if overwrite && !preconditions.overwrite_confirmed {
            return DownloadOutcome::failure(
                ErrorKind::PreconditionFailed,
                format!("{} already exists", target.path().display()),
            );
        }

        let metadata = match self.probe(locator, policy).await {
            Ok(metadata) => metadata,
            Err(outcome) => return outcome,
        };
        self.reporter.metadata(&metadata);

        let settings =
            TranscodeSettings::new(target.format(), policy.bitrate()).with_sample_rate(self.sample_rate);
        let job = TranscodeJob::new(target, settings, overwrite);

        let before = match self.fetch(locator, policy, &job).await {
            Ok(before) => before,
            Err(outcome) => return outcome,
        };

        // An untouched file from an earlier run is not this run's artifact
        if before.is_some() && FileStamp::read(target.path()) == before {
            tracing::error!(
                "{} reported success but left {} unchanged",
                self.extractor.name(),
                target.path().display()
            );
            return DownloadOutcome::failure(
                ErrorKind::ArtifactMissing,
                "output file was not created",
            );
        }

        let outcome = verify::verify(target).await;
        if let DownloadOutcome::Failure { message, .. } = &outcome {
            tracing::error!("{} reported success but {}", self.extractor.name(), message);
        }
        outcome
    }

    async fn probe(
        &self,
        locator: &SourceLocator,
        policy: &FetchPolicy,
    ) -> Result<TrackMetadata, DownloadOutcome> {
        tracing::info!("Probing {} via {}", locator, self.extractor.name());
        let progress = self.reporter.spinner("Fetching video information...");

        let result = self.extractor.probe(locator, policy).await;
        progress.finish_and_clear();

        result
            .inspect(|metadata| {
                tracing::info!(
                    title = metadata.display_title(),
                    duration = ?metadata.duration_seconds,
                    "Probe complete"
                );
            })
            .map_err(|e| {
                tracing::error!("Probe failed: {}", e);
                DownloadOutcome::failure(e.kind(), e.to_string())
            })
    }

    async fn fetch(
        &self,
        locator: &SourceLocator,
        policy: &FetchPolicy,
        job: &TranscodeJob,
    ) -> Result<Option<FileStamp>, DownloadOutcome> {
        tracing::info!(
            "Fetching audio as {} at {}kbps, {} Hz",
            job.settings.format,
            job.settings.bitrate,
            job.settings.sample_rate
        );
        let before = FileStamp::read(&job.expected_output);
        let progress = self.reporter.spinner("Downloading and converting audio...");

        let result = self.extractor.fetch_audio(locator, policy, job).await;

        match result {
            Ok(()) => {
                progress.finish_with_message("Download complete");
                Ok(before)
            }
            Err(e) => {
                progress.finish_and_clear();
                tracing::error!("Fetch failed: {}", e);
                discard_partial_output(&job.expected_output, &job.output_stem, before);
                Err(DownloadOutcome::failure(e.kind(), e.to_string()))
            }
        }
    }
}

/// Modification time and length of a file, used to tell a fresh artifact
/// from one that was already there
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl FileStamp {
    fn read(path: &Path) -> Option<Self> {
        let metadata = std::fs::metadata(path).ok()?;
        Some(Self {
            modified: metadata.modified().ok(),
            len: metadata.len(),
        })
    }
}

/// Remove files a failed fetch left behind.
///
/// The target is only removed when it changed during this run; an older file
/// at the same path is left untouched. Download fragments are removed. Any
/// other `<stem>.*` sibling (typically the source container when the
/// conversion failed) is kept, logged and returned.
fn discard_partial_output(
    expected: &Path,
    stem: &Path,
    before: Option<FileStamp>,
) -> Vec<PathBuf> {
    if let Some(after) = FileStamp::read(expected) {
        if before != Some(after) {
            remove_leftover(expected);
        }
    }

    let (Some(dir), Some(stem_name)) = (stem.parent(), stem.file_name()) else {
        return Vec::new();
    };
    let prefix = format!("{}.", stem_name.to_string_lossy());

    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut kept = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.starts_with(&prefix) || path == expected {
            continue;
        }

        if name.ends_with(".part") || name.ends_with(".ytdl") {
            remove_leftover(&path);
        } else {
            tracing::warn!("Intermediate file left behind: {}", path.display());
            kept.push(path);
        }
    }
    kept.sort();
    kept
}

fn remove_leftover(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::warn!("Removed partial output {}", path.display()),
        Err(e) => tracing::warn!("Could not remove partial output {}: {}", path.display(), e),
    }
}
