use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;

use super::{ExtractionError, ExtractionService, TrackMetadata};
use crate::policy::FetchPolicy;
use crate::source::SourceLocator;
use crate::transcode::TranscodeJob;
use crate::utils::last_tagged_line;

/// Subset of `--dump-json` output we care about
#[derive(Debug, Deserialize)]
struct ProbeInfo {
    title: Option<String>,
    duration: Option<f64>,
}

/// YouTube audio extractor using yt-dlp
pub struct YtDlpExtractor {
    yt_dlp_path: PathBuf,
    ffmpeg_location: Option<PathBuf>,
}

impl YtDlpExtractor {
    pub fn new() -> Self {
        Self {
            yt_dlp_path: PathBuf::from("yt-dlp"),
            ffmpeg_location: None,
        }
    }

    pub fn with_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.yt_dlp_path = path.into();
        self
    }

    /// Directory or binary yt-dlp should use for ffmpeg
    pub fn with_ffmpeg_location(mut self, location: Option<PathBuf>) -> Self {
        self.ffmpeg_location = location;
        self
    }

    /// Check if yt-dlp is available
    pub async fn check_availability(&self) -> bool {
        crate::utils::check_command_available(&self.yt_dlp_path, "--version").await
    }

    /// Arguments for a metadata-only request
    pub fn probe_args(&self, locator: &SourceLocator, policy: &FetchPolicy) -> Vec<String> {
        let mut args: Vec<String> = ["--dump-json", "--skip-download", "--no-playlist"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        args.extend(policy_args(policy));
        args.push("--".to_string());
        args.push(locator.as_str().to_string());
        args
    }

    /// Arguments for the download and audio extraction
    pub fn fetch_args(
        &self,
        locator: &SourceLocator,
        policy: &FetchPolicy,
        job: &TranscodeJob,
    ) -> Vec<String> {
        let settings = &job.settings;
        let mut args: Vec<String> = vec![
            "--format".into(),
            "bestaudio/best".into(),
            "--no-playlist".into(),
            "--output".into(),
            output_template(&job.output_stem),
            "--extract-audio".into(),
            "--audio-format".into(),
            settings.format.codec().into(),
            "--audio-quality".into(),
            format!("{}K", settings.bitrate.kbps()),
            "--postprocessor-args".into(),
            format!("ffmpeg:{}", settings.ffmpeg_args().join(" ")),
            "--newline".into(),
            "--no-progress".into(),
        ];

        let keep = if settings.keep_source { "--keep-video" } else { "--no-keep-video" };
        args.push(keep.into());

        if job.overwrite {
            args.push("--force-overwrites".into());
        }

        if let Some(location) = &self.ffmpeg_location {
            args.push("--ffmpeg-location".into());
            args.push(location.to_string_lossy().into_owned());
        }

        args.extend(policy_args(policy));
        args.push("--".to_string());
        args.push(locator.as_str().to_string());
        args
    }

    async fn run(&self, args: &[String]) -> Result<Output, ExtractionError> {
        tracing::debug!("Running {} {}", self.yt_dlp_path.display(), args.join(" "));

        let output = Command::new(&self.yt_dlp_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ExtractionError::Launch {
                program: self.yt_dlp_path.display().to_string(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines() {
            if let Some(warning) = line.trim().strip_prefix("WARNING:") {
                tracing::warn!("yt-dlp: {}", warning.trim());
            }
        }

        if output.status.success() {
            Ok(output)
        } else {
            Err(classify_failure(&stderr, output.status.code()))
        }
    }
}

/// Render the policy as yt-dlp flags
pub fn policy_args(policy: &FetchPolicy) -> Vec<String> {
    let mut args = vec![
        "--user-agent".to_string(),
        policy.user_agent().to_string(),
        "--referer".to_string(),
        policy.referer().to_string(),
    ];

    for (name, value) in policy.headers() {
        args.push("--add-header".to_string());
        args.push(format!("{name}:{value}"));
    }

    let clients: Vec<&str> = policy.player_clients().iter().map(|c| c.as_str()).collect();
    let mut extractor_args = format!("youtube:player_client={}", clients.join(","));
    if !policy.skip_formats().is_empty() {
        let skip: Vec<&str> = policy.skip_formats().iter().map(|f| f.as_str()).collect();
        extractor_args.push_str(";skip=");
        extractor_args.push_str(&skip.join(","));
    }
    args.push("--extractor-args".to_string());
    args.push(extractor_args);

    let pacing = policy.pacing();
    args.push("--sleep-interval".to_string());
    args.push(pacing.min().as_secs().to_string());
    args.push("--max-sleep-interval".to_string());
    args.push(pacing.max().as_secs().to_string());

    args
}

/// yt-dlp output template for an extension-less path
fn output_template(stem: &Path) -> String {
    format!("{}.%(ext)s", stem.to_string_lossy().replace('%', "%%"))
}

/// Map a failed yt-dlp run to an extraction error
fn classify_failure(stderr: &str, code: Option<i32>) -> ExtractionError {
    if let Some(message) = last_tagged_line(stderr, "ERROR:") {
        return ExtractionError::Download(message);
    }

    match code {
        Some(code) => ExtractionError::Other(format!("yt-dlp exited with status {code}")),
        None => ExtractionError::Other("yt-dlp was terminated by a signal".to_string()),
    }
}

/// Read the first JSON document printed by `--dump-json`
fn parse_probe_output(stdout: &str) -> Result<TrackMetadata, ExtractionError> {
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| ExtractionError::Metadata("yt-dlp printed no metadata".to_string()))?;

    let info: ProbeInfo =
        serde_json::from_str(line).map_err(|e| ExtractionError::Metadata(e.to_string()))?;

    let duration_seconds = info
        .duration
        .filter(|d| d.is_finite() && *d >= 0.0)
        .map(|d| d as u64);

    Ok(TrackMetadata {
        title: info.title.filter(|t| !t.trim().is_empty()),
        duration_seconds,
    })
}

#[async_trait]
impl ExtractionService for YtDlpExtractor {
    async fn probe(
        &self,
        locator: &SourceLocator,
        policy: &FetchPolicy,
    ) -> Result<TrackMetadata, ExtractionError> {
        tracing::debug!("Extracting video info for: {}", locator);

        let output = self.run(&self.probe_args(locator, policy)).await?;
        parse_probe_output(&String::from_utf8_lossy(&output.stdout))
    }

    async fn fetch_audio(
        &self,
        locator: &SourceLocator,
        policy: &FetchPolicy,
        job: &TranscodeJob,
    ) -> Result<(), ExtractionError> {
        tracing::debug!(
            "Downloading audio for {} to {}",
            locator,
            job.expected_output.display()
        );

        self.run(&self.fetch_args(locator, policy, job)).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

impl Default for YtDlpExtractor {
    fn default() -> Self {
        Self::new()
    }
}
