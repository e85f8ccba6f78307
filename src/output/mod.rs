use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::download::DownloadOutcome;
use crate::extractors::TrackMetadata;
use crate::policy::Bitrate;
use crate::source::SourceLocator;
use crate::target::OutputTarget;
use crate::utils::{format_duration, format_file_size};

const SEPARATOR_WIDTH: usize = 50;

/// Console status lines for a single run
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    quiet: bool,
}

impl Reporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    /// A reporter that prints nothing and hides spinners
    pub fn silent() -> Self {
        Self { quiet: true }
    }

    fn line(&self, text: impl std::fmt::Display) {
        if !self.quiet {
            println!("{}", text);
        }
    }

    fn separator(&self) {
        self.line("-".repeat(SEPARATOR_WIDTH));
    }

    pub fn banner(&self, locator: &SourceLocator, target: &OutputTarget, bitrate: Bitrate) {
        self.line(format!("🎵 Downloading audio from: {}", style(locator).cyan()));
        self.line(format!("📁 Output file: {}", target.file_name()));
        self.line(format!("🎧 Bitrate: {}kbps", bitrate));
        self.separator();
    }

    pub fn metadata(&self, metadata: &TrackMetadata) {
        self.line(format!("📺 Title: {}", style(metadata.display_title()).bold()));
        if let Some(seconds) = metadata.duration_seconds.filter(|s| *s > 0) {
            self.line(format!("⏱️  Duration: {}", format_duration(seconds)));
        }
        self.separator();
    }

    /// Spinner shown while a blocking step runs
    pub fn spinner(&self, message: &str) -> ProgressBar {
        if self.quiet {
            return ProgressBar::hidden();
        }

        let progress = ProgressBar::new_spinner();
        progress.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        progress.set_message(message.to_string());
        progress.enable_steady_tick(Duration::from_millis(120));
        progress
    }

    pub fn outcome(&self, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Success { path, size } => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                self.line(format!("✅ Success! Audio saved as: {}", style(name).green()));
                self.line(format!("📊 File size: {}", format_file_size(*size)));
                self.line(format!("\n🎉 {}", style("Download completed successfully!").green().bold()));
            }
            DownloadOutcome::Failure { kind, message } => {
                eprintln!("❌ {}: {}", style(kind).red().bold(), message);
                eprintln!("\n💥 {}", style("Download failed!").red().bold());
            }
        }
    }
}

/// Print an error with follow-up hints, regardless of quiet mode
pub fn print_error(message: &str, hints: &[&str]) {
    eprintln!("❌ Error: {}", message);
    for hint in hints {
        eprintln!("   {}", hint);
    }
}
