//! Grabstream - A Rust CLI tool for extracting audio from YouTube videos
//!
//! This library validates a video URL, derives a safe output path, builds the
//! negotiation policy handed to yt-dlp, and drives the probe, fetch+transcode
//! and verify steps that turn a remote video into a local audio file.

pub mod cli;
pub mod config;
pub mod download;
pub mod extractors;
pub mod output;
pub mod policy;
pub mod source;
pub mod target;
pub mod transcode;
pub mod utils;
pub mod verify;

pub use cli::Cli;
pub use config::Config;
pub use download::{DownloadOutcome, Downloader, ErrorKind, Preconditions};
pub use extractors::{AudioFormat, ExtractionService, TrackMetadata};
pub use policy::{Bitrate, FetchPolicy};
pub use source::SourceLocator;
pub use target::OutputTarget;

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to grabstream
#[derive(thiserror::Error, Debug)]
pub enum GrabError {
    #[error("Not a YouTube URL: {0}")]
    InvalidSource(String),

    #[error("Invalid output name: {0}")]
    InvalidOutput(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
