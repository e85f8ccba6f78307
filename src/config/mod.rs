use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::extractors::AudioFormat;
use crate::policy::{
    Bitrate, FetchPolicy, PlayerClient, StreamFormat, DEFAULT_HEADERS, DEFAULT_MAX_SLEEP_SECS,
    DEFAULT_MIN_SLEEP_SECS, DEFAULT_PLAYER_CLIENTS, DEFAULT_REFERER, DEFAULT_SKIP_FORMATS,
    DEFAULT_USER_AGENT,
};
use crate::transcode::DEFAULT_SAMPLE_RATE;
use crate::GrabError;

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "grabstream.yaml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External tools
    pub tools: ToolsConfig,

    /// Target audio settings
    pub audio: AudioConfig,

    /// Negotiation parameters handed to yt-dlp
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// yt-dlp executable
    pub yt_dlp: PathBuf,

    /// ffmpeg executable used for the availability check
    pub ffmpeg: PathBuf,

    /// Passed to yt-dlp as `--ffmpeg-location` when set
    pub ffmpeg_location: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Output container and codec
    pub format: AudioFormat,

    /// Output sample rate in Hz
    pub sample_rate: u32,

    /// Bitrate used when none is given on the command line
    pub default_bitrate: Bitrate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub referer: String,
    pub headers: Vec<HeaderConfig>,
    pub player_clients: Vec<PlayerClient>,
    pub skip_formats: Vec<StreamFormat>,
    pub min_sleep_secs: u64,
    pub max_sleep_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderConfig {
    pub name: String,
    pub value: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            yt_dlp: PathBuf::from("yt-dlp"),
            ffmpeg: PathBuf::from("ffmpeg"),
            ffmpeg_location: None,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            format: AudioFormat::Mp3,
            sample_rate: DEFAULT_SAMPLE_RATE,
            default_bitrate: Bitrate::Kbps320,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            headers: DEFAULT_HEADERS
                .iter()
                .map(|(name, value)| HeaderConfig {
                    name: name.to_string(),
                    value: value.to_string(),
                })
                .collect(),
            player_clients: DEFAULT_PLAYER_CLIENTS.to_vec(),
            skip_formats: DEFAULT_SKIP_FORMATS.to_vec(),
            min_sleep_secs: DEFAULT_MIN_SLEEP_SECS,
            max_sleep_secs: DEFAULT_MAX_SLEEP_SECS,
        }
    }
}

impl Config {
    /// Load configuration from an explicit path, a discovered file, or defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover(),
        };

        match path {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                Self::from_file(&path)
            }
            None => {
                tracing::debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Read and validate a YAML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;
        Self::from_yaml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config =
            serde_yaml::from_str(content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Find a configuration file, preferring the working directory
    fn discover() -> Option<PathBuf> {
        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Some(local_config);
        }

        let user_config = dirs::config_dir()?.join("grabstream").join("config.yaml");
        user_config.exists().then_some(user_config)
    }

    fn validate(&self) -> Result<(), GrabError> {
        if self.tools.yt_dlp.as_os_str().is_empty() {
            return Err(GrabError::Config("tools.yt_dlp must not be empty".to_string()));
        }

        if self.tools.ffmpeg.as_os_str().is_empty() {
            return Err(GrabError::Config("tools.ffmpeg must not be empty".to_string()));
        }

        if self.audio.sample_rate == 0 {
            return Err(GrabError::Config("audio.sample_rate must be positive".to_string()));
        }

        FetchPolicy::from_config(&self.fetch, self.audio.default_bitrate)?;

        Ok(())
    }
}
