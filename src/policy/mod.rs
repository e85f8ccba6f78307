//! Negotiation parameters used when talking to YouTube.
//!
//! A [`FetchPolicy`] is plain data. It says which identity to present, which
//! player clients to try and how to pace requests; turning that into
//! command-line flags is the extractor's job.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::GrabError;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_REFERER: &str = "https://www.youtube.com/";

/// Browser-like headers sent with every request, in order
pub const DEFAULT_HEADERS: &[(&str, &str)] = &[
    ("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    ("Accept-Language", "en-us,en;q=0.5"),
    ("Accept-Encoding", "gzip, deflate"),
    ("DNT", "1"),
    ("Connection", "keep-alive"),
    ("Upgrade-Insecure-Requests", "1"),
];

pub const DEFAULT_PLAYER_CLIENTS: &[PlayerClient] = &[PlayerClient::Android, PlayerClient::Web];
pub const DEFAULT_SKIP_FORMATS: &[StreamFormat] = &[StreamFormat::Hls, StreamFormat::Dash];

pub const DEFAULT_MIN_SLEEP_SECS: u64 = 1;
pub const DEFAULT_MAX_SLEEP_SECS: u64 = 5;

/// Target audio bitrate in kbps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Bitrate {
    #[value(name = "128")]
    Kbps128,
    #[value(name = "192")]
    Kbps192,
    #[value(name = "256")]
    Kbps256,
    #[default]
    #[value(name = "320")]
    Kbps320,
}

impl Bitrate {
    pub fn kbps(&self) -> u32 {
        match self {
            Bitrate::Kbps128 => 128,
            Bitrate::Kbps192 => 192,
            Bitrate::Kbps256 => 256,
            Bitrate::Kbps320 => 320,
        }
    }
}

impl TryFrom<u32> for Bitrate {
    type Error = String;

    fn try_from(kbps: u32) -> Result<Self, Self::Error> {
        match kbps {
            128 => Ok(Bitrate::Kbps128),
            192 => Ok(Bitrate::Kbps192),
            256 => Ok(Bitrate::Kbps256),
            320 => Ok(Bitrate::Kbps320),
            other => Err(format!("unsupported bitrate {other} (expected 128, 192, 256 or 320)")),
        }
    }
}

impl From<Bitrate> for u32 {
    fn from(bitrate: Bitrate) -> Self {
        bitrate.kbps()
    }
}

impl fmt::Display for Bitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kbps())
    }
}

/// Player identities YouTube serves different stream manifests to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerClient {
    Android,
    Ios,
    Web,
    WebSafari,
    WebMusic,
    Mweb,
    Tv,
}

impl PlayerClient {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerClient::Android => "android",
            PlayerClient::Ios => "ios",
            PlayerClient::Web => "web",
            PlayerClient::WebSafari => "web_safari",
            PlayerClient::WebMusic => "web_music",
            PlayerClient::Mweb => "mweb",
            PlayerClient::Tv => "tv",
        }
    }
}

/// Adaptive streaming categories that can be skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamFormat {
    Hls,
    Dash,
}

impl StreamFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamFormat::Hls => "hls",
            StreamFormat::Dash => "dash",
        }
    }
}

/// Bounds of the random delay inserted between remote requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    min: Duration,
    max: Duration,
}

impl Pacing {
    pub fn new(min: Duration, max: Duration) -> Result<Self, GrabError> {
        if min > max {
            return Err(GrabError::Config(format!(
                "minimum sleep interval ({}s) exceeds maximum ({}s)",
                min.as_secs(),
                max.as_secs()
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(DEFAULT_MIN_SLEEP_SECS),
            max: Duration::from_secs(DEFAULT_MAX_SLEEP_SECS),
        }
    }
}

/// Everything the extractor needs to negotiate with the remote host.
///
/// Immutable once built. The bitrate is not used for negotiation; it is
/// carried through as the target transcoding quality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPolicy {
    user_agent: String,
    referer: String,
    headers: Vec<(String, String)>,
    player_clients: Vec<PlayerClient>,
    skip_formats: Vec<StreamFormat>,
    pacing: Pacing,
    bitrate: Bitrate,
}

impl FetchPolicy {
    /// Build the default policy for the given bitrate
    pub fn build(bitrate: Bitrate) -> Self {
        Self::assemble(
            DEFAULT_USER_AGENT.to_string(),
            DEFAULT_REFERER.to_string(),
            DEFAULT_HEADERS
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            DEFAULT_PLAYER_CLIENTS,
            DEFAULT_SKIP_FORMATS,
            Pacing::default(),
            bitrate,
        )
    }

    /// Build a policy from user configuration.
    ///
    /// Also validates the `fetch` section whenever a configuration file is
    /// parsed.
    pub fn from_config(config: &FetchConfig, bitrate: Bitrate) -> Result<Self, GrabError> {
        if config.player_clients.is_empty() {
            return Err(GrabError::Config(
                "fetch.player_clients must list at least one client".to_string(),
            ));
        }

        for header in &config.headers {
            let name = header.name.trim();
            if name.is_empty() || name.contains(':') || name.contains(char::is_whitespace) {
                return Err(GrabError::Config(format!(
                    "fetch.headers: invalid header name {:?}",
                    header.name
                )));
            }
        }

        let pacing = Pacing::new(
            Duration::from_secs(config.min_sleep_secs),
            Duration::from_secs(config.max_sleep_secs),
        )
        .map_err(|_| {
            GrabError::Config(format!(
                "fetch.min_sleep_secs ({}) exceeds fetch.max_sleep_secs ({})",
                config.min_sleep_secs, config.max_sleep_secs
            ))
        })?;

        Ok(Self::assemble(
            config.user_agent.clone(),
            config.referer.clone(),
            config
                .headers
                .iter()
                .map(|h| (h.name.trim().to_string(), h.value.clone()))
                .collect(),
            &config.player_clients,
            &config.skip_formats,
            pacing,
            bitrate,
        ))
    }

    fn assemble(
        user_agent: String,
        referer: String,
        headers: Vec<(String, String)>,
        player_clients: &[PlayerClient],
        skip_formats: &[StreamFormat],
        pacing: Pacing,
        bitrate: Bitrate,
    ) -> Self {
        Self {
            user_agent,
            referer,
            headers,
            player_clients: dedup(player_clients),
            skip_formats: dedup(skip_formats),
            pacing,
            bitrate,
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn referer(&self) -> &str {
        &self.referer
    }

    /// Extra request headers as `(name, value)` pairs
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Player clients in the order they should be tried
    pub fn player_clients(&self) -> &[PlayerClient] {
        &self.player_clients
    }

    pub fn skip_formats(&self) -> &[StreamFormat] {
        &self.skip_formats
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    pub fn bitrate(&self) -> Bitrate {
        self.bitrate
    }
}

fn dedup<T: Copy + PartialEq>(items: &[T]) -> Vec<T> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(item) {
            out.push(*item);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeaderConfig;

    const ALL_BITRATES: [Bitrate; 4] = [
        Bitrate::Kbps128,
        Bitrate::Kbps192,
        Bitrate::Kbps256,
        Bitrate::Kbps320,
    ];

    #[test]
    fn default_policy_is_usable_for_every_bitrate() {
        for bitrate in ALL_BITRATES {
            let policy = FetchPolicy::build(bitrate);
            assert!(!policy.player_clients().is_empty());
            assert!(policy.pacing().min() <= policy.pacing().max());
            assert_eq!(policy.bitrate(), bitrate);
        }
    }

    #[test]
    fn bitrate_does_not_change_negotiation() {
        let low = FetchPolicy::build(Bitrate::Kbps128);
        let high = FetchPolicy::build(Bitrate::Kbps320);
        assert_eq!(low.user_agent(), high.user_agent());
        assert_eq!(low.headers(), high.headers());
        assert_eq!(low.player_clients(), high.player_clients());
        assert_eq!(low.pacing(), high.pacing());
    }

    #[test]
    fn default_policy_contents() {
        let policy = FetchPolicy::build(Bitrate::default());
        assert!(policy.user_agent().contains("Chrome/120"));
        assert_eq!(policy.referer(), "https://www.youtube.com/");
        assert_eq!(
            policy.player_clients(),
            &[PlayerClient::Android, PlayerClient::Web]
        );
        assert_eq!(policy.skip_formats(), &[StreamFormat::Hls, StreamFormat::Dash]);
        assert_eq!(policy.pacing().min(), Duration::from_secs(1));
        assert_eq!(policy.pacing().max(), Duration::from_secs(5));

        let names: Vec<&str> = policy.headers().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            [
                "Accept",
                "Accept-Language",
                "Accept-Encoding",
                "DNT",
                "Connection",
                "Upgrade-Insecure-Requests"
            ]
        );
    }

    #[test]
    fn bitrate_conversions() {
        assert_eq!(Bitrate::default(), Bitrate::Kbps320);
        assert_eq!(Bitrate::try_from(192), Ok(Bitrate::Kbps192));
        assert!(Bitrate::try_from(160).is_err());
        assert_eq!(u32::from(Bitrate::Kbps256), 256);
        assert_eq!(Bitrate::Kbps128.to_string(), "128");
    }

    #[test]
    fn pacing_rejects_inverted_bounds() {
        assert!(Pacing::new(Duration::from_secs(3), Duration::from_secs(3)).is_ok());
        assert!(Pacing::new(Duration::from_secs(6), Duration::from_secs(5)).is_err());
    }

    #[test]
    fn from_config_matches_build_for_defaults() {
        let policy = FetchPolicy::from_config(&FetchConfig::default(), Bitrate::Kbps192).unwrap();
        assert_eq!(policy, FetchPolicy::build(Bitrate::Kbps192));
    }

    #[test]
    fn from_config_dedups_and_validates() {
        let config = FetchConfig {
            player_clients: vec![PlayerClient::Ios, PlayerClient::Web, PlayerClient::Ios],
            skip_formats: vec![StreamFormat::Dash, StreamFormat::Dash],
            ..FetchConfig::default()
        };
        let policy = FetchPolicy::from_config(&config, Bitrate::default()).unwrap();
        assert_eq!(policy.player_clients(), &[PlayerClient::Ios, PlayerClient::Web]);
        assert_eq!(policy.skip_formats(), &[StreamFormat::Dash]);

        let empty = FetchConfig {
            player_clients: Vec::new(),
            ..FetchConfig::default()
        };
        assert!(FetchPolicy::from_config(&empty, Bitrate::default()).is_err());

        let inverted = FetchConfig {
            min_sleep_secs: 10,
            max_sleep_secs: 2,
            ..FetchConfig::default()
        };
        let err = FetchPolicy::from_config(&inverted, Bitrate::default()).unwrap_err();
        assert!(err.to_string().contains("fetch.min_sleep_secs (10)"), "{err}");

        let bad_header = FetchConfig {
            headers: vec![HeaderConfig {
                name: "X-Bad: Header".to_string(),
                value: "1".to_string(),
            }],
            ..FetchConfig::default()
        };
        assert!(FetchPolicy::from_config(&bad_header, Bitrate::default()).is_err());
    }
}
