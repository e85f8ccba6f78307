use std::fmt;

use crate::GrabError;

/// Host fragments a locator must contain to be accepted
pub const ACCEPTED_HOSTS: &[&str] = &[
    "youtube.com",
    "youtu.be",
    "www.youtube.com",
    "m.youtube.com",
];

/// Check whether a locator looks like a YouTube URL.
///
/// This is a coarse, case-insensitive substring check with no network access.
/// A locator that passes may still fail later if the video does not exist.
pub fn validate(locator: &str) -> bool {
    let lower = locator.to_lowercase();
    ACCEPTED_HOSTS.iter().any(|host| lower.contains(host))
}

/// A validated reference to a remote video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocator(String);

impl SourceLocator {
    /// Accept a locator only if it passes [`validate`]
    pub fn parse(locator: &str) -> Result<Self, GrabError> {
        let trimmed = locator.trim();
        if validate(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(GrabError::InvalidSource(locator.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Host of the locator for display, if it parses as a URL
    pub fn host(&self) -> Option<String> {
        crate::utils::extract_domain(&self.0)
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SourceLocator {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_hosts_in_any_case() {
        assert!(validate("https://YOUTU.BE/abc"));
        assert!(validate("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(validate("https://m.YouTube.com/watch?v=dQw4w9WgXcQ"));
        assert!(validate("youtube.com/shorts/xyz"));
    }

    #[test]
    fn rejects_other_hosts_and_garbage() {
        assert!(!validate("https://vimeo.com/abc"));
        assert!(!validate(""));
        assert!(!validate("not a url at all"));
        assert!(!validate("https://youtube.co/abc"));
    }

    #[test]
    fn parse_wraps_validation() {
        let locator = SourceLocator::parse("  https://youtu.be/abc ").unwrap();
        assert_eq!(locator.as_str(), "https://youtu.be/abc");
        assert_eq!(locator.host(), Some("youtu.be".to_string()));

        let err = SourceLocator::parse("https://vimeo.com/abc").unwrap_err();
        assert!(matches!(err, GrabError::InvalidSource(ref s) if s == "https://vimeo.com/abc"));
    }

    #[test]
    fn host_is_none_for_bare_strings() {
        let locator = SourceLocator::parse("youtube.com/watch?v=1").unwrap();
        assert_eq!(locator.host(), None);
    }
}
