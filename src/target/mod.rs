use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::extractors::AudioFormat;
use crate::GrabError;

/// Characters that are not allowed in output file names
pub const RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Substitute for every reserved character
pub const PLACEHOLDER: char = '_';

/// Absolute path of the audio file a run produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    path: PathBuf,
    format: AudioFormat,
}

impl OutputTarget {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// File name component, e.g. `song.mp3`
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// The target path with the format extension removed
    pub fn stem_path(&self) -> PathBuf {
        let name = self.file_name();
        let stem = name
            .strip_suffix(&format!(".{}", self.format.extension()))
            .unwrap_or(&name);
        self.path.with_file_name(stem)
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

/// Replace every reserved character with the placeholder
pub fn strip_reserved(name: &str) -> String {
    let mut out = name.to_string();
    for reserved in RESERVED_CHARS {
        out = out.replace(*reserved, &PLACEHOLDER.to_string());
    }
    out
}

/// Append the format extension if missing, then strip reserved characters.
///
/// The extension check is an exact, case-sensitive suffix match, so
/// `song.MP3` becomes `song.MP3.mp3`.
pub fn normalize_name(name: &str, format: AudioFormat) -> String {
    let suffix = format!(".{}", format.extension());
    let mut with_ext = name.to_string();
    if !with_ext.ends_with(&suffix) {
        with_ext.push_str(&suffix);
    }
    strip_reserved(&with_ext)
}

/// Turn a user supplied name into an absolute path in the working directory
pub fn normalize(name: &str, format: AudioFormat) -> Result<OutputTarget> {
    let base = std::env::current_dir().context("Failed to determine working directory")?;
    normalize_in(&base, name, format)
}

/// Like [`normalize`], but resolved against `base` instead of the working directory
pub fn normalize_in(base: &Path, name: &str, format: AudioFormat) -> Result<OutputTarget> {
    if name.trim().is_empty() {
        return Err(GrabError::InvalidOutput("output name is empty".to_string()).into());
    }

    let file_name = normalize_name(name, format);
    let stem = &file_name[..file_name.len() - format.extension().len() - 1];
    if stem.trim_matches('.').is_empty() {
        return Err(GrabError::InvalidOutput(format!(
            "{file_name:?} has no name before the extension"
        ))
        .into());
    }

    let path = std::path::absolute(base.join(&file_name))
        .with_context(|| format!("Failed to resolve output path for {file_name}"))?;

    Ok(OutputTarget { path, format })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_name(name: &str) -> String {
        normalize(name, AudioFormat::Mp3).unwrap().file_name()
    }

    #[test]
    fn replaces_reserved_characters_without_duplicating_extension() {
        assert_eq!(file_name("My/Song?.mp3"), "My_Song_.mp3");
        assert_eq!(normalize_name(r#"a<b>c:d"e\f|g*h"#, AudioFormat::Mp3), "a_b_c_d_e_f_g_h.mp3");
    }

    #[test]
    fn appends_extension_once() {
        assert_eq!(normalize_name("track", AudioFormat::Mp3), "track.mp3");
        assert_eq!(normalize_name("track.mp3", AudioFormat::Mp3), "track.mp3");
        assert_eq!(normalize_name("track.mp3.mp3", AudioFormat::Mp3), "track.mp3.mp3");
        assert_eq!(normalize_name("track.MP3", AudioFormat::Mp3), "track.MP3.mp3");
        assert_eq!(normalize_name("track", AudioFormat::Flac), "track.flac");
    }

    #[test]
    fn output_always_ends_with_extension_and_has_no_reserved_chars() {
        for name in ["plain", "x.MP3", "what?", "a/b/c", "*.mp3", "quote\"d", "song.mp3"] {
            let normalized = normalize_name(name, AudioFormat::Mp3);
            assert!(normalized.ends_with(".mp3"), "{normalized}");
            assert!(!normalized.ends_with(".mp3.mp3") || name.ends_with(".mp3.mp3"));
            assert!(!normalized.contains(RESERVED_CHARS), "{normalized}");
        }
    }

    #[test]
    fn idempotent_over_stripped_input() {
        for name in ["My/Song?.mp3", "a:b", "plain", "x|y.MP3"] {
            assert_eq!(
                normalize_name(&strip_reserved(name), AudioFormat::Mp3),
                normalize_name(name, AudioFormat::Mp3)
            );
        }
    }

    #[test]
    fn resolves_to_absolute_path() {
        let target = normalize("song", AudioFormat::Mp3).unwrap();
        assert!(target.path().is_absolute());
        assert_eq!(target.format(), AudioFormat::Mp3);
        assert_eq!(target.stem_path().file_name().unwrap(), "song");
    }

    #[cfg(unix)]
    #[test]
    fn separators_never_escape_the_base_directory() {
        let base = Path::new("/music");
        let target = normalize_in(base, "../../etc/passwd", AudioFormat::Mp3).unwrap();
        assert_eq!(target.path(), Path::new("/music/.._.._etc_passwd.mp3"));
    }

    #[test]
    fn rejects_empty_name() {
        assert!(normalize("   ", AudioFormat::Mp3).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn rejects_name_that_is_only_the_extension() {
        let base = Path::new("/music");
        for name in [".mp3", "..mp3", "...", "."] {
            assert!(normalize_in(base, name, AudioFormat::Mp3).is_err(), "{name}");
        }
    }

    #[cfg(unix)]
    #[test]
    fn stem_drops_only_the_format_extension() {
        let base = Path::new("/music");
        let target = normalize_in(base, "mix.2024", AudioFormat::Mp3).unwrap();
        assert_eq!(target.stem_path(), Path::new("/music/mix.2024"));

        let target = normalize_in(base, "song.mp3.mp3", AudioFormat::Mp3).unwrap();
        assert_eq!(target.stem_path(), Path::new("/music/song.mp3"));

        let target = normalize_in(base, ".hidden", AudioFormat::Flac).unwrap();
        assert_eq!(target.path(), Path::new("/music/.hidden.flac"));
        assert_eq!(target.stem_path(), Path::new("/music/.hidden"));
    }
}
