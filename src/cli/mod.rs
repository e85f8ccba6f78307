use clap::Parser;
use std::path::PathBuf;

use crate::policy::Bitrate;

#[derive(Parser, Debug)]
#[command(
    name = "grabstream",
    about = "Download high-quality audio from YouTube videos as MP3",
    version,
    long_about = "Extracts the audio track of a YouTube video with yt-dlp and converts it with ffmpeg. Requests are shaped to look like a regular browser and paced to avoid rate limiting.",
    after_help = "Examples:\n  grabstream \"https://www.youtube.com/watch?v=dQw4w9WgXcQ\" \"my_song.mp3\"\n  grabstream \"https://youtu.be/dQw4w9WgXcQ\" \"audio_file\" --bitrate 256"
)]
pub struct Cli {
    /// YouTube video URL
    #[arg(value_name = "URL")]
    pub url: String,

    /// Output filename (the audio extension is added if not present)
    #[arg(value_name = "OUTPUT")]
    pub output: String,

    /// Audio bitrate in kbps (default: 320, or the configured default)
    #[arg(short, long, value_enum)]
    pub bitrate: Option<Bitrate>,

    /// Overwrite an existing output file without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Path to a YAML configuration file
    #[arg(short, long, value_name = "FILE", env = "GRABSTREAM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Default log filter when `RUST_LOG` is not set
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "grabstream=debug"
        } else if self.quiet {
            "grabstream=warn"
        } else {
            "grabstream=info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_positional_arguments_and_bitrate() {
        let cli = Cli::try_parse_from(["grabstream", "https://youtu.be/abc", "song", "-b", "256"]).unwrap();
        assert_eq!(cli.url, "https://youtu.be/abc");
        assert_eq!(cli.output, "song");
        assert_eq!(cli.bitrate, Some(Bitrate::Kbps256));
        assert!(!cli.yes);
        assert_eq!(cli.log_filter(), "grabstream=info");
    }

    #[test]
    fn bitrate_is_optional_and_restricted() {
        let cli = Cli::try_parse_from(["grabstream", "u", "o"]).unwrap();
        assert_eq!(cli.bitrate, None);

        assert!(Cli::try_parse_from(["grabstream", "u", "o", "--bitrate", "160"]).is_err());
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["grabstream", "u", "o", "-v", "-q"]).is_err());
        let cli = Cli::try_parse_from(["grabstream", "u", "o", "--verbose"]).unwrap();
        assert_eq!(cli.log_filter(), "grabstream=debug");
    }
}
