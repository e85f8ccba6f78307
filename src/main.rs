use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use grabstream::extractors::youtube::YtDlpExtractor;
use grabstream::output::{print_error, Reporter};
use grabstream::transcode::Transcoder;
use grabstream::{
    target, Cli, Config, DownloadOutcome, Downloader, ErrorKind, FetchPolicy, OutputTarget,
    Preconditions, SourceLocator,
};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let locator = match SourceLocator::parse(&cli.url) {
        Ok(locator) => locator,
        Err(e) => {
            let outcome = DownloadOutcome::failure(ErrorKind::InvalidSource, e.to_string());
            tracing::debug!("{:?}", outcome);
            print_error(
                "Please provide a valid YouTube URL",
                &[
                    "Supported formats:",
                    "- https://www.youtube.com/watch?v=VIDEO_ID",
                    "- https://youtu.be/VIDEO_ID",
                ],
            );
            return Ok(ExitCode::from(outcome.exit_code()));
        }
    };
    tracing::debug!(
        "Accepted {} (host: {})",
        locator,
        locator.host().as_deref().unwrap_or("unknown")
    );

    let config = Config::load(cli.config.as_deref())?;
    let target = target::normalize(&cli.output, config.audio.format)?;
    let reporter = Reporter::new(cli.quiet);

    let overwrite_confirmed = if target.exists() && !cli.yes {
        if !confirm_overwrite(&target)? {
            println!("Operation cancelled.");
            return Ok(ExitCode::SUCCESS);
        }
        true
    } else {
        cli.yes
    };

    let transcoder = Transcoder::new(&config.tools.ffmpeg);
    if !transcoder.is_available().await {
        print_error(
            &format!(
                "{} is required but not found in PATH",
                transcoder.program().display()
            ),
            &[
                "Please install ffmpeg:",
                "- macOS: brew install ffmpeg",
                "- Ubuntu/Debian: sudo apt install ffmpeg",
                "- Windows: Download from https://ffmpeg.org/download.html",
            ],
        );
        return Ok(ExitCode::FAILURE);
    }

    let bitrate = cli.bitrate.unwrap_or(config.audio.default_bitrate);
    let policy = FetchPolicy::from_config(&config.fetch, bitrate)?;

    let extractor = YtDlpExtractor::new()
        .with_binary(&config.tools.yt_dlp)
        .with_ffmpeg_location(config.tools.ffmpeg_location.clone());
    if !extractor.check_availability().await {
        tracing::warn!(
            "{} did not answer --version; the download will likely fail",
            config.tools.yt_dlp.display()
        );
    }

    reporter.banner(&locator, &target, bitrate);

    let downloader = Downloader::new(extractor)
        .with_sample_rate(config.audio.sample_rate)
        .with_reporter(reporter);
    let preconditions = Preconditions {
        overwrite_confirmed,
        transcoder_available: true,
    };

    let outcome = downloader.run(&locator, &target, &policy, preconditions).await;
    reporter.outcome(&outcome);

    Ok(ExitCode::from(outcome.exit_code()))
}

/// Ask before replacing an existing file; only `y` or `yes` confirms
fn confirm_overwrite(target: &OutputTarget) -> Result<bool> {
    let term = console::Term::stderr();
    term.write_str(&format!(
        "⚠️  File '{}' already exists. Overwrite? (y/N): ",
        target.file_name()
    ))?;
    let response = term.read_line()?;
    Ok(matches!(response.trim().to_lowercase().as_str(), "y" | "yes"))
}
