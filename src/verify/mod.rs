use crate::download::{DownloadOutcome, ErrorKind};
use crate::target::OutputTarget;

/// Confirm the artifact exists and report its size.
///
/// The transcoder can exit cleanly without writing anything, so a run is
/// only successful once the file is actually on disk.
pub async fn verify(target: &OutputTarget) -> DownloadOutcome {
    match tokio::fs::metadata(target.path()).await {
        Ok(metadata) if metadata.is_file() => {
            let size = metadata.len();
            if size == 0 {
                tracing::warn!("Output file {} is empty", target.path().display());
            }
            DownloadOutcome::Success {
                path: target.path().to_path_buf(),
                size,
            }
        }
        Ok(_) => DownloadOutcome::failure(
            ErrorKind::ArtifactMissing,
            format!("{} is not a regular file", target.path().display()),
        ),
        Err(e) => {
            tracing::debug!("Output file {} not found: {}", target.path().display(), e);
            DownloadOutcome::failure(ErrorKind::ArtifactMissing, "output file was not created")
        }
    }
}
