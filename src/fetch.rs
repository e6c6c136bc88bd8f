use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::FetchConfig;
use crate::error::{Result, PolydubError};

/// Metadata returned alongside a fetched video.
#[derive(Debug, Clone)]
pub struct FetchedVideo {
    pub title: String,
    /// Source duration in seconds, when the downloader reports it.
    pub duration: Option<f64>,
}

/// Main trait for resolving a remote video reference into a local file.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Download the reference to `dest` as a single playable file containing
    /// both video and audio streams. On failure no file is left at `dest`.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<FetchedVideo>;
}

/// Factory for creating source fetcher instances
pub struct FetcherFactory;

impl FetcherFactory {
    pub fn create_fetcher(config: FetchConfig) -> std::sync::Arc<dyn SourceFetcher> {
        std::sync::Arc::new(YtDlpFetcher::new(config))
    }
}

#[derive(Deserialize)]
struct DownloaderInfo {
    title: Option<String>,
    duration: Option<f64>,
}

/// yt-dlp based fetcher. Metadata and download are two separate invocations;
/// the download goes to a temp name and is renamed into place so a failed run
/// never leaves a partial file at the destination.
pub struct YtDlpFetcher {
    config: FetchConfig,
}

impl YtDlpFetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    async fn probe_metadata(&self, url: &str) -> Result<DownloaderInfo> {
        let output = Command::new(&self.config.binary_path)
            .args(["--dump-json", "--no-download", "--no-playlist"])
            .arg(url)
            .output()
            .await
            .map_err(|e| PolydubError::Fetch(format!("Failed to execute downloader: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PolydubError::Fetch(format!(
                "Metadata probe failed: {}",
                truncate(&stderr, 1000)
            )));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| PolydubError::Fetch(format!("Failed to parse downloader metadata: {}", e)))
    }
}

#[async_trait]
impl SourceFetcher for YtDlpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<FetchedVideo> {
        validate_url(url)?;

        info!("Fetching source video from {}", url);

        let info = self.probe_metadata(url).await?;

        // Download next to the destination, then rename into place.
        let temp_path = dest.with_extension("part.mp4");
        let temp_str = temp_path
            .to_str()
            .ok_or_else(|| PolydubError::Fetch("destination path is not valid UTF-8".to_string()))?
            .to_string();

        let output = Command::new(&self.config.binary_path)
            .args([
                "--format",
                self.config.format.as_str(),
                "--merge-output-format",
                "mp4",
                "--no-playlist",
                "--no-exec",
                "--output",
                temp_str.as_str(),
            ])
            .arg(url)
            .output()
            .await
            .map_err(|e| PolydubError::Fetch(format!("Failed to execute downloader: {}", e)))?;

        if !output.status.success() {
            let _ = tokio::fs::remove_file(&temp_path).await;
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PolydubError::Fetch(format!(
                "Download failed: {}",
                truncate(&stderr, 1000)
            )));
        }

        if !temp_path.exists() {
            return Err(PolydubError::Fetch(
                "downloader reported success but produced no file".to_string(),
            ));
        }

        tokio::fs::rename(&temp_path, dest).await.map_err(|e| {
            PolydubError::Fetch(format!("Failed to move downloaded file into place: {}", e))
        })?;

        debug!("Fetched video to {}", dest.display());

        Ok(FetchedVideo {
            title: info.title.unwrap_or_else(|| "video".to_string()),
            duration: info.duration,
        })
    }
}

/// Reject anything that isn't an http:// or https:// reference before a
/// subprocess ever sees it.
pub fn validate_url(url: &str) -> Result<()> {
    let trimmed = url.trim();
    if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        Ok(())
    } else {
        Err(PolydubError::Validation(format!(
            "invalid source URL (must start with http:// or https://): {}",
            trimmed
        )))
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
