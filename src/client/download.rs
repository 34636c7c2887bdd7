//! Image download to a local directory.

use crate::client::notify::{Notification, Notifier};
use futures_util::StreamExt;
use reqwest::Client;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("failed to fetch image: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("image request returned status {0}")]
    Status(u16),
    #[error("failed to write image: {0}")]
    Io(#[from] std::io::Error),
}

/// File name used for downloads, `ai-image-<unix millis>.png`
pub fn download_file_name() -> String {
    format!("ai-image-{}.png", chrono::Utc::now().timestamp_millis())
}

/// Stream `image_url` into `dir`, returning the written path
pub async fn download_image(client: &Client, image_url: &str, dir: &Path) -> Result<PathBuf, DownloadError> {
    let response = client.get(image_url).send().await?;
    if !response.status().is_success() {
        return Err(DownloadError::Status(response.status().as_u16()));
    }

    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(download_file_name());

    if let Err(e) = write_body(response, &path).await {
        // No partial files left behind
        if let Err(remove_error) = tokio::fs::remove_file(&path).await {
            tracing::debug!(path = %path.display(), error = %remove_error, "failed to remove partial download");
        }
        return Err(e);
    }

    tracing::debug!(%image_url, path = %path.display(), "image downloaded");
    Ok(path)
}

async fn write_body(response: reqwest::Response, path: &Path) -> Result<(), DownloadError> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        file.write_all(&chunk?).await?;
    }
    file.flush().await?;
    Ok(())
}

/// Download and report the outcome as a notification
pub async fn download_and_notify(
    client: &Client,
    image_url: &str,
    dir: &Path,
    notifier: &Notifier,
) -> Option<PathBuf> {
    match download_image(client, image_url, dir).await {
        Ok(path) => {
            notifier.notify(Notification::success("Success", "Image downloaded successfully"));
            Some(path)
        }
        Err(e) => {
            tracing::warn!(%image_url, error = %e, "download failed");
            notifier.notify(Notification::error("Failed to download image"));
            None
        }
    }
}
