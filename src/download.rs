use crate::config::USER_AGENT;
use async_trait::async_trait;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::StatusCode;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server responded with {0}")]
    Status(StatusCode),
    #[error("could not write download: {0}")]
    Io(#[from] io::Error),
}

/// Fetches a remote artifact into a local directory.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Downloads `url` into `dest_dir` and returns the path of the file.
    async fn download(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, DownloadError>;
}

pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, DownloadError> {
        let local_path = dest_dir.join(file_name_from_url(url));
        download_file(&self.client, url, &local_path).await?;
        Ok(local_path)
    }
}

pub fn file_name_from_url(url: &str) -> String {
    url.split(['?', '#'])
        .next()
        .and_then(|u| u.rsplit('/').find(|segment| !segment.is_empty()))
        .unwrap_or("download")
        .to_string()
}

pub async fn download_file(
    client: &reqwest::Client,
    url: &str,
    local_path: &Path,
) -> Result<(), DownloadError> {
    tracing::info!("Downloading {}...", url);

    let response = client
        .get(url)
        .header("User-Agent", USER_AGENT)
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(DownloadError::Status(response.status()));
    }

    let total_size = response.content_length().unwrap_or(0);
    let pb = ProgressBar::new(total_size);
    let style = ProgressStyle::default_bar()
        .template("{msg} {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_message(format!("Downloading {}", file_name_from_url(url)));

    let mut file = fs::File::create(local_path).await?;
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }
    file.flush().await?;

    pb.finish_with_message("Download complete");
    tracing::debug!("Downloaded {} bytes to {}", downloaded, local_path.display());
    Ok(())
}
