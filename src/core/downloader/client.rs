use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::integrity::verify_file;
use crate::core::error::{FetchError, FetchResult};
use crate::core::http::build_http_client;
use crate::core::version::LibDownloadArtifact;

/// Anything that can place a verified artifact at a destination.
///
/// The manifest processor only talks to this trait, one artifact at a time.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    async fn fetch(&self, artifact: &LibDownloadArtifact, dest: &Path) -> FetchResult<()>;
}

/// Sequential, SHA-1 validated downloader.
pub struct Downloader {
    client: Client,
    /// Suppresses per-file progress lines.
    quiet: bool,
}

impl Downloader {
    pub fn new(quiet: bool) -> FetchResult<Self> {
        Ok(Self::with_client(build_http_client()?, quiet))
    }

    pub fn with_client(client: Client, quiet: bool) -> Self {
        Self { client, quiet }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    // ── Single file transfer ────────────────────────────

    /// GET `url` and write the whole body to `dest`, truncating it.
    ///
    /// Creates parent directories as needed. Returns the absolute destination.
    pub async fn download_file(&self, url: &str, dest: &Path) -> FetchResult<PathBuf> {
        let dest = std::path::absolute(dest).map_err(FetchError::io(dest))?;

        if !self.quiet {
            info!("Downloading {}...", url.rsplit('/').next().unwrap_or(url));
        }

        // Ensure parent dir exists
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(FetchError::io(parent))?;
        }

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // Write inside a block so the handle is closed before verification reads it
        {
            let mut file = tokio::fs::File::create(&dest)
                .await
                .map_err(FetchError::io(&dest))?;

            let mut body = response.bytes_stream();
            while let Some(chunk) = body.next().await {
                file.write_all(&chunk?)
                    .await
                    .map_err(FetchError::io(&dest))?;
            }
            file.flush().await.map_err(FetchError::io(&dest))?;
        }

        debug!("Downloaded: {} -> {:?}", url, dest);
        Ok(dest)
    }

    /// Download `url` to `dest` and verify it against `sha1` and `size`.
    pub async fn fetch_verified(
        &self,
        url: &str,
        sha1: &str,
        size: u64,
        dest: &Path,
    ) -> FetchResult<()> {
        let written = self.download_file(url, dest).await?;
        verify_file(&written, sha1, size).await
    }
}

#[async_trait]
impl ArtifactFetcher for Downloader {
    async fn fetch(&self, artifact: &LibDownloadArtifact, dest: &Path) -> FetchResult<()> {
        self.fetch_verified(&artifact.url, &artifact.sha1, artifact.size, dest)
            .await
    }
}
