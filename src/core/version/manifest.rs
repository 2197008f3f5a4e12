// ─── Version Index ───
// Locates a version JSON through the Mojang version manifest v2.

use serde::Deserialize;
use tracing::info;

use crate::core::error::{FetchError, FetchResult};

pub const VERSION_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";

/// Top-level version index.
#[derive(Debug, Deserialize)]
pub struct VersionManifest {
    pub versions: Vec<VersionEntry>,
}

/// A single entry in the index.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub version_type: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
}

impl VersionManifest {
    /// Fetch the version index from `url`.
    pub async fn fetch(client: &reqwest::Client, url: &str) -> FetchResult<Self> {
        info!("Fetching version index from {url}");

        let response = client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let manifest: VersionManifest = response.json().await?;
        info!("Loaded {} versions from index", manifest.versions.len());
        Ok(manifest)
    }

    /// Find a specific version entry by ID (e.g. "1.20.4").
    pub fn find_version(&self, id: &str) -> FetchResult<&VersionEntry> {
        self.versions
            .iter()
            .find(|v| v.id == id)
            .ok_or_else(|| FetchError::VersionNotFound(id.to_string()))
    }
}
