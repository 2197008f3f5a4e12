use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{debug, info};

use crate::core::cleanup::clean_tree;
use crate::core::config::FetchConfig;
use crate::core::downloader::{verify_sha1, Downloader};
use crate::core::error::{FetchError, FetchResult};
use crate::core::libraries::{FetchSummary, LibraryProcessor};
use crate::core::platform::Platform;
use crate::core::version::{VersionJson, VersionManifest, VERSION_MANIFEST_URL};

/// Download and verify the libraries a Minecraft version JSON declares.
#[derive(Debug, Parser)]
#[command(name = "mclibs")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Version id; reads `<VERSION>.json` and writes natives to `<VERSION>-natives`
    #[arg(id = "version_id", value_name = "VERSION")]
    pub version: String,

    /// Working tree holding the version JSON and receiving the libraries
    #[arg(short = 'C', long = "dir", default_value = ".")]
    pub root: PathBuf,

    /// Suppress progress output and network error diagnostics
    #[arg(short, long)]
    pub quiet: bool,

    /// Delete every .jar and every subdirectory of the working tree first
    #[arg(long)]
    pub clean: bool,

    /// Fetch for this platform instead of the host's
    #[arg(long, value_enum)]
    pub platform: Option<Platform>,

    /// Keep destinations that already match their size and SHA-1
    #[arg(long)]
    pub skip_existing: bool,

    /// Resolve destinations and log them without downloading
    #[arg(long)]
    pub dry_run: bool,

    /// Download the version JSON from the version index when it is missing
    #[arg(long)]
    pub fetch_manifest: bool,

    /// Version index used by --fetch-manifest
    #[arg(long, default_value = VERSION_MANIFEST_URL)]
    pub manifest_url: String,
}

impl Cli {
    pub fn into_config(self) -> FetchConfig {
        FetchConfig {
            version: self.version,
            root: self.root,
            quiet: self.quiet,
            clean: self.clean,
            platform: self.platform,
            skip_existing: self.skip_existing,
            dry_run: self.dry_run,
            fetch_manifest: self.fetch_manifest,
            manifest_index_url: self.manifest_url,
        }
    }
}

/// One full run: cleanup, manifest load, library fetch.
pub async fn fetch_libraries(config: &FetchConfig) -> FetchResult<FetchSummary> {
    let downloader = Downloader::new(config.quiet)?;
    fetch_libraries_with(config, &downloader).await
}

/// Same as [`fetch_libraries`] with a caller-supplied downloader.
pub async fn fetch_libraries_with(
    config: &FetchConfig,
    downloader: &Downloader,
) -> FetchResult<FetchSummary> {
    let platform = match config.platform {
        Some(platform) => platform,
        None => Platform::detect()?,
    };
    match serde_json::to_string(config) {
        Ok(json) => debug!("Configuration: {json}"),
        Err(err) => debug!("Configuration not serializable: {err}"),
    }
    info!("Fetching libraries for {} on {}", config.version, platform);

    if config.clean && !config.dry_run {
        clean_tree(&config.root).await?;
    }

    let manifest_path = config.manifest_path();
    // A dry run touches neither the network nor the tree, so it never
    // fetches the version JSON either.
    if config.fetch_manifest && !config.dry_run && !exists(&manifest_path).await? {
        fetch_version_json(config, downloader, &manifest_path).await?;
    }

    let version = VersionJson::load(&manifest_path).await?;

    LibraryProcessor::new(downloader, platform, config)
        .process(&version)
        .await
}

async fn fetch_version_json(
    config: &FetchConfig,
    downloader: &Downloader,
    dest: &Path,
) -> FetchResult<()> {
    let index = VersionManifest::fetch(downloader.client(), &config.manifest_index_url).await?;
    let entry = index.find_version(&config.version)?;

    let written = downloader.download_file(&entry.url, dest).await?;
    if let Some(sha1) = &entry.sha1 {
        verify_sha1(&written, sha1).await?;
    }

    info!("Saved version JSON for {} to {:?}", entry.id, written);
    Ok(())
}

async fn exists(path: &Path) -> FetchResult<bool> {
    tokio::fs::try_exists(path)
        .await
        .map_err(FetchError::io(path))
}
