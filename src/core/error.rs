use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the fetcher.
/// Every module returns `Result<T, FetchError>`; the first one ends the run.
#[derive(Debug, Error)]
pub enum FetchError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── Integrity ───────────────────────────────────────
    #[error("Size error for {path:?}, {actual}!={expected}")]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("Checksum error for {path:?}, {actual}!={expected}")]
    Sha1Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── Manifest shape ──────────────────────────────────
    #[error("Failed to parse manifest {path:?}: {source}")]
    ManifestParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Natives not found in {natives} for platform {platform}")]
    MissingNativePlatform { natives: String, platform: String },

    #[error("Missing classifiers key for {library}")]
    MissingClassifiers { library: String },

    #[error("Missing native key {classifier} for classifiers {available:?} of {library}")]
    MissingClassifier {
        library: String,
        classifier: String,
        available: Vec<String>,
    },

    #[error("Missing downloads section for {library}")]
    MissingDownloads { library: String },

    #[error("Missing default artifact for {library}")]
    MissingArtifact { library: String },

    #[error("Artifact path {path:?} of {library} has no file name")]
    InvalidArtifactPath { library: String, path: String },

    #[error("Version {0} not found in version index")]
    VersionNotFound(String),

    // ── Platform ────────────────────────────────────────
    #[error("Platform is invalid: {0}")]
    UnsupportedPlatform(String),

    // ── Cleanup ─────────────────────────────────────────
    #[error("Invalid cleanup pattern {pattern}: {source}")]
    CleanupPattern {
        pattern: String,
        source: glob::PatternError,
    },

    // ── Runtime ─────────────────────────────────────────
    #[error("Failed to start async runtime: {0}")]
    Runtime(std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type FetchResult<T> = Result<T, FetchError>;

impl FetchError {
    /// Transfer failures, the diagnostics quiet mode suppresses.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Http(_) | Self::DownloadFailed { .. })
    }

    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::SizeMismatch { .. } | Self::Sha1Mismatch { .. })
    }

    /// Adapter for `map_err` that attaches the failing path.
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
