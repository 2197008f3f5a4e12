use std::path::PathBuf;

use serde::Serialize;

use crate::core::platform::Platform;
use crate::core::version::VERSION_MANIFEST_URL;

/// Everything a run needs to know, built once from the command line and
/// handed to each step.
#[derive(Debug, Clone, Serialize)]
pub struct FetchConfig {
    /// Version id; names `<version>.json` and `<version>-natives`.
    pub version: String,
    /// Working tree the manifest lives in and artifacts land under.
    pub root: PathBuf,
    pub quiet: bool,
    /// Wipe archives and subdirectories of `root` before fetching.
    pub clean: bool,
    /// Overrides host detection when set.
    pub platform: Option<Platform>,
    pub skip_existing: bool,
    pub dry_run: bool,
    pub fetch_manifest: bool,
    pub manifest_index_url: String,
}

impl FetchConfig {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            root: PathBuf::from("."),
            quiet: false,
            clean: false,
            platform: None,
            skip_existing: false,
            dry_run: false,
            fetch_manifest: false,
            manifest_index_url: VERSION_MANIFEST_URL.to_string(),
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(format!("{}.json", self.version))
    }

    pub fn natives_dir(&self) -> PathBuf {
        self.root.join(format!("{}-natives", self.version))
    }
}
