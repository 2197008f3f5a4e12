// ─── Library Processor ───
// Walks the libraries of a version JSON, applies OS rules, picks the
// artifact for the current platform and decides where it lands on disk.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::core::config::FetchConfig;
use crate::core::downloader::{verify_file, ArtifactFetcher};
use crate::core::error::{FetchError, FetchResult};
use crate::core::platform::Platform;
use crate::core::version::{LibDownloadArtifact, LibraryEntry, VersionJson};

/// Marker that routes a default artifact into the natives directory.
const NATIVES_MARKER: &str = "natives";

/// The one artifact an included library resolves to, and its destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryTarget<'a> {
    pub library: &'a str,
    pub artifact: &'a LibDownloadArtifact,
    pub dest: PathBuf,
}

/// Counts reported at the end of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FetchSummary {
    pub libraries: usize,
    pub skipped_by_rules: usize,
    pub downloaded: usize,
    pub already_present: usize,
    pub planned: usize,
}

/// Resolve `lib` for `platform`.
///
/// `Ok(None)` means the library's rules exclude it. Every shape problem in
/// the entry is an error.
pub fn resolve_target<'a>(
    lib: &'a LibraryEntry,
    platform: Platform,
    root: &Path,
    natives_dir: &Path,
) -> FetchResult<Option<LibraryTarget<'a>>> {
    if !lib.is_allowed_for(platform) {
        return Ok(None);
    }

    let classifier = lib.native_classifier_for(platform)?;

    let downloads = lib
        .downloads
        .as_ref()
        .ok_or_else(|| FetchError::MissingDownloads {
            library: lib.name.clone(),
        })?;

    let target = match classifier {
        Some(classifier) => {
            let classifiers =
                downloads
                    .classifiers
                    .as_ref()
                    .ok_or_else(|| FetchError::MissingClassifiers {
                        library: lib.name.clone(),
                    })?;

            let artifact =
                classifiers
                    .get(&classifier)
                    .ok_or_else(|| FetchError::MissingClassifier {
                        library: lib.name.clone(),
                        classifier: classifier.clone(),
                        available: classifiers.keys().cloned().collect(),
                    })?;

            LibraryTarget {
                library: &lib.name,
                artifact,
                dest: native_dest(lib, artifact, natives_dir)?,
            }
        }
        None => {
            let artifact =
                downloads
                    .artifact
                    .as_ref()
                    .ok_or_else(|| FetchError::MissingArtifact {
                        library: lib.name.clone(),
                    })?;

            let dest = if artifact.path.contains(NATIVES_MARKER) {
                native_dest(lib, artifact, natives_dir)?
            } else {
                root.join(&artifact.path)
            };

            LibraryTarget {
                library: &lib.name,
                artifact,
                dest,
            }
        }
    };

    Ok(Some(target))
}

/// Natives are flattened: only the file name of the declared path is kept.
fn native_dest(
    lib: &LibraryEntry,
    artifact: &LibDownloadArtifact,
    natives_dir: &Path,
) -> FetchResult<PathBuf> {
    let file_name = artifact
        .file_name()
        .ok_or_else(|| FetchError::InvalidArtifactPath {
            library: lib.name.clone(),
            path: artifact.path.clone(),
        })?;
    Ok(natives_dir.join(file_name))
}

/// Drives one fetch per included library, in declaration order.
pub struct LibraryProcessor<'a> {
    fetcher: &'a dyn ArtifactFetcher,
    platform: Platform,
    root: PathBuf,
    natives_dir: PathBuf,
    skip_existing: bool,
    dry_run: bool,
}

impl<'a> LibraryProcessor<'a> {
    pub fn new(fetcher: &'a dyn ArtifactFetcher, platform: Platform, config: &FetchConfig) -> Self {
        Self {
            fetcher,
            platform,
            root: config.root.clone(),
            natives_dir: config.natives_dir(),
            skip_existing: config.skip_existing,
            dry_run: config.dry_run,
        }
    }

    /// Resolve and fetch every library. Stops at the first error; files
    /// already written stay on disk.
    pub async fn process(&self, version: &VersionJson) -> FetchResult<FetchSummary> {
        let mut summary = FetchSummary {
            libraries: version.libraries.len(),
            ..FetchSummary::default()
        };

        for lib in &version.libraries {
            let Some(target) = resolve_target(lib, self.platform, &self.root, &self.natives_dir)?
            else {
                debug!("Skipping library (OS rule): {}", lib.name);
                summary.skipped_by_rules += 1;
                continue;
            };

            if self.dry_run {
                info!(
                    "Would download {} -> {:?}",
                    target.artifact.url, target.dest
                );
                summary.planned += 1;
                continue;
            }

            if self.skip_existing && self.already_present(&target).await? {
                debug!("Already present: {:?}", target.dest);
                summary.already_present += 1;
                continue;
            }

            self.fetcher.fetch(target.artifact, &target.dest).await?;
            summary.downloaded += 1;
        }

        info!(
            "Processed {} libraries ({} downloaded, {} already present, {} skipped by rules)",
            summary.libraries, summary.downloaded, summary.already_present, summary.skipped_by_rules
        );
        Ok(summary)
    }

    async fn already_present(&self, target: &LibraryTarget<'_>) -> FetchResult<bool> {
        let exists = tokio::fs::try_exists(&target.dest)
            .await
            .map_err(FetchError::io(&target.dest))?;
        if !exists {
            return Ok(false);
        }

        match verify_file(&target.dest, &target.artifact.sha1, target.artifact.size).await {
            Ok(()) => Ok(true),
            Err(err) if err.is_integrity() => {
                debug!("Re-downloading {}: {}", target.library, err);
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use sha1::{Digest, Sha1};

    use super::*;

    /// Records requested fetches; optionally fails on one URL.
    #[derive(Default)]
    struct RecordingFetcher {
        calls: Mutex<Vec<(String, PathBuf)>>,
        fail_url: Option<String>,
    }

    impl RecordingFetcher {
        fn failing_on(url: &str) -> Self {
            Self {
                fail_url: Some(url.to_string()),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<(String, PathBuf)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ArtifactFetcher for RecordingFetcher {
        async fn fetch(&self, artifact: &LibDownloadArtifact, dest: &Path) -> FetchResult<()> {
            self.calls
                .lock()
                .unwrap()
                .push((artifact.url.clone(), dest.to_path_buf()));

            if self.fail_url.as_deref() == Some(artifact.url.as_str()) {
                return Err(FetchError::Sha1Mismatch {
                    path: dest.to_path_buf(),
                    expected: artifact.sha1.clone(),
                    actual: "0000000000000000000000000000000000000000".into(),
                });
            }
            Ok(())
        }
    }

    fn artifact(path: &str, url: &str) -> serde_json::Value {
        serde_json::json!({
            "path": path,
            "sha1": "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed",
            "size": 11,
            "url": url
        })
    }

    fn version(libraries: serde_json::Value) -> VersionJson {
        serde_json::from_value(serde_json::json!({ "id": "1.12.2", "libraries": libraries }))
            .unwrap()
    }

    fn config(root: &Path) -> FetchConfig {
        let mut config = FetchConfig::new("1.12.2");
        config.root = root.to_path_buf();
        config
    }

    #[tokio::test]
    async fn allow_rule_for_other_platform_skips_entry() {
        let version = version(serde_json::json!([{
            "name": "ca.weblite:java-objc-bridge:1.0.0",
            "rules": [{"action": "allow", "os": {"name": "linux"}}],
            "downloads": {"artifact": artifact("ca/weblite/bridge.jar", "https://x/bridge.jar")}
        }]));
        let fetcher = RecordingFetcher::default();
        let config = config(Path::new("/stage"));

        let summary = LibraryProcessor::new(&fetcher, Platform::Windows, &config)
            .process(&version)
            .await
            .unwrap();

        assert!(fetcher.calls().is_empty());
        assert_eq!(summary.skipped_by_rules, 1);
        assert_eq!(summary.downloaded, 0);
    }

    #[tokio::test]
    async fn native_classifier_lands_in_natives_dir() {
        let version = version(serde_json::json!([{
            "name": "org.lwjgl.lwjgl:lwjgl-platform:2.9.4",
            "natives": {"windows": "natives-windows"},
            "downloads": {
                "artifact": artifact("org/lwjgl/lwjgl-platform.jar", "https://x/platform.jar"),
                "classifiers": {
                    "natives-windows": artifact(
                        "org/lwjgl/lwjgl-platform-natives-windows.jar",
                        "https://x/natives-windows.jar"
                    )
                }
            }
        }]));
        let fetcher = RecordingFetcher::default();
        let config = config(Path::new("/stage"));

        LibraryProcessor::new(&fetcher, Platform::Windows, &config)
            .process(&version)
            .await
            .unwrap();

        assert_eq!(
            fetcher.calls(),
            vec![(
                "https://x/natives-windows.jar".to_string(),
                Path::new("/stage")
                    .join("1.12.2-natives")
                    .join("lwjgl-platform-natives-windows.jar")
            )]
        );
    }

    #[tokio::test]
    async fn default_artifact_keeps_declared_path() {
        let version = version(serde_json::json!([{
            "name": "foo:bar:1",
            "downloads": {"artifact": artifact("foo/bar.jar", "https://x/bar.jar")}
        }]));
        let fetcher = RecordingFetcher::default();
        let config = config(Path::new("/stage"));

        LibraryProcessor::new(&fetcher, Platform::Linux, &config)
            .process(&version)
            .await
            .unwrap();

        assert_eq!(
            fetcher.calls(),
            vec![(
                "https://x/bar.jar".to_string(),
                Path::new("/stage").join("foo/bar.jar")
            )]
        );
    }

    #[test]
    fn default_artifact_with_natives_in_path_is_flattened() {
        let lib: LibraryEntry = serde_json::from_value(serde_json::json!({
            "name": "org.lwjgl:lwjgl:3.3.1:natives-linux",
            "downloads": {
                "artifact": artifact(
                    "org/lwjgl/lwjgl/3.3.1/lwjgl-3.3.1-natives-linux.jar",
                    "https://x/lwjgl-natives.jar"
                )
            }
        }))
        .unwrap();

        let target = resolve_target(&lib, Platform::Linux, Path::new("r"), Path::new("r/n"))
            .unwrap()
            .unwrap();
        assert_eq!(target.dest, Path::new("r/n").join("lwjgl-3.3.1-natives-linux.jar"));
    }

    #[tokio::test]
    async fn first_failure_stops_processing() {
        let version = version(serde_json::json!([
            {"name": "a:a:1", "downloads": {"artifact": artifact("a/a.jar", "https://x/a.jar")}},
            {"name": "b:b:1", "downloads": {"artifact": artifact("b/b.jar", "https://x/b.jar")}},
            {"name": "c:c:1", "downloads": {"artifact": artifact("c/c.jar", "https://x/c.jar")}}
        ]));
        let fetcher = RecordingFetcher::failing_on("https://x/b.jar");
        let config = config(Path::new("/stage"));

        let err = LibraryProcessor::new(&fetcher, Platform::Linux, &config)
            .process(&version)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Sha1Mismatch { .. }));
        let urls: Vec<_> = fetcher.calls().into_iter().map(|(url, _)| url).collect();
        assert_eq!(urls, vec!["https://x/a.jar", "https://x/b.jar"]);
    }

    #[test]
    fn missing_classifiers_section_is_fatal() {
        let lib: LibraryEntry = serde_json::from_value(serde_json::json!({
            "name": "org.lwjgl:jinput-platform:2.0.5",
            "natives": {"linux": "natives-linux"},
            "downloads": {"artifact": artifact("a.jar", "https://x/a.jar")}
        }))
        .unwrap();

        let err = resolve_target(&lib, Platform::Linux, Path::new("."), Path::new("n"))
            .unwrap_err();
        assert!(matches!(err, FetchError::MissingClassifiers { ref library } if library == "org.lwjgl:jinput-platform:2.0.5"));
    }

    #[test]
    fn missing_classifier_key_is_fatal() {
        let lib: LibraryEntry = serde_json::from_value(serde_json::json!({
            "name": "org.lwjgl:jinput-platform:2.0.5",
            "natives": {"linux": "natives-linux"},
            "downloads": {
                "classifiers": {"natives-osx": artifact("osx.jar", "https://x/osx.jar")}
            }
        }))
        .unwrap();

        let err = resolve_target(&lib, Platform::Linux, Path::new("."), Path::new("n"))
            .unwrap_err();
        match err {
            FetchError::MissingClassifier {
                classifier,
                available,
                ..
            } => {
                assert_eq!(classifier, "natives-linux");
                assert_eq!(available, vec!["natives-osx".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn natives_without_platform_key_is_fatal() {
        let lib: LibraryEntry = serde_json::from_value(serde_json::json!({
            "name": "a:b:1",
            "natives": {"windows": "natives-windows"},
            "downloads": {}
        }))
        .unwrap();

        let err = resolve_target(&lib, Platform::Osx, Path::new("."), Path::new("n"))
            .unwrap_err();
        assert!(matches!(err, FetchError::MissingNativePlatform { .. }));
    }

    #[test]
    fn missing_downloads_or_artifact_is_fatal() {
        let no_downloads: LibraryEntry =
            serde_json::from_value(serde_json::json!({"name": "a:b:1"})).unwrap();
        assert!(matches!(
            resolve_target(&no_downloads, Platform::Linux, Path::new("."), Path::new("n")),
            Err(FetchError::MissingDownloads { .. })
        ));

        let no_artifact: LibraryEntry =
            serde_json::from_value(serde_json::json!({"name": "a:b:1", "downloads": {}}))
                .unwrap();
        assert!(matches!(
            resolve_target(&no_artifact, Platform::Linux, Path::new("."), Path::new("n")),
            Err(FetchError::MissingArtifact { .. })
        ));
    }

    #[tokio::test]
    async fn dry_run_fetches_nothing() {
        let version = version(serde_json::json!([
            {"name": "a:a:1", "downloads": {"artifact": artifact("a/a.jar", "https://x/a.jar")}}
        ]));
        let fetcher = RecordingFetcher::default();
        let mut config = config(Path::new("/stage"));
        config.dry_run = true;

        let summary = LibraryProcessor::new(&fetcher, Platform::Linux, &config)
            .process(&version)
            .await
            .unwrap();

        assert!(fetcher.calls().is_empty());
        assert_eq!(summary.planned, 1);
    }

    #[tokio::test]
    async fn skip_existing_only_skips_verified_files() {
        let dir = tempfile::tempdir().unwrap();
        let good = b"hello world";
        let good_sha1 = hex::encode(Sha1::digest(good));

        tokio::fs::create_dir_all(dir.path().join("lib")).await.unwrap();
        tokio::fs::write(dir.path().join("lib/good.jar"), good)
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("lib/stale.jar"), b"hello there")
            .await
            .unwrap();

        let entry = |name: &str, path: &str| {
            serde_json::json!({
                "name": name,
                "downloads": {"artifact": {
                    "path": path,
                    "sha1": good_sha1,
                    "size": good.len(),
                    "url": format!("https://x/{path}")
                }}
            })
        };
        let version = version(serde_json::json!([
            entry("good:good:1", "lib/good.jar"),
            entry("stale:stale:1", "lib/stale.jar"),
            entry("new:new:1", "lib/new.jar")
        ]));

        let fetcher = RecordingFetcher::default();
        let mut config = config(dir.path());
        config.skip_existing = true;

        let summary = LibraryProcessor::new(&fetcher, Platform::Linux, &config)
            .process(&version)
            .await
            .unwrap();

        let urls: Vec<_> = fetcher.calls().into_iter().map(|(url, _)| url).collect();
        assert_eq!(urls, vec!["https://x/lib/stale.jar", "https://x/lib/new.jar"]);
        assert_eq!(summary.already_present, 1);
        assert_eq!(summary.downloaded, 2);
    }
}
