// ─── Version File ───
// Parses a version JSON and evaluates OS rules for libraries.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::core::error::{FetchError, FetchResult};
use crate::core::platform::{arch_bits, Platform};

/// The parts of a version JSON the fetcher reads. Other keys are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionJson {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
}

// ─── Library Entry with Rules ───

#[derive(Debug, Deserialize)]
pub struct LibraryEntry {
    /// Only used in diagnostics, so an unnamed entry still parses.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    #[serde(default)]
    pub rules: Option<Vec<LibraryRule>>,
    /// Platform name → native classifier name.
    #[serde(default)]
    pub natives: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default)]
    pub artifact: Option<LibDownloadArtifact>,
    #[serde(default)]
    pub classifiers: Option<BTreeMap<String, LibDownloadArtifact>>,
}

/// A concrete downloadable file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LibDownloadArtifact {
    pub path: String,
    pub sha1: String,
    pub size: u64,
    pub url: String,
}

impl LibDownloadArtifact {
    /// Final segment of the declared path, e.g. `lwjgl-natives-linux.jar`.
    pub fn file_name(&self) -> Option<&str> {
        Path::new(&self.path)
            .file_name()
            .and_then(|name| name.to_str())
    }
}

// ─── OS Rule Evaluation ───

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryRule {
    pub action: RuleAction,
    #[serde(default)]
    pub os: Option<OsRule>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OsRule {
    #[serde(default)]
    pub name: Option<String>,
    #[allow(dead_code)]
    #[serde(default)]
    pub arch: Option<String>,
    #[allow(dead_code)]
    #[serde(default)]
    pub version: Option<String>,
}

/// Decide whether a rule list admits `platform`.
///
/// Starts from "keep" and only ever clears it:
/// - `allow` with an `os` that does not name this platform clears it,
///   including an `os` carrying only `arch` or `version`.
/// - `disallow` naming this platform clears it.
/// - Rules without an `os` change nothing.
///
/// A later `allow` can never bring back an entry an earlier rule excluded.
pub fn rules_allow(rules: &[LibraryRule], platform: Platform) -> bool {
    let mut keep = true;

    for rule in rules {
        let Some(os) = &rule.os else {
            continue;
        };
        let names_platform = os.name.as_deref() == Some(platform.as_str());

        match rule.action {
            RuleAction::Allow if !names_platform => keep = false,
            RuleAction::Disallow if names_platform => keep = false,
            _ => {}
        }
    }

    keep
}

impl LibraryEntry {
    /// Evaluate whether this library applies to `platform`. No rules → allowed.
    pub fn is_allowed_for(&self, platform: Platform) -> bool {
        match &self.rules {
            Some(rules) => rules_allow(rules, platform),
            None => true,
        }
    }

    /// Native classifier name for `platform`, if the library declares natives.
    ///
    /// Errors when a `natives` map exists but has no key for `platform`.
    pub fn native_classifier_for(&self, platform: Platform) -> FetchResult<Option<String>> {
        let Some(natives) = &self.natives else {
            return Ok(None);
        };

        let classifier = natives.get(platform.as_str()).ok_or_else(|| {
            FetchError::MissingNativePlatform {
                natives: format!("{natives:?}"),
                platform: platform.to_string(),
            }
        })?;

        Ok(Some(classifier.replace("${arch}", arch_bits())))
    }
}

impl VersionJson {
    /// Read and parse the version JSON at `path`.
    pub async fn load(path: &Path) -> FetchResult<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(FetchError::io(path))?;
        let version_json = Self::parse(&raw, path)?;

        debug!(
            "Loaded {:?} with {} libraries",
            path,
            version_json.libraries.len()
        );
        Ok(version_json)
    }

    pub fn parse(raw: &str, path: &Path) -> FetchResult<Self> {
        serde_json::from_str(raw).map_err(|source| FetchError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })
    }
}
