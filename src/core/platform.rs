// ─── Platform ───
// Maps the host OS onto the platform names used by version manifests.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::{FetchError, FetchResult};

/// Platform identifiers as they appear in `os.name` rules and `natives` maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    Windows,
    Osx,
}

impl Platform {
    /// Detect the platform of the running host.
    pub fn detect() -> FetchResult<Self> {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Map a Rust OS identifier (`std::env::consts::OS`) to a platform.
    pub fn from_os_name(os: &str) -> FetchResult<Self> {
        match os {
            "linux" | "freebsd" | "aix" => Ok(Self::Linux),
            "windows" => Ok(Self::Windows),
            "macos" => Ok(Self::Osx),
            other => Err(FetchError::UnsupportedPlatform(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Windows => "windows",
            Self::Osx => "osx",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value substituted for `${arch}` in native classifier names.
pub fn arch_bits() -> &'static str {
    if cfg!(target_pointer_width = "64") {
        "64"
    } else {
        "32"
    }
}
