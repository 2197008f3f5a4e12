// ─── mclibs Core ───
// Fetches the libraries a version JSON declares for one platform.
//
// Architecture:
//   core/
//     platform/   — Host OS → manifest platform name
//     version/    — Version index + version JSON + OS rules
//     libraries/  — Per-library artifact and destination resolution
//     downloader/ — Sequential downloads with size + SHA-1 validation
//     cleanup/    — Destructive pre-run wipe of the staging tree
//     config/     — Run configuration passed to every step

pub mod cleanup;
pub mod config;
pub mod downloader;
pub mod error;
pub mod http;
pub mod libraries;
pub mod platform;
pub mod version;
