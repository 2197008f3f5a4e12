pub mod client;
pub mod integrity;

pub use client::{ArtifactFetcher, Downloader};
pub use integrity::{sha1_file, verify_file, verify_sha1};
