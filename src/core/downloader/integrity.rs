use std::path::Path;

use sha1::{Digest, Sha1};
use tokio::io::AsyncReadExt;

use crate::core::error::{FetchError, FetchResult};

const CHUNK_SIZE: usize = 128 * 1024;

/// Stream `path` through SHA-1 and return the lowercase hex digest with the
/// number of bytes read.
pub async fn sha1_file(path: &Path) -> FetchResult<(String, u64)> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(FetchError::io(path))?;

    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut len = 0u64;

    loop {
        let n = file.read(&mut buf).await.map_err(FetchError::io(path))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        len += n as u64;
    }

    Ok((hex::encode(hasher.finalize()), len))
}

/// Check that `path` has exactly `expected_size` bytes and SHA-1 `expected_sha1`.
///
/// Size is compared first, so a truncated file always reports a size error.
pub async fn verify_file(path: &Path, expected_sha1: &str, expected_size: u64) -> FetchResult<()> {
    let actual_size = tokio::fs::metadata(path)
        .await
        .map_err(FetchError::io(path))?
        .len();
    if actual_size != expected_size {
        return Err(FetchError::SizeMismatch {
            path: path.to_path_buf(),
            expected: expected_size,
            actual: actual_size,
        });
    }

    verify_sha1(path, expected_sha1).await
}

/// Digest-only check, for files whose size is not published.
pub async fn verify_sha1(path: &Path, expected_sha1: &str) -> FetchResult<()> {
    let (actual, _) = sha1_file(path).await?;
    if !actual.eq_ignore_ascii_case(expected_sha1) {
        return Err(FetchError::Sha1Mismatch {
            path: path.to_path_buf(),
            expected: expected_sha1.to_string(),
            actual,
        });
    }
    Ok(())
}
