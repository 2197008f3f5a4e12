// ─── Cleanup ───
// Wipes a staging tree before a fresh fetch. Nothing here can be undone.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::error::{FetchError, FetchResult};

/// Extensions treated as downloaded library archives.
pub const LIBRARY_ARCHIVE_EXTENSIONS: &[&str] = &["jar"];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanupReport {
    pub archives_removed: usize,
    pub dirs_removed: usize,
}

/// Delete every library archive below `root`, then every top-level
/// subdirectory of `root`. Symlinks are neither followed nor removed.
pub async fn clean_tree(root: &Path) -> FetchResult<CleanupReport> {
    let mut report = CleanupReport::default();

    let mut archives = find_archives(root).await?;
    archives.sort();
    for archive in &archives {
        tokio::fs::remove_file(archive)
            .await
            .map_err(FetchError::io(archive))?;
        debug!("Removed {:?}", archive);
    }
    report.archives_removed = archives.len();

    let mut dirs = top_level_dirs(root).await?;
    dirs.sort();
    for dir in &dirs {
        tokio::fs::remove_dir_all(dir)
            .await
            .map_err(FetchError::io(dir))?;
        debug!("Removed directory {:?}", dir);
    }
    report.dirs_removed = dirs.len();

    info!(
        "Cleaned {:?}: {} archives, {} directories",
        root, report.archives_removed, report.dirs_removed
    );
    Ok(report)
}

/// Every regular file below `root` matching `**/*.<ext>` for an archive
/// extension, skipping anything reached through a symlink.
async fn find_archives(root: &Path) -> FetchResult<Vec<PathBuf>> {
    let escaped_root = glob::Pattern::escape(&root.to_string_lossy());
    let mut found = Vec::new();

    for ext in LIBRARY_ARCHIVE_EXTENSIONS {
        let pattern = format!("{escaped_root}/**/*.{ext}");
        let walker = glob::glob(&pattern).map_err(|source| FetchError::CleanupPattern {
            pattern: pattern.clone(),
            source,
        })?;

        for entry in walker {
            let path = entry.map_err(|err| FetchError::Io {
                path: err.path().to_path_buf(),
                source: err.into_error(),
            })?;

            if path.is_file() && !reached_through_symlink(root, &path).await? {
                found.push(path);
            }
        }
    }

    Ok(found)
}

async fn reached_through_symlink(root: &Path, path: &Path) -> FetchResult<bool> {
    let Ok(relative) = path.strip_prefix(root) else {
        return Ok(true);
    };

    let mut current = root.to_path_buf();
    for component in relative.components() {
        current.push(component);
        let metadata = tokio::fs::symlink_metadata(&current)
            .await
            .map_err(FetchError::io(&current))?;
        if metadata.file_type().is_symlink() {
            return Ok(true);
        }
    }

    Ok(false)
}

async fn top_level_dirs(root: &Path) -> FetchResult<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    let mut read_dir = tokio::fs::read_dir(root)
        .await
        .map_err(FetchError::io(root))?;

    while let Some(entry) = read_dir.next_entry().await.map_err(FetchError::io(root))? {
        let file_type = entry
            .file_type()
            .await
            .map_err(FetchError::io(entry.path()))?;
        if file_type.is_dir() {
            dirs.push(entry.path());
        }
    }

    Ok(dirs)
}
