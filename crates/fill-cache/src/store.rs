//! Blob storage on disk
//!
//! Stateless helpers that put encoded images on disk, read them back and
//! delete them. Which blobs exist is tracked by the index, not here.

use crate::error::{CacheError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Suffix of the scratch file a blob is written to before being renamed
pub(crate) const TMP_SUFFIX: &str = ".tmp";

pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(TMP_SUFFIX);
    PathBuf::from(name)
}

/// Write `data` to `path`, replacing any previous content.
///
/// Bytes go to a sibling temp file which is renamed over `path`, so readers
/// see either the old blob or the new one.
pub async fn write(path: &Path, data: &[u8]) -> Result<()> {
    let tmp = tmp_path(path);
    if let Err(err) = write_then_rename(&tmp, path, data).await {
        if let Err(cleanup) = fs::remove_file(&tmp).await {
            if cleanup.kind() != ErrorKind::NotFound {
                warn!(path = ?tmp, error = %cleanup, "Failed to remove temp file");
            }
        }
        return Err(CacheError::io("write blob", path, err));
    }
    Ok(())
}

async fn write_then_rename(tmp: &Path, path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(tmp).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(tmp, path).await
}

/// Read the blob stored at `path`
pub async fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path)
        .await
        .map_err(|err| CacheError::io("read blob", path, err))
}

/// Delete the blob at `path`. A blob that is already gone counts as removed.
pub async fn remove(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(CacheError::io("remove blob", path, err)),
    }
}
