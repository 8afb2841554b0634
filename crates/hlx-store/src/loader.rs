use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};

use hlx_codec::TypeDigest;
use hlx_envelope::Opened;

use crate::durable::backup_path;
use crate::error::{StoreError, StoreResult};

/// A verified envelope lifted off disk.
#[derive(Debug)]
pub(crate) struct LoadedPayload {
    pub payload: Vec<u8>,
    pub compressed: bool,
    pub timestamp: i64,
}

impl From<Opened<'_>> for LoadedPayload {
    fn from(opened: Opened<'_>) -> Self {
        Self {
            payload: opened.payload.to_vec(),
            compressed: opened.compressed,
            timestamp: opened.timestamp,
        }
    }
}

/// Read a whole file, mapping absence to [`StoreError::NotFound`].
pub(crate) fn read_file(path: &Path) -> StoreResult<Vec<u8>> {
    match fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound {
            path: path.to_path_buf(),
        }),
        Err(err) => Err(err.into()),
    }
}

fn open_at(path: &Path, expected: &TypeDigest, key: &[u8; 32]) -> StoreResult<LoadedPayload> {
    let bytes = read_file(path)?;
    let opened = hlx_envelope::open(&bytes, expected, key)?;
    Ok(opened.into())
}

/// Verified load with backup fallback: try the primary, then `path + ".bak"`.
///
/// On double failure the primary's error is surfaced — that is the file the
/// caller named, and its absence (not the backup's) decides "not found".
pub(crate) fn load_with_fallback(
    path: &Path,
    expected: &TypeDigest,
    key: &[u8; 32],
) -> StoreResult<LoadedPayload> {
    let primary_err = match open_at(path, expected, key) {
        Ok(loaded) => return Ok(loaded),
        Err(err) => err,
    };

    let backup = backup_path(path);
    match open_at(&backup, expected, key) {
        Ok(loaded) => {
            warn!(
                path = %path.display(),
                reason = %primary_err,
                "primary snapshot unusable; recovered from backup"
            );
            Ok(loaded)
        }
        Err(backup_err) => {
            debug!(backup = %backup.display(), reason = %backup_err, "backup also unusable");
            Err(primary_err)
        }
    }
}
