use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::StoreResult;

/// Append a suffix to a path's final component: `save.hlx` → `save.hlx.tmp`.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// The transient sibling a write goes through.
pub(crate) fn tmp_path(target: &Path) -> PathBuf {
    sibling(target, ".tmp")
}

/// The previous-good sibling kept when backups are enabled.
pub(crate) fn backup_path(target: &Path) -> PathBuf {
    sibling(target, ".bak")
}

/// Write `bytes` to `target` so that a crash at any instant leaves the name
/// readable: either the old contents (or their backup) or the complete new
/// contents, never a partial file.
///
/// Protocol: create the parent directory, write everything to
/// `target + ".tmp"`, force it to stable storage, then swap it into place.
/// With `keep_backup` the prior target is first renamed to `target + ".bak"`;
/// without it the rename replaces the target directly. The parent directory
/// is fsynced afterwards so the rename itself is durable. The temp file is
/// removed on every error path.
pub fn write_durable(target: &Path, bytes: &[u8], keep_backup: bool) -> StoreResult<()> {
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = tmp_path(target);
    if let Err(err) = write_and_sync(&tmp, bytes) {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }

    if let Err(err) = swap_into_place(target, &tmp, keep_backup) {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }

    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            sync_dir(parent);
        }
    }

    debug!(path = %target.display(), len = bytes.len(), "snapshot written durably");
    Ok(())
}

fn write_and_sync(tmp: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(tmp)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.sync_all()?;
    Ok(())
}

fn swap_into_place(target: &Path, tmp: &Path, keep_backup: bool) -> io::Result<()> {
    if keep_backup && target.exists() {
        rename_replacing(target, &backup_path(target))?;
    }
    rename_replacing(tmp, target)
}

/// Rename that atomically replaces an existing destination. On platforms
/// where rename-over-existing reports `AlreadyExists`, fall back to
/// remove-then-rename.
fn rename_replacing(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            fs::remove_file(to)?;
            fs::rename(from, to)
        }
        Err(err) => Err(err),
    }
}

fn sync_dir(path: &Path) {
    match File::open(path) {
        Ok(dir) => {
            if let Err(err) = dir.sync_all() {
                tracing::warn!(path = %path.display(), error = %err, "directory sync failed");
            }
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "directory open failed");
        }
    }
}
