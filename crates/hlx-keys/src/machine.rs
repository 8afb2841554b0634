use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use getrandom::fill;
use tracing::debug;

use crate::error::{KeyError, KeyResult};

const KEY_FILE: &str = "machine.key";
const KEY_LEN: usize = 32;

static MACHINE_KEY: OnceLock<[u8; 32]> = OnceLock::new();

/// The per-install HMAC key, provisioning it on first use.
///
/// The key lives at `<data_local_dir>/<program>/machine.key`, where
/// `<program>` is the current executable's file stem. Once written the file
/// is treated as read-only for the lifetime of the install; a file of the
/// wrong length is reported as an error, never silently regenerated.
pub fn machine_key() -> KeyResult<&'static [u8; 32]> {
    if let Some(key) = MACHINE_KEY.get() {
        return Ok(key);
    }
    let key = machine_key_at(&default_key_dir()?)?;
    Ok(MACHINE_KEY.get_or_init(|| key))
}

/// Read or provision the machine key under an explicit directory.
///
/// Provisioning writes fresh random bytes to a process-unique temp sibling,
/// forces them to stable storage, then publishes with an atomic
/// create-if-absent link. Losing the publish race means another process won;
/// its key file is read back so every process on the install agrees on one
/// key.
pub fn machine_key_at(dir: &Path) -> KeyResult<[u8; 32]> {
    let path = dir.join(KEY_FILE);

    match fs::read(&path) {
        Ok(bytes) => return key_from_bytes(bytes, &path),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err.into()),
    }

    fs::create_dir_all(dir)?;

    let mut key = [0u8; KEY_LEN];
    fill(&mut key).map_err(|e| KeyError::Entropy(e.to_string()))?;

    let tmp = dir.join(format!("{KEY_FILE}.tmp.{}", std::process::id()));
    write_key_file(&tmp, &key)?;

    match fs::hard_link(&tmp, &path) {
        Ok(()) => {
            let _ = fs::remove_file(&tmp);
            sync_dir(dir);
            debug!(path = %path.display(), "machine key provisioned");
            Ok(key)
        }
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            // Lost the race; the winner's key is the install's key.
            let _ = fs::remove_file(&tmp);
            let bytes = fs::read(&path)?;
            key_from_bytes(bytes, &path)
        }
        Err(err) => {
            let _ = fs::remove_file(&tmp);
            Err(err.into())
        }
    }
}

fn write_key_file(path: &Path, key: &[u8; KEY_LEN]) -> KeyResult<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    file.write_all(key)?;
    file.sync_all()?;
    Ok(())
}

fn key_from_bytes(bytes: Vec<u8>, path: &Path) -> KeyResult<[u8; 32]> {
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| KeyError::MalformedKeyFile {
            path: path.to_path_buf(),
            len,
        })
}

fn default_key_dir() -> KeyResult<PathBuf> {
    let base = dirs_next::data_local_dir().ok_or(KeyError::NoAppDataDir)?;
    Ok(base.join(program_identity()?))
}

fn program_identity() -> KeyResult<String> {
    let exe = std::env::current_exe()?;
    exe.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_owned)
        .ok_or(KeyError::NoProgramIdentity)
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
