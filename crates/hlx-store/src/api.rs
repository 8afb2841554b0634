use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use hlx_codec::{Compression, TypeDigest};
use hlx_keys::KeyScope;

use crate::durable::write_durable;
use crate::error::{StoreError, StoreResult};
use crate::loader::{load_with_fallback, read_file};

/// Knobs for a single save. Defaults: portable key, keep a backup,
/// compress the payload.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SaveOptions {
    /// Sign with the compiled-in global key so the file verifies on any
    /// install; `false` binds the file to this machine's key.
    pub portable: bool,
    /// Preserve the previous snapshot at `path + ".bak"`.
    pub backup: bool,
    /// Wrap the payload in an LZ4 frame.
    pub compress: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            portable: true,
            backup: true,
            compress: true,
        }
    }
}

/// Encode, seal, and durably write a value as a snapshot at `path`.
pub fn save<T: Serialize>(value: &T, path: &Path, options: SaveOptions) -> StoreResult<()> {
    let compression = Compression::from_flag(options.compress);
    let payload = hlx_codec::encode_value(value, compression)?;
    let digest = TypeDigest::of::<T>();
    write_envelope(path, &payload, &digest, options, options.compress)
}

/// Durably write a payload that was encoded elsewhere.
///
/// For callers that serialize on one thread and write on another: the
/// payload must have been produced by the object codec, with
/// `is_compressed` describing its mode, and `digest` naming the value's
/// type.
pub fn save_prebuilt_payload(
    path: &Path,
    payload: &[u8],
    digest: &TypeDigest,
    options: SaveOptions,
    is_compressed: bool,
) -> StoreResult<()> {
    write_envelope(path, payload, digest, options, is_compressed)
}

fn write_envelope(
    path: &Path,
    payload: &[u8],
    digest: &TypeDigest,
    options: SaveOptions,
    compressed: bool,
) -> StoreResult<()> {
    let key = KeyScope::from_portable(options.portable).resolve()?;
    let bytes = hlx_envelope::seal(digest, payload, compressed, key)?;
    write_durable(path, &bytes, options.backup)
}

/// Load a snapshot, falling back to the backup sibling, and to
/// `T::default()` when neither is usable.
///
/// This is the application-startup entry point: a missing, truncated,
/// tampered, retyped, or otherwise rejected file degrades to defaults
/// instead of an error. The caller cannot distinguish "absent" from
/// "rejected" here; the reason is logged, not returned.
pub fn load_or_new<T: DeserializeOwned + Default>(path: &Path, portable: bool) -> T {
    match load_or_fail(path, portable) {
        Ok(value) => value,
        Err(StoreError::NotFound { .. }) => {
            debug!(path = %path.display(), "no snapshot; starting from defaults");
            T::default()
        }
        Err(err) => {
            warn!(path = %path.display(), reason = %err, "snapshot rejected; starting from defaults");
            T::default()
        }
    }
}

/// Load a snapshot or report why it could not be loaded.
///
/// Absence of both the primary and its backup is [`StoreError::NotFound`];
/// every other rejection surfaces with its specific reason.
pub fn load_or_fail<T: DeserializeOwned>(path: &Path, portable: bool) -> StoreResult<T> {
    let key = KeyScope::from_portable(portable).resolve()?;
    let digest = TypeDigest::of::<T>();
    let loaded = load_with_fallback(path, &digest, key)?;
    let value = hlx_codec::decode_value(&loaded.payload, Compression::from_flag(loaded.compressed))?;
    Ok(value)
}

/// The verified write-time timestamp of the snapshot at `path`,
/// nanoseconds since the Unix epoch.
///
/// Callers defending against rollback-by-rewind compare this against their
/// own high-water mark before trusting a loaded value.
pub fn stored_timestamp<T>(path: &Path, portable: bool) -> StoreResult<i64> {
    let key = KeyScope::from_portable(portable).resolve()?;
    let digest = TypeDigest::of::<T>();
    let loaded = load_with_fallback(path, &digest, key)?;
    Ok(loaded.timestamp)
}

/// Extract the snapshot's payload in its uncompressed, interoperable form
/// (plain CBOR).
///
/// Uncompressed snapshots take a fast path that strips the header and tag
/// WITHOUT verifying the MAC — uncompressed mode is advertised as open for
/// external extraction, and this keeps the raw path usable without key
/// material being consulted. Compressed snapshots are fully verified, then
/// unwrapped to the plain stream.
pub fn extract_raw_payload<T>(path: &Path, portable: bool) -> StoreResult<Vec<u8>> {
    let expected = TypeDigest::of::<T>();
    let bytes = read_file(path)?;

    let peeked = hlx_envelope::peek(&bytes)?;
    if !peeked.compressed {
        if peeked.type_digest != expected {
            return Err(hlx_envelope::EnvelopeError::TypeMismatch.into());
        }
        return Ok(peeked.payload.to_vec());
    }

    let key = KeyScope::from_portable(portable).resolve()?;
    let opened = hlx_envelope::open(&bytes, &expected, key)?;
    Ok(hlx_codec::decompress(opened.payload)?)
}
