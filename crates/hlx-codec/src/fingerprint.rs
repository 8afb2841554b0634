use std::fmt;

use sha2::{Digest, Sha256};

/// The canonical textual identity of `T` used for fingerprinting.
///
/// This implementation's naming scheme is `std::any::type_name`: the fully
/// qualified path of the type as the compiler renders it, including crate
/// and module segments. The scheme is part of the stored-data contract —
/// renaming a snapshot type or moving it to another module changes its
/// fingerprint and orphans every file written under the old identity.
pub fn canonical_name<T: ?Sized>() -> &'static str {
    std::any::type_name::<T>()
}

/// 32-byte fingerprint binding a snapshot to the type that wrote it.
///
/// Computed as `SHA-256(canonical_name(T))`. The digest is an identity
/// check, not a schema check: two structurally identical types in different
/// modules produce different digests, and the same type keeps its digest
/// across additive field changes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeDigest([u8; 32]);

impl TypeDigest {
    /// Fingerprint of the type `T`.
    pub fn of<T: ?Sized>() -> Self {
        Self::from_name(canonical_name::<T>())
    }

    /// Fingerprint of an explicit canonical name.
    pub fn from_name(name: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(name.as_bytes());
        Self(hasher.finalize().into())
    }

    /// Wrap a digest read from an envelope header.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw 32 bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for TypeDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDigest({})", self.short_hex())
    }
}

impl fmt::Display for TypeDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for TypeDigest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}
