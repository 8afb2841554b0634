//! Object codec and type fingerprinting for HLX snapshots.
//!
//! This crate turns typed application values into opaque payload byte
//! strings and back. The encoding is CBOR (RFC 8949), chosen because it is
//! self-describing: records written by an older build remain readable after
//! fields are added, as long as new fields carry `#[serde(default)]`. The
//! uncompressed stream is plain CBOR and can be consumed by any CBOR
//! implementation in any ecosystem.
//!
//! Payloads may optionally be wrapped in an LZ4 frame (a sequence of
//! independently decompressible blocks) via [`Compression::Lz4`].
//!
//! [`TypeDigest`] maps a Rust type to a stable 32-byte identity used by the
//! envelope layer to bind a snapshot file to the type that wrote it.

pub mod codec;
pub mod error;
pub mod fingerprint;

pub use codec::{decode_value, decompress, encode_value, Compression};
pub use error::{CodecError, CodecResult};
pub use fingerprint::{canonical_name, TypeDigest};
