//! The signed snapshot envelope.
//!
//! An envelope is a contiguous byte string with three regions: a 51-byte
//! little-endian header, an opaque payload produced by the object codec,
//! and a 32-byte HMAC-SHA256 tag:
//!
//! ```text
//! [0..4)     magic        "%HLX"
//! [4..6)     version      u16, currently 1
//! [6]        flags        bit 0 = payload compressed, bits 1..7 reserved
//! [7..39)    type_digest  fingerprint of the writer's declared type
//! [39..47)   timestamp    i64, nanoseconds since the Unix epoch (UTC)
//! [47..51)   payload_len  i32, strictly positive
//! [51..51+N) payload
//! [..+32)    tag          HMAC-SHA256(version ‖ flags ‖ type_digest ‖
//!                         timestamp ‖ payload)
//! ```
//!
//! The MAC covers every field an attacker could usefully flip — including
//! `flags`, so a stored-uncompressed payload cannot be steered into the
//! decompressor, and `timestamp`, so a rollback is observable. `magic` and
//! `payload_len` are excluded: one is a constant, the other is implied by
//! the signed payload's length and revalidated by the framing check.
//!
//! Validation is strictly ordered and nothing interprets the payload before
//! the tag verifies. Digest and tag comparisons are constant-time.

pub mod envelope;
pub mod error;
pub mod format;

pub use envelope::{open, open_untyped, peek, seal, seal_at, Opened, Peeked};
pub use error::{EnvelopeError, EnvelopeResult};
pub use format::{
    FLAG_COMPRESSED, HEADER_LEN, MAGIC, MIN_ENVELOPE_LEN, TAG_LEN, VERSION,
};
