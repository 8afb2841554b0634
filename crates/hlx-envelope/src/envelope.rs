use std::time::{SystemTime, UNIX_EPOCH};

use hlx_codec::TypeDigest;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{EnvelopeError, EnvelopeResult};
use crate::format::{self, RawHeader, FLAG_COMPRESSED, HEADER_LEN, TAG_LEN};

type HmacSha256 = Hmac<Sha256>;

/// A verified envelope: MAC checked, header trusted, payload still opaque.
#[derive(Debug)]
pub struct Opened<'a> {
    /// The codec payload, exactly as signed.
    pub payload: &'a [u8],
    /// Whether the payload is an LZ4 frame. Trustworthy: `flags` is signed.
    pub compressed: bool,
    /// Write-time wall clock, nanoseconds since the Unix epoch. Signed, so
    /// a rewind to an older snapshot is observable by the caller.
    pub timestamp: i64,
    /// The digest stored in the header.
    pub type_digest: TypeDigest,
}

/// Header fields and payload of an envelope whose MAC has NOT been checked.
///
/// Produced by [`peek`] for the raw-extraction fast path. Nothing here may
/// be trusted for integrity decisions.
#[derive(Debug)]
pub struct Peeked<'a> {
    pub payload: &'a [u8],
    pub compressed: bool,
    pub timestamp: i64,
    pub type_digest: TypeDigest,
}

/// Build an envelope around an already-encoded payload.
///
/// The timestamp is the current UTC wall clock. Payloads must be non-empty
/// and under the format's `i32` length cap.
pub fn seal(
    digest: &TypeDigest,
    payload: &[u8],
    compressed: bool,
    key: &[u8; 32],
) -> EnvelopeResult<Vec<u8>> {
    seal_at(digest, payload, compressed, key, unix_timestamp_nanos())
}

/// [`seal`] with an explicit timestamp.
pub fn seal_at(
    digest: &TypeDigest,
    payload: &[u8],
    compressed: bool,
    key: &[u8; 32],
    timestamp: i64,
) -> EnvelopeResult<Vec<u8>> {
    if payload.is_empty() {
        return Err(EnvelopeError::EmptyPayload);
    }
    if payload.len() > i32::MAX as usize {
        return Err(EnvelopeError::PayloadTooLarge(payload.len()));
    }

    let flags = if compressed { FLAG_COMPRESSED } else { 0 };
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len() + TAG_LEN);
    format::write_header(&mut buf, flags, digest, timestamp, payload.len() as i32);
    buf.extend_from_slice(payload);

    let tag = compute_tag(flags, digest, timestamp, payload, key);
    buf.extend_from_slice(&tag);
    Ok(buf)
}

/// Parse and verify an envelope against the caller's expected type.
///
/// Checks run in a fixed order, each rejection carrying its own reason:
/// length, magic, version, reserved flags, type digest (constant-time),
/// framing, MAC (constant-time). The payload is never interpreted before
/// the MAC passes.
pub fn open<'a>(
    bytes: &'a [u8],
    expected: &TypeDigest,
    key: &[u8; 32],
) -> EnvelopeResult<Opened<'a>> {
    let header = RawHeader::parse(bytes)?;
    if !bool::from(header.type_digest.as_bytes().ct_eq(expected.as_bytes())) {
        return Err(EnvelopeError::TypeMismatch);
    }
    verify_framed(bytes, header, key)
}

/// Parse and verify an envelope without an expected type.
///
/// For collaborators that cannot name the writing type, such as the repair
/// tool. The stored digest is surfaced on the result instead of checked.
pub fn open_untyped<'a>(bytes: &'a [u8], key: &[u8; 32]) -> EnvelopeResult<Opened<'a>> {
    let header = RawHeader::parse(bytes)?;
    verify_framed(bytes, header, key)
}

/// Header-only parse: length, magic, version, flags, framing — no MAC.
///
/// This is the documented unverified fast path for extracting payloads that
/// were stored uncompressed. Anything needing integrity must use [`open`].
pub fn peek(bytes: &[u8]) -> EnvelopeResult<Peeked<'_>> {
    let header = RawHeader::parse(bytes)?;
    let payload_len = header.check_framing(bytes.len())?;
    Ok(Peeked {
        payload: &bytes[HEADER_LEN..HEADER_LEN + payload_len],
        compressed: header.is_compressed(),
        timestamp: header.timestamp,
        type_digest: header.type_digest,
    })
}

fn verify_framed<'a>(
    bytes: &'a [u8],
    header: RawHeader,
    key: &[u8; 32],
) -> EnvelopeResult<Opened<'a>> {
    let payload_len = header.check_framing(bytes.len())?;
    let payload = &bytes[HEADER_LEN..HEADER_LEN + payload_len];
    let tag = &bytes[HEADER_LEN + payload_len..];

    // hmac's verify_slice is constant-time.
    tag_mac(header.flags, &header.type_digest, header.timestamp, payload, key)
        .verify_slice(tag)
        .map_err(|_| EnvelopeError::MacFailed)?;

    Ok(Opened {
        payload,
        compressed: header.is_compressed(),
        timestamp: header.timestamp,
        type_digest: header.type_digest,
    })
}

/// MAC over the canonical byte string: version ‖ flags ‖ type_digest ‖
/// timestamp ‖ payload.
fn tag_mac(
    flags: u8,
    digest: &TypeDigest,
    timestamp: i64,
    payload: &[u8],
    key: &[u8; 32],
) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(&crate::format::VERSION.to_le_bytes());
    mac.update(&[flags]);
    mac.update(digest.as_bytes());
    mac.update(&timestamp.to_le_bytes());
    mac.update(payload);
    mac
}

fn compute_tag(
    flags: u8,
    digest: &TypeDigest,
    timestamp: i64,
    payload: &[u8],
    key: &[u8; 32],
) -> [u8; 32] {
    tag_mac(flags, digest, timestamp, payload, key)
        .finalize()
        .into_bytes()
        .into()
}

fn unix_timestamp_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::MIN_ENVELOPE_LEN;

    const KEY: [u8; 32] = [0xA5; 32];
    const OTHER_KEY: [u8; 32] = [0x3C; 32];

    struct Settings;
    struct GameState;

    fn sealed() -> Vec<u8> {
        seal_at(&TypeDigest::of::<Settings>(), b"payload!", false, &KEY, 77).unwrap()
    }

    #[test]
    fn seal_then_open() {
        let bytes = sealed();
        let opened = open(&bytes, &TypeDigest::of::<Settings>(), &KEY).unwrap();
        assert_eq!(opened.payload, b"payload!");
        assert!(!opened.compressed);
        assert_eq!(opened.timestamp, 77);
        assert_eq!(opened.type_digest, TypeDigest::of::<Settings>());
    }

    #[test]
    fn seal_stamps_current_time() {
        let before = unix_timestamp_nanos();
        let bytes = seal(&TypeDigest::of::<Settings>(), b"x", false, &KEY).unwrap();
        let after = unix_timestamp_nanos();
        let opened = open(&bytes, &TypeDigest::of::<Settings>(), &KEY).unwrap();
        assert!(opened.timestamp >= before && opened.timestamp <= after);
    }

    #[test]
    fn compressed_flag_survives() {
        let bytes = seal_at(&TypeDigest::of::<Settings>(), b"framed", true, &KEY, 0).unwrap();
        let opened = open(&bytes, &TypeDigest::of::<Settings>(), &KEY).unwrap();
        assert!(opened.compressed);
    }

    #[test]
    fn empty_payload_rejected_at_seal() {
        let err = seal_at(&TypeDigest::of::<Settings>(), b"", false, &KEY, 0).unwrap_err();
        assert_eq!(err, EnvelopeError::EmptyPayload);
    }

    #[test]
    fn wrong_key_fails_mac() {
        let bytes = sealed();
        let err = open(&bytes, &TypeDigest::of::<Settings>(), &OTHER_KEY).unwrap_err();
        assert_eq!(err, EnvelopeError::MacFailed);
    }

    #[test]
    fn wrong_type_rejected_before_mac() {
        // Even with the wrong key, a digest mismatch reports TypeMismatch:
        // the type check runs first.
        let bytes = sealed();
        let err = open(&bytes, &TypeDigest::of::<GameState>(), &OTHER_KEY).unwrap_err();
        assert_eq!(err, EnvelopeError::TypeMismatch);
    }

    #[test]
    fn truncation_rejected() {
        let bytes = sealed();
        let err = open(&bytes[..bytes.len() - 1], &TypeDigest::of::<Settings>(), &KEY).unwrap_err();
        assert!(matches!(err, EnvelopeError::FramingMismatch { .. }));

        let err = open(&bytes[..10], &TypeDigest::of::<Settings>(), &KEY).unwrap_err();
        assert_eq!(err, EnvelopeError::TooShort { actual: 10 });
    }

    #[test]
    fn every_byte_is_covered() {
        // Flipping any byte of the file must reject the envelope. Offsets in
        // the type digest surface as TypeMismatch; everything else lands on a
        // header or MAC failure. No flip may open successfully.
        let good = sealed();
        let expected = TypeDigest::of::<Settings>();
        for offset in 0..good.len() {
            for delta in [0x01u8, 0x80, 0xFF] {
                let mut bad = good.clone();
                bad[offset] ^= delta;
                assert!(
                    open(&bad, &expected, &KEY).is_err(),
                    "flip at offset {offset} delta {delta:#x} was accepted"
                );
            }
        }
    }

    #[test]
    fn grown_file_fails_framing() {
        let mut bytes = sealed();
        bytes.push(0);
        let err = open(&bytes, &TypeDigest::of::<Settings>(), &KEY).unwrap_err();
        assert!(matches!(err, EnvelopeError::FramingMismatch { .. }));
    }

    #[test]
    fn untyped_open_surfaces_stored_digest() {
        let bytes = sealed();
        let opened = open_untyped(&bytes, &KEY).unwrap();
        assert_eq!(opened.type_digest, TypeDigest::of::<Settings>());
        assert_eq!(opened.payload, b"payload!");
    }

    #[test]
    fn untyped_open_still_verifies_mac() {
        let mut bytes = sealed();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert_eq!(open_untyped(&bytes, &KEY).unwrap_err(), EnvelopeError::MacFailed);
    }

    #[test]
    fn peek_reads_header_without_key() {
        let bytes = sealed();
        let peeked = peek(&bytes).unwrap();
        assert_eq!(peeked.payload, b"payload!");
        assert_eq!(peeked.timestamp, 77);
        assert!(!peeked.compressed);
    }

    #[test]
    fn peek_does_not_verify_the_tag() {
        let mut bytes = sealed();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert!(peek(&bytes).is_ok());
    }

    #[test]
    fn min_envelope_is_83_bytes() {
        assert_eq!(MIN_ENVELOPE_LEN, 83);
        let bytes = seal_at(&TypeDigest::of::<Settings>(), b"z", false, &KEY, 0).unwrap();
        assert_eq!(bytes.len(), 84);
    }

    #[test]
    fn tag_is_detached_sha256_hmac() {
        let bytes = sealed();
        let tag = compute_tag(0, &TypeDigest::of::<Settings>(), 77, b"payload!", &KEY);
        assert_eq!(&bytes[bytes.len() - TAG_LEN..], tag);
    }
}

