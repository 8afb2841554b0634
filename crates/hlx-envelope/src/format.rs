use hlx_codec::TypeDigest;

use crate::error::{EnvelopeError, EnvelopeResult};

/// First four bytes of every envelope.
pub const MAGIC: [u8; 4] = *b"%HLX";

/// Envelope format version. Readers reject anything else; any change to the
/// layout or to the canonical MAC string must bump this.
pub const VERSION: u16 = 1;

/// Flag bit 0: the payload is an LZ4 frame. All other bits are reserved
/// and must be zero.
pub const FLAG_COMPRESSED: u8 = 0x01;

/// Fixed header size: magic(4) + version(2) + flags(1) + digest(32) +
/// timestamp(8) + payload_len(4).
pub const HEADER_LEN: usize = 51;

/// Trailing HMAC-SHA256 tag size.
pub const TAG_LEN: usize = 32;

/// Shortest byte string worth parsing: header plus tag.
pub const MIN_ENVELOPE_LEN: usize = HEADER_LEN + TAG_LEN;

const VERSION_OFFSET: usize = 4;
const FLAGS_OFFSET: usize = 6;
const DIGEST_OFFSET: usize = 7;
const TIMESTAMP_OFFSET: usize = 39;
const PAYLOAD_LEN_OFFSET: usize = 47;

/// Header fields as read off the wire, before framing and MAC validation.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RawHeader {
    pub flags: u8,
    pub type_digest: TypeDigest,
    pub timestamp: i64,
    pub payload_len: i32,
}

impl RawHeader {
    /// Validate length, magic, version, and reserved flag bits, then read
    /// the remaining fields. Framing and MAC are the caller's next steps.
    pub fn parse(bytes: &[u8]) -> EnvelopeResult<Self> {
        if bytes.len() < MIN_ENVELOPE_LEN {
            return Err(EnvelopeError::TooShort { actual: bytes.len() });
        }
        if bytes[..4] != MAGIC {
            return Err(EnvelopeError::BadMagic);
        }

        let version = u16::from_le_bytes(field(bytes, VERSION_OFFSET));
        if version != VERSION {
            return Err(EnvelopeError::BadVersion(version));
        }

        let flags = bytes[FLAGS_OFFSET];
        if flags & !FLAG_COMPRESSED != 0 {
            return Err(EnvelopeError::BadFlags(flags));
        }

        let digest: [u8; 32] = field(bytes, DIGEST_OFFSET);
        Ok(Self {
            flags,
            type_digest: TypeDigest::from_bytes(digest),
            timestamp: i64::from_le_bytes(field(bytes, TIMESTAMP_OFFSET)),
            payload_len: i32::from_le_bytes(field(bytes, PAYLOAD_LEN_OFFSET)),
        })
    }

    /// Check the declared payload length against the file: strictly
    /// positive, and header + payload + tag must cover the file exactly.
    /// Returns the validated payload length.
    pub fn check_framing(&self, total_len: usize) -> EnvelopeResult<usize> {
        let actual = total_len - MIN_ENVELOPE_LEN;
        if self.payload_len <= 0 || self.payload_len as usize != actual {
            return Err(EnvelopeError::FramingMismatch {
                declared: i64::from(self.payload_len),
                actual,
            });
        }
        Ok(actual)
    }

    pub fn is_compressed(&self) -> bool {
        self.flags & FLAG_COMPRESSED != 0
    }
}

/// Serialize the header into the front of an envelope buffer.
pub(crate) fn write_header(
    buf: &mut Vec<u8>,
    flags: u8,
    digest: &TypeDigest,
    timestamp: i64,
    payload_len: i32,
) {
    buf.extend_from_slice(&MAGIC);
    buf.extend_from_slice(&VERSION.to_le_bytes());
    buf.push(flags);
    buf.extend_from_slice(digest.as_bytes());
    buf.extend_from_slice(&timestamp.to_le_bytes());
    buf.extend_from_slice(&payload_len.to_le_bytes());
    debug_assert_eq!(buf.len(), HEADER_LEN);
}

fn field<const N: usize>(bytes: &[u8], offset: usize) -> [u8; N] {
    bytes[offset..offset + N]
        .try_into()
        .expect("offset ranges are within the checked minimum length")
}
