use std::io::{Read, Write};

use lz4_flex::frame::{FrameDecoder, FrameEncoder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CodecError, CodecResult};

/// Payload compression mode.
///
/// `Lz4` wraps the CBOR stream in an LZ4 frame: a sequence of independently
/// decompressible blocks with per-block framing. `None` leaves the payload
/// as plain CBOR, readable by any external CBOR decoder.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Compression {
    None,
    #[default]
    Lz4,
}

impl Compression {
    /// Compression mode for a flag bit recovered from a verified envelope.
    pub fn from_flag(compressed: bool) -> Self {
        if compressed { Self::Lz4 } else { Self::None }
    }

    /// Whether this mode produces a compressed stream.
    pub fn is_compressed(self) -> bool {
        matches!(self, Self::Lz4)
    }

    pub fn compress(self, data: Vec<u8>) -> CodecResult<Vec<u8>> {
        match self {
            Self::None => Ok(data),
            Self::Lz4 => {
                let mut encoder = FrameEncoder::new(Vec::with_capacity(data.len() / 2));
                encoder
                    .write_all(&data)
                    .map_err(|e| CodecError::Compress(e.to_string()))?;
                encoder
                    .finish()
                    .map_err(|e| CodecError::Compress(e.to_string()))
            }
        }
    }

    pub fn decompress(self, data: &[u8]) -> CodecResult<Vec<u8>> {
        match self {
            Self::None => Ok(data.to_vec()),
            Self::Lz4 => {
                let mut decoder = FrameDecoder::new(data);
                let mut out = Vec::new();
                decoder
                    .read_to_end(&mut out)
                    .map_err(|e| CodecError::Decompress(e.to_string()))?;
                Ok(out)
            }
        }
    }
}

/// Encode a value to its payload byte string.
///
/// The value is serialized to CBOR and, under [`Compression::Lz4`], wrapped
/// in an LZ4 frame. The encoding is not deterministic across builds (map
/// ordering and float shortening may vary); equality of payloads must never
/// be used as equality of values.
pub fn encode_value<T: Serialize>(value: &T, compression: Compression) -> CodecResult<Vec<u8>> {
    let mut cbor = Vec::new();
    ciborium::ser::into_writer(value, &mut cbor).map_err(|e| CodecError::Encode(e.to_string()))?;
    compression.compress(cbor)
}

/// Decode a payload byte string back into a value.
///
/// `compression` must be the mode recovered from the envelope's verified
/// flags byte. Decoding is defensive: the CBOR reader bounds its recursion
/// and every length is checked against the input, so arbitrary bytes fail
/// cleanly rather than aborting the process.
pub fn decode_value<T: DeserializeOwned>(bytes: &[u8], compression: Compression) -> CodecResult<T> {
    let plain;
    let cbor: &[u8] = match compression {
        Compression::None => bytes,
        Compression::Lz4 => {
            plain = compression.decompress(bytes)?;
            &plain
        }
    };
    ciborium::de::from_reader(cbor).map_err(|e| CodecError::Decode(e.to_string()))
}

/// Unwrap an LZ4-framed payload to the plain CBOR stream.
pub fn decompress(bytes: &[u8]) -> CodecResult<Vec<u8>> {
    Compression::Lz4.decompress(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Profile {
        gold: u64,
        name: String,
    }

    // Same wire shape as Profile plus one appended optional field.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct ProfileV2 {
        gold: u64,
        name: String,
        #[serde(default)]
        title: Option<String>,
    }

    fn sample() -> Profile {
        Profile {
            gold: 42,
            name: "Ada".into(),
        }
    }

    #[test]
    fn roundtrip_uncompressed() {
        let bytes = encode_value(&sample(), Compression::None).unwrap();
        let back: Profile = decode_value(&bytes, Compression::None).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn roundtrip_lz4() {
        let bytes = encode_value(&sample(), Compression::Lz4).unwrap();
        let back: Profile = decode_value(&bytes, Compression::Lz4).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn lz4_stream_differs_from_plain() {
        let plain = encode_value(&sample(), Compression::None).unwrap();
        let framed = encode_value(&sample(), Compression::Lz4).unwrap();
        assert_ne!(plain, framed);
        assert_eq!(decompress(&framed).unwrap(), plain);
    }

    #[test]
    fn additive_field_is_readable_by_new_schema() {
        let bytes = encode_value(&sample(), Compression::None).unwrap();
        let v2: ProfileV2 = decode_value(&bytes, Compression::None).unwrap();
        assert_eq!(v2.gold, 42);
        assert_eq!(v2.name, "Ada");
        assert_eq!(v2.title, None);
    }

    #[test]
    fn uncompressed_stream_is_plain_cbor() {
        // A foreign CBOR reader (here: ciborium's generic Value) must be able
        // to consume the stream without knowing the Rust type.
        let bytes = encode_value(&sample(), Compression::None).unwrap();
        let value: ciborium::Value = ciborium::de::from_reader(bytes.as_slice()).unwrap();
        let map = value.into_map().unwrap();
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn garbage_bytes_fail_cleanly() {
        let err = decode_value::<Profile>(&[0xff; 16], Compression::None).unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));

        let err = decode_value::<Profile>(&[0xff; 16], Compression::Lz4).unwrap_err();
        assert!(matches!(err, CodecError::Decompress(_)));
    }

    #[test]
    fn works_for_private_types() {
        // Profile is not exported from this module; encode/decode only
        // require serde bounds, never public visibility.
        mod inner {
            use serde::{Deserialize, Serialize};
            #[derive(Debug, PartialEq, Serialize, Deserialize)]
            pub(super) struct Hidden {
                pub(super) n: i32,
            }
        }
        let v = inner::Hidden { n: 7 };
        let bytes = encode_value(&v, Compression::None).unwrap();
        let back: inner::Hidden = decode_value(&bytes, Compression::None).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn large_payload_compresses() {
        let v: Vec<String> = std::iter::repeat("repetition".to_string()).take(1000).collect();
        let plain = encode_value(&v, Compression::None).unwrap();
        let framed = encode_value(&v, Compression::Lz4).unwrap();
        assert!(framed.len() < plain.len());
        let back: Vec<String> = decode_value(&framed, Compression::Lz4).unwrap();
        assert_eq!(back, v);
    }
}
