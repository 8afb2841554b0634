use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("value encoding failed: {0}")]
    Encode(String),

    #[error("value decoding failed: {0}")]
    Decode(String),

    #[error("compression failed: {0}")]
    Compress(String),

    #[error("decompression failed: {0}")]
    Decompress(String),
}

pub type CodecResult<T> = Result<T, CodecError>;
