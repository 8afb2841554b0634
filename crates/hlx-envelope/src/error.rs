use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("envelope too short: {actual} bytes, minimum is {min}", min = crate::format::MIN_ENVELOPE_LEN)]
    TooShort { actual: usize },

    #[error("bad magic; not an HLX envelope")]
    BadMagic,

    #[error("unsupported envelope version: {0}")]
    BadVersion(u16),

    #[error("reserved flag bits set: {0:#04x}")]
    BadFlags(u8),

    #[error("type digest does not match the expected type")]
    TypeMismatch,

    #[error("framing mismatch: header declares {declared} payload bytes, file carries {actual}")]
    FramingMismatch { declared: i64, actual: usize },

    #[error("MAC verification failed")]
    MacFailed,

    #[error("payload is empty")]
    EmptyPayload,

    #[error("payload of {0} bytes exceeds the format's 2 GiB limit")]
    PayloadTooLarge(usize),
}

pub type EnvelopeResult<T> = Result<T, EnvelopeError>;
