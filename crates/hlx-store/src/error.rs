use std::path::PathBuf;

use thiserror::Error;

use hlx_codec::CodecError;
use hlx_envelope::EnvelopeError;
use hlx_keys::KeyError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no snapshot at {path} (no backup either)")]
    NotFound { path: PathBuf },

    #[error("envelope rejected: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("payload decode failed: {0}")]
    Codec(#[from] CodecError),

    #[error("key unavailable: {0}")]
    Key(#[from] KeyError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
