use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("no user-local application data directory on this platform")]
    NoAppDataDir,

    #[error("current executable has no usable file name")]
    NoProgramIdentity,

    #[error("key file {path} holds {len} bytes, expected 32")]
    MalformedKeyFile { path: PathBuf, len: usize },

    #[error("system entropy source failed: {0}")]
    Entropy(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type KeyResult<T> = Result<T, KeyError>;
