use std::path::PathBuf;

/// Errors from local store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The on-disk state file exists but cannot be decoded.
    #[error("corrupt state file {path}: {reason}")]
    CorruptState { path: PathBuf, reason: String },

    /// A stored package container failed to encode or decode.
    #[error("package codec error: {0}")]
    Codec(#[from] tws_protocol::ProtocolError),

    /// A lock guarding in-process state was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        StoreError::LockPoisoned(e.to_string())
    }
}
