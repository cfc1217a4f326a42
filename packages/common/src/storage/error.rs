use std::fmt;

/// Errors raised by a [`BlobStore`](super::BlobStore) backend.
#[derive(Debug)]
pub enum StorageError {
    /// No blob is stored under the given hash.
    NotFound(String),
    /// Local filesystem failure.
    Io(std::io::Error),
    /// A hash string that is not 64 lowercase hex characters.
    InvalidHash(String),
    /// The blob is larger than the backend accepts.
    SizeLimitExceeded { actual: u64, limit: u64 },
    /// Remote object storage rejected or failed the request.
    Backend(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(hash) => write!(f, "blob not found: {hash}"),
            Self::Io(err) => write!(f, "storage IO error: {err}"),
            Self::InvalidHash(msg) => write!(f, "invalid content hash: {msg}"),
            Self::SizeLimitExceeded { actual, limit } => {
                write!(f, "blob exceeds size limit ({actual} > {limit} bytes)")
            }
            Self::Backend(msg) => write!(f, "object storage error: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
