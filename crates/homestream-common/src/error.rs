//! Common error types used throughout homestream.
//!
//! Covers the failure cases of catalog persistence: missing records,
//! filesystem I/O and document (de)serialization.

/// Common error type for homestream.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested record was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catalog document could not be serialized or parsed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
