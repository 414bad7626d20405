//! Unified error types for hoard.
//!
//! Cache-semantics conditions (not found, malformed record) are absorbed by
//! the store; only storage faults and origin transport failures reach callers.

/// Unified error types for the hoard proxy.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Target URL could not be used to build a request descriptor.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// A stored record exists but does not decode into a valid response.
    #[error("MALFORMED_RECORD: {0}")]
    MalformedRecord(String),

    /// Filesystem failure other than a missing entry.
    #[error("STORAGE_ERROR: {0}")]
    Storage(#[from] std::io::Error),

    /// Record could not be serialized.
    #[error("ENCODE_ERROR: {0}")]
    Encode(#[from] serde_json::Error),

    /// Origin could not be reached or its response could not be read.
    #[error("ORIGIN_ERROR: {0}")]
    Origin(String),
}

impl Error {
    /// Stable code prefix for the error variant.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::MalformedRecord(_) => "MALFORMED_RECORD",
            Error::Storage(_) => "STORAGE_ERROR",
            Error::Encode(_) => "ENCODE_ERROR",
            Error::Origin(_) => "ORIGIN_ERROR",
        }
    }
}
