/// Error taxonomy shared across the crate
///
/// Every remote-facing operation returns one of these variants. Validation
/// errors are raised before any store call is attempted; transport faults from
/// the document, blob, and identity services map to `LookupFailed` (reads) or
/// `WriteFailed` (mutations) and must be surfaced to the user, never swallowed.
/// Nothing here is fatal to the process.

use std::time::Duration;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The requested map or POI does not exist in any probed namespace
    #[error("not found: {0}")]
    NotFound(String),

    /// A read against the document store failed (transport/backend fault)
    #[error("lookup failed: {0}")]
    LookupFailed(String),

    /// A mutation against the document or blob store failed
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// Caller-supplied data was rejected before any remote call
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// The caller is not allowed to perform this operation
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The device or platform lacks a required capability (e.g. NFC)
    #[error("unsupported capability: {0}")]
    UnsupportedCapability(String),

    /// A remote call exceeded the session's deadline
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
}

impl Error {
    /// Wrap a store read fault
    pub fn lookup(e: impl std::fmt::Display) -> Self {
        Error::LookupFailed(e.to_string())
    }

    /// Wrap a store write fault
    pub fn write(e: impl std::fmt::Display) -> Self {
        Error::WriteFailed(e.to_string())
    }
}
