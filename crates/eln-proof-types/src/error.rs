//! Error types for eln-proof-types

use thiserror::Error;

/// Errors that can occur when building or validating core types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Digest algorithm outside the supported set
    #[error("unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Digest bytes do not match the algorithm or are not valid hex
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    /// Attempt to undo a terminal lock state
    #[error("entity {0} is timestamped and cannot be unlocked")]
    Immutable(String),
}

/// Result type for core type operations
pub type Result<T> = std::result::Result<T, Error>;
