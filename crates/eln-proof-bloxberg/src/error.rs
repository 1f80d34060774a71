//! Error types for eln-proof-bloxberg

use thiserror::Error;

/// Errors that can occur while notarizing with Bloxberg
#[derive(Error, Debug)]
pub enum Error {
    /// The notary or its key service refused or failed a request
    #[error("Bloxberg request failed: {0}")]
    ImproperAction(String),

    /// The proof archive could not be read or augmented
    #[error("Proof archive error: {0}")]
    Archive(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Error::Archive(e.to_string())
    }
}

/// Result type for Bloxberg operations
pub type Result<T> = std::result::Result<T, Error>;
