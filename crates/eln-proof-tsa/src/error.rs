//! Error types for eln-proof-tsa

use thiserror::Error;

/// Errors that can occur in TSA operations
#[derive(Error, Debug)]
pub enum Error {
    /// Digest algorithm outside sha256/sha384/sha512
    #[error("Unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Digest does not fit the requested algorithm
    #[error("Invalid digest: {0}")]
    InvalidDigest(String),

    /// ASN.1 encoding/decoding error
    #[error("ASN.1 error: {0}")]
    Asn1(String),

    /// The TSA could not be reached or answered with a non-success status
    #[error("TSA unreachable: {0}")]
    TsaUnreachable(String),

    /// Both verification engines rejected the response
    #[error("Invalid timestamp proof: {0}")]
    InvalidProof(String),

    /// A verification engine could not run
    #[error("Timestamp verification error: {0}")]
    Verification(String),

    /// The verified response has no usable time assertion
    #[error("Could not extract timestamp time: {0}")]
    TimeExtraction(String),

    /// Certificate chain could not be loaded
    #[error("Certificate error: {0}")]
    Certificate(String),

    /// Invalid TSA configuration
    #[error("Invalid TSA configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<eln_proof_types::Error> for Error {
    fn from(e: eln_proof_types::Error) -> Self {
        match e {
            eln_proof_types::Error::UnsupportedAlgorithm(name) => Error::UnsupportedAlgorithm(name),
            other => Error::InvalidDigest(other.to_string()),
        }
    }
}

/// Result type for TSA operations
pub type Result<T> = std::result::Result<T, Error>;
