//! Error types for eln-proof

use thiserror::Error;

/// Error raised by a collaborator store
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Shown to users for failures that could leak internal details
pub const GENERIC_USER_MESSAGE: &str =
    "The timestamp could not be created because of an internal error. It has been logged.";

/// Errors surfaced by the timestamping workflows
#[derive(Error, Debug)]
pub enum Error {
    /// The entity's status does not allow timestamping
    #[error("This entity cannot be timestamped in its current status: {0}")]
    NotTimestampable(String),

    /// The entity already carries a timestamp
    #[error("This entity is already timestamped: {0}")]
    AlreadyTimestamped(String),

    /// Another timestamp attempt for the entity is running
    #[error("A timestamp is already being created for this entity: {0}")]
    AttemptInProgress(String),

    /// Network or credentials problem with the TSA
    #[error("Could not reach the timestamping authority: {0}")]
    TsaUnreachable(String),

    /// The TSA response failed verification
    #[error("The timestamp response could not be verified: {0}")]
    InvalidProof(String),

    /// The verified response carried no usable time
    #[error("Could not read the time from the timestamp response: {0}")]
    TimeExtraction(String),

    /// Configured digest algorithm is not supported
    #[error("Unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The Bloxberg service refused or failed
    #[error("Bloxberg error: {0}")]
    ImproperAction(String),

    /// The document to timestamp could not be obtained
    #[error("Could not read the document to timestamp: {0}")]
    UnreadableInput(String),

    /// Timestamping is misconfigured
    #[error("Configuration error: {0}")]
    Config(String),

    /// A collaborator store failed
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Unexpected internal failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Message safe to show to the user who started the action
    ///
    /// User-correctable and validation errors carry their own message; the
    /// rest get [`GENERIC_USER_MESSAGE`] so that paths and configuration stay
    /// out of the UI.
    pub fn user_message(&self) -> String {
        match self {
            Error::NotTimestampable(_)
            | Error::AlreadyTimestamped(_)
            | Error::AttemptInProgress(_)
            | Error::TsaUnreachable(_)
            | Error::InvalidProof(_)
            | Error::TimeExtraction(_)
            | Error::UnsupportedAlgorithm(_)
            | Error::ImproperAction(_) => self.to_string(),
            _ => GENERIC_USER_MESSAGE.to_string(),
        }
    }
}

impl From<eln_proof_tsa::Error> for Error {
    fn from(e: eln_proof_tsa::Error) -> Self {
        use eln_proof_tsa::Error as Tsa;
        match e {
            Tsa::UnsupportedAlgorithm(m) => Error::UnsupportedAlgorithm(m),
            Tsa::TsaUnreachable(m) => Error::TsaUnreachable(m),
            Tsa::InvalidProof(m) => Error::InvalidProof(m),
            Tsa::TimeExtraction(m) => Error::TimeExtraction(m),
            Tsa::Config(m) | Tsa::Certificate(m) => Error::Config(m),
            Tsa::Io(e) => Error::Io(e),
            other @ (Tsa::InvalidDigest(_) | Tsa::Asn1(_) | Tsa::Verification(_)) => {
                Error::Internal(other.to_string())
            }
        }
    }
}

impl From<eln_proof_bloxberg::Error> for Error {
    fn from(e: eln_proof_bloxberg::Error) -> Self {
        match e {
            eln_proof_bloxberg::Error::ImproperAction(m) => Error::ImproperAction(m),
            eln_proof_bloxberg::Error::Archive(m) => Error::ImproperAction(m),
            eln_proof_bloxberg::Error::Io(e) => Error::Io(e),
        }
    }
}

impl From<eln_proof_crypto::Error> for Error {
    fn from(e: eln_proof_crypto::Error) -> Self {
        match e {
            eln_proof_crypto::Error::UnreadableInput(m) => Error::UnreadableInput(m),
            other => Error::Config(format!("credential decryption failed: {}", other)),
        }
    }
}

impl From<eln_proof_types::Error> for Error {
    fn from(e: eln_proof_types::Error) -> Self {
        match e {
            eln_proof_types::Error::UnsupportedAlgorithm(m) => Error::UnsupportedAlgorithm(m),
            other => Error::Internal(other.to_string()),
        }
    }
}

/// Result type for timestamping workflows
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Error::NotTimestampable("experiments:1".into()))]
    #[case(Error::TsaUnreachable("connection refused".into()))]
    #[case(Error::InvalidProof("imprint mismatch".into()))]
    #[case(Error::ImproperAction("500".into()))]
    fn test_user_correctable_errors_show_their_message(#[case] err: Error) {
        assert_eq!(err.user_message(), err.to_string());
    }

    #[rstest]
    #[case(Error::Config("/etc/eln/certs/dfn.pem: permission denied".into()))]
    #[case(Error::Internal("ASN.1 error".into()))]
    #[case(Error::Store("deadlock on uploads".into()))]
    fn test_internal_errors_are_opaque(#[case] err: Error) {
        let message = err.user_message();
        assert_eq!(message, GENERIC_USER_MESSAGE);
        assert!(!message.contains("/etc"));
    }

    #[test]
    fn test_tsa_errors_keep_their_category() {
        let err: Error = eln_proof_tsa::Error::TsaUnreachable("timeout".into()).into();
        assert!(matches!(err, Error::TsaUnreachable(_)));
        let err: Error = eln_proof_tsa::Error::Verification("openssl missing".into()).into();
        assert!(matches!(err, Error::Internal(_)));
    }
}
