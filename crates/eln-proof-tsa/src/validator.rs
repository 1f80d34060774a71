//! Timestamp response validation with a primary and a fallback engine

use crate::error::{Error, Result};
use crate::openssl::OpensslVerifier;
use crate::report::{self, VerificationReport};
use crate::verify::NativeVerifier;
use eln_proof_types::HashOutput;
use std::path::{Path, PathBuf};

/// How a verification engine failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The engine cannot handle this token although it may be valid
    /// (strict DER rejection of BER, unsupported algorithm, OpenSSL ESS bug)
    KnownInterop,
    /// The token is not a valid proof over the document
    Invalid,
    /// The engine could not run at all
    Unavailable,
}

/// Failure reported by a [`ProofVerifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl VerifyFailure {
    pub fn known_interop(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::KnownInterop,
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Invalid,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Unavailable,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for VerifyFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Everything an engine may need to check one token
///
/// The token and document are given both in memory and as files on disk
/// because the external engine only works on files.
#[derive(Debug, Clone, Copy)]
pub struct ProofInput<'a> {
    /// Raw TimeStampResp bytes
    pub token: &'a [u8],
    pub token_path: &'a Path,
    /// The exact document bytes that were hashed
    pub document_path: &'a Path,
    /// Digest submitted to the TSA
    pub digest: &'a HashOutput,
    /// PEM chain of the TSA
    pub chain_path: &'a Path,
}

/// One verification engine
pub trait ProofVerifier: Send + Sync {
    fn name(&self) -> &'static str;

    fn verify(&self, input: &ProofInput<'_>) -> std::result::Result<VerificationReport, VerifyFailure>;
}

/// Which engine runs first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidatorOrder {
    #[default]
    NativeFirst,
    OpensslFirst,
}

/// Verifies a TSA response and extracts the asserted time
///
/// The fallback engine only runs when the primary one reports a
/// [`FailureKind::KnownInterop`] failure, and then exactly once. A proof the
/// primary engine finds invalid is rejected without consulting the fallback.
pub struct TimestampResponseValidator {
    primary: Box<dyn ProofVerifier>,
    fallback: Option<Box<dyn ProofVerifier>>,
}

impl TimestampResponseValidator {
    pub fn new(primary: Box<dyn ProofVerifier>, fallback: Option<Box<dyn ProofVerifier>>) -> Self {
        Self { primary, fallback }
    }

    /// Assemble the engines available on this host
    ///
    /// Runs `openssl version` once. When it cannot be run, the native
    /// engine is used alone regardless of `order`.
    pub fn detect(order: ValidatorOrder, openssl_binary: impl Into<PathBuf>) -> Self {
        let openssl = OpensslVerifier::new(openssl_binary);
        let openssl = match openssl.version() {
            Ok(version) => {
                tracing::info!(version = %version, "OpenSSL verification engine available");
                Some(openssl)
            }
            Err(e) => {
                tracing::warn!("OpenSSL verification engine unavailable: {}", e);
                None
            }
        };

        let native: Box<dyn ProofVerifier> = Box::new(NativeVerifier::new());
        match (order, openssl) {
            (ValidatorOrder::NativeFirst, Some(openssl)) => Self::new(native, Some(Box::new(openssl))),
            (ValidatorOrder::OpensslFirst, Some(openssl)) => Self::new(Box::new(openssl), Some(native)),
            (_, None) => Self::new(native, None),
        }
    }

    /// Engine names, primary first
    pub fn engines(&self) -> Vec<&'static str> {
        std::iter::once(self.primary.name())
            .chain(self.fallback.as_ref().map(|f| f.name()))
            .collect()
    }

    /// Verify a token against the document digest and the TSA chain
    pub fn verify(&self, input: &ProofInput<'_>) -> Result<VerificationReport> {
        let failure = match self.primary.verify(input) {
            Ok(report) => {
                tracing::debug!(engine = report.engine, "timestamp response verified");
                return Ok(report);
            }
            Err(failure) => failure,
        };

        match (failure.kind, &self.fallback) {
            (FailureKind::KnownInterop, Some(fallback)) => {
                tracing::warn!(
                    primary = self.primary.name(),
                    fallback = fallback.name(),
                    "primary engine hit a known interoperability defect ({}), retrying with fallback",
                    failure.message
                );
                fallback.verify(input).map_err(|second| {
                    tracing::error!(engine = fallback.name(), "fallback verification failed: {}", second);
                    into_error(second)
                })
            }
            (FailureKind::KnownInterop, None) => Err(Error::InvalidProof(format!(
                "{} (no fallback engine available)",
                failure.message
            ))),
            _ => {
                tracing::error!(engine = self.primary.name(), "verification failed: {}", failure);
                Err(into_error(failure))
            }
        }
    }

    /// Canonical `YYYY-MM-DD HH:MM:SS` time asserted by a verified token
    pub fn extract_time(&self, report: &VerificationReport) -> Result<String> {
        report::extract_time(&report.text)
    }
}

impl std::fmt::Debug for TimestampResponseValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimestampResponseValidator")
            .field("engines", &self.engines())
            .finish()
    }
}

fn into_error(failure: VerifyFailure) -> Error {
    match failure.kind {
        FailureKind::Unavailable => Error::Verification(failure.message),
        FailureKind::KnownInterop | FailureKind::Invalid => Error::InvalidProof(failure.message),
    }
}
