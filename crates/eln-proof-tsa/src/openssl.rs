//! Verification through the `openssl ts` command line tool

use crate::error::{Error, Result};
use crate::report::VerificationReport;
use crate::validator::{FailureKind, ProofInput, ProofVerifier, VerifyFailure};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::{Command, Output};

/// Verifies tokens by running `openssl ts -verify` on the scratch files
#[derive(Debug, Clone)]
pub struct OpensslVerifier {
    binary: PathBuf,
}

impl Default for OpensslVerifier {
    fn default() -> Self {
        Self::new("openssl")
    }
}

impl OpensslVerifier {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Run `openssl version` and return its output
    pub fn version(&self) -> Result<String> {
        let output = Command::new(&self.binary).arg("version").output()?;
        if !output.status.success() {
            return Err(Error::Verification(format!(
                "{} version exited with {}",
                self.binary.display(),
                output.status
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn run<I, S>(&self, args: I) -> std::result::Result<Output, VerifyFailure>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        Command::new(&self.binary).args(args).output().map_err(|e| {
            VerifyFailure::unavailable(format!("failed to run {}: {}", self.binary.display(), e))
        })
    }
}

impl ProofVerifier for OpensslVerifier {
    fn name(&self) -> &'static str {
        "openssl"
    }

    fn verify(&self, input: &ProofInput<'_>) -> std::result::Result<VerificationReport, VerifyFailure> {
        let verify = self.run([
            OsStr::new("ts"),
            OsStr::new("-verify"),
            OsStr::new("-data"),
            input.document_path.as_os_str(),
            OsStr::new("-in"),
            input.token_path.as_os_str(),
            OsStr::new("-CAfile"),
            input.chain_path.as_os_str(),
        ])?;

        if !verify.status.success() {
            let combined = format!(
                "{}{}",
                String::from_utf8_lossy(&verify.stdout),
                String::from_utf8_lossy(&verify.stderr)
            );
            let message = format!("openssl ts -verify failed: {}", combined.trim());
            return Err(match classify_openssl_failure(&combined) {
                FailureKind::KnownInterop => VerifyFailure::known_interop(message),
                FailureKind::Unavailable => VerifyFailure::unavailable(message),
                FailureKind::Invalid => VerifyFailure::invalid(message),
            });
        }
        tracing::debug!("openssl ts -verify succeeded");

        let reply = self.run([
            OsStr::new("ts"),
            OsStr::new("-reply"),
            OsStr::new("-in"),
            input.token_path.as_os_str(),
            OsStr::new("-text"),
        ])?;
        if !reply.status.success() {
            return Err(VerifyFailure::unavailable(format!(
                "openssl ts -reply failed: {}",
                String::from_utf8_lossy(&reply.stderr).trim()
            )));
        }

        Ok(VerificationReport::new(
            self.name(),
            String::from_utf8_lossy(&reply.stdout).into_owned(),
        ))
    }
}

/// Sort `openssl ts -verify` output into a failure kind
///
/// OpenSSL rejects some valid tokens whose ESS signing-certificate attribute
/// it cannot match; those are the only failures another engine may retry.
pub fn classify_openssl_failure(output: &str) -> FailureKind {
    let lower = output.to_ascii_lowercase();
    if lower.contains("ess signing certificate error") || output.contains("TS_CHECK_SIGNING_CERTS") {
        FailureKind::KnownInterop
    } else if lower.contains("invalid command") || lower.contains("unknown option") {
        FailureKind::Unavailable
    } else {
        FailureKind::Invalid
    }
}
