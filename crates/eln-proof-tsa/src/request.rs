//! Building RFC 3161 TimeStampReq messages from document digests

use crate::asn1::{MessageImprint, TimeStampReq};
use crate::error::{Error, Result};
use eln_proof_types::{HashAlgorithm, HashOutput};

/// Whether requests carry a nonce
///
/// Requests omit the nonce by default, matching `openssl ts -query -no_nonce`:
/// several TSAs in use mishandle nonces, and every attempt still builds a
/// fresh request so there is no reuse across attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NoncePolicy {
    #[default]
    Omit,
    Random,
}

/// A DER-encoded TimeStampReq together with what it asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampRequest {
    digest: HashOutput,
    nonce_requested: bool,
    der: Vec<u8>,
}

impl TimestampRequest {
    pub fn digest(&self) -> &HashOutput {
        &self.digest
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.digest.algorithm
    }

    pub fn nonce_requested(&self) -> bool {
        self.nonce_requested
    }

    /// The request body to post to the TSA
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }
}

/// Builds one TimeStampReq per timestamping attempt
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampRequestBuilder {
    nonce: NoncePolicy,
}

impl TimestampRequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nonce_policy(mut self, nonce: NoncePolicy) -> Self {
        self.nonce = nonce;
        self
    }

    /// Build a request for a hex digest computed with the named algorithm
    ///
    /// Fails with [`Error::UnsupportedAlgorithm`] for anything but sha256,
    /// sha384 and sha512.
    pub fn build(&self, digest_hex: &str, algorithm: &str) -> Result<TimestampRequest> {
        let algorithm = HashAlgorithm::from_name(algorithm)?;
        let digest = HashOutput::from_hex(algorithm, digest_hex)?;
        self.build_for(digest)
    }

    /// Build a request for an already decoded digest
    pub fn build_for(&self, digest: HashOutput) -> Result<TimestampRequest> {
        if digest.digest.len() != digest.algorithm.digest_size() {
            return Err(Error::InvalidDigest(format!(
                "{} digest must be {} bytes, got {}",
                digest.algorithm,
                digest.algorithm.digest_size(),
                digest.digest.len()
            )));
        }

        let imprint = MessageImprint::for_digest(&digest)
            .map_err(|e| Error::Asn1(format!("failed to build message imprint: {}", e)))?;

        let request = match self.nonce {
            NoncePolicy::Omit => TimeStampReq::new(imprint, None),
            NoncePolicy::Random => TimeStampReq::with_random_nonce(imprint)
                .map_err(|e| Error::Asn1(format!("failed to encode nonce: {}", e)))?,
        };

        let der = request
            .to_der()
            .map_err(|e| Error::Asn1(format!("failed to encode request: {}", e)))?;

        tracing::debug!(
            algorithm = %digest.algorithm,
            nonce = request.nonce.is_some(),
            len = der.len(),
            "built timestamp request"
        );

        Ok(TimestampRequest {
            digest,
            nonce_requested: request.nonce.is_some(),
            der,
        })
    }
}
