//! Digest algorithm types and utilities

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Digest algorithms accepted by the request builder and the supported TSAs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA2-256
    #[default]
    Sha256,
    /// SHA2-384
    Sha384,
    /// SHA2-512
    Sha512,
}

impl HashAlgorithm {
    /// Every supported algorithm, in increasing digest size
    pub const ALL: [HashAlgorithm; 3] = [
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
    ];

    /// Lowercase name as used in configuration and by `openssl ts`
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    /// Parse an algorithm name, rejecting anything outside the supported set
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha384" => Ok(HashAlgorithm::Sha384),
            "sha512" => Ok(HashAlgorithm::Sha512),
            _ => Err(Error::UnsupportedAlgorithm(name.to_string())),
        }
    }

    /// Parse a configured algorithm name, falling back to sha256 when invalid
    pub fn from_name_or_default(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|_| {
            tracing::warn!(
                configured = name,
                "invalid digest algorithm in configuration, using sha256"
            );
            HashAlgorithm::default()
        })
    }

    /// Get the digest size in bytes for this algorithm
    pub fn digest_size(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// Get the OID for this algorithm
    pub fn oid(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "2.16.840.1.101.3.4.2.1",
            HashAlgorithm::Sha384 => "2.16.840.1.101.3.4.2.2",
            HashAlgorithm::Sha512 => "2.16.840.1.101.3.4.2.3",
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

/// A digest with the algorithm that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashOutput {
    /// The algorithm used to produce this hash
    pub algorithm: HashAlgorithm,
    /// The hash digest bytes
    pub digest: Vec<u8>,
}

impl HashOutput {
    /// Create a new hash output
    pub fn new(algorithm: HashAlgorithm, digest: Vec<u8>) -> Self {
        Self { algorithm, digest }
    }

    /// Decode a hex digest, checking its length against the algorithm
    pub fn from_hex(algorithm: HashAlgorithm, digest_hex: &str) -> Result<Self> {
        let digest = hex::decode(digest_hex.trim())
            .map_err(|e| Error::InvalidDigest(format!("not valid hex: {}", e)))?;
        if digest.len() != algorithm.digest_size() {
            return Err(Error::InvalidDigest(format!(
                "{} digest must be {} bytes, got {}",
                algorithm,
                algorithm.digest_size(),
                digest.len()
            )));
        }
        Ok(Self { algorithm, digest })
    }

    /// Get the digest as a lowercase hex string
    pub fn to_hex(&self) -> String {
        hex::encode(&self.digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("sha256", HashAlgorithm::Sha256)]
    #[case("SHA384", HashAlgorithm::Sha384)]
    #[case(" sha512 ", HashAlgorithm::Sha512)]
    fn test_from_name_accepts_supported(#[case] name: &str, #[case] expected: HashAlgorithm) {
        assert_eq!(HashAlgorithm::from_name(name).unwrap(), expected);
    }

    #[rstest]
    #[case("md5")]
    #[case("sha1")]
    #[case("sha-256")]
    #[case("")]
    fn test_from_name_rejects_others(#[case] name: &str) {
        assert_eq!(
            HashAlgorithm::from_name(name),
            Err(Error::UnsupportedAlgorithm(name.to_string()))
        );
    }

    #[test]
    fn test_invalid_configured_algorithm_defaults_to_sha256() {
        assert_eq!(HashAlgorithm::from_name_or_default("whirlpool"), HashAlgorithm::Sha256);
        assert_eq!(HashAlgorithm::from_name_or_default("sha512"), HashAlgorithm::Sha512);
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&HashAlgorithm::Sha384).unwrap();
        assert_eq!(json, "\"sha384\"");
        let parsed: HashAlgorithm = serde_json::from_str("\"sha512\"").unwrap();
        assert_eq!(parsed, HashAlgorithm::Sha512);
    }

    #[test]
    fn test_from_hex_checks_length() {
        let ok = HashOutput::from_hex(HashAlgorithm::Sha256, &"ab".repeat(32)).unwrap();
        assert_eq!(ok.digest.len(), 32);
        assert_eq!(ok.to_hex(), "ab".repeat(32));

        let err = HashOutput::from_hex(HashAlgorithm::Sha384, &"ab".repeat(32)).unwrap_err();
        assert!(matches!(err, Error::InvalidDigest(_)));

        let err = HashOutput::from_hex(HashAlgorithm::Sha256, "zz").unwrap_err();
        assert!(matches!(err, Error::InvalidDigest(_)));
    }
}
