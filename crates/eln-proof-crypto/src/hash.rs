//! Hashing utilities using aws-lc-rs

use crate::error::{Error, Result};
use aws_lc_rs::digest::{self, Context, SHA256, SHA384, SHA512};
use eln_proof_types::{HashAlgorithm, HashOutput};
use std::io::Read;
use std::path::Path;

fn algorithm_for(algorithm: HashAlgorithm) -> &'static digest::Algorithm {
    match algorithm {
        HashAlgorithm::Sha256 => &SHA256,
        HashAlgorithm::Sha384 => &SHA384,
        HashAlgorithm::Sha512 => &SHA512,
    }
}

/// Hash data with the given algorithm
pub fn digest(algorithm: HashAlgorithm, data: &[u8]) -> HashOutput {
    let digest = digest::digest(algorithm_for(algorithm), data);
    HashOutput::new(algorithm, digest.as_ref().to_vec())
}

/// Hash data and return the lowercase hex digest
pub fn hash_hex(data: &[u8], algorithm: HashAlgorithm) -> String {
    digest(algorithm, data).to_hex()
}

/// Hash a file by streaming it from disk
pub fn hash_file(path: impl AsRef<Path>, algorithm: HashAlgorithm) -> Result<HashOutput> {
    let path = path.as_ref();
    let mut file = std::fs::File::open(path)
        .map_err(|e| Error::UnreadableInput(format!("{}: {}", path.display(), e)))?;

    let mut hasher = Hasher::new(algorithm);
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = file
            .read(&mut buf)
            .map_err(|e| Error::UnreadableInput(format!("{}: {}", path.display(), e)))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}

/// Incremental hasher for any supported algorithm
pub struct Hasher {
    algorithm: HashAlgorithm,
    context: Context,
}

impl Hasher {
    /// Create a new hasher
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            context: Context::new(algorithm_for(algorithm)),
        }
    }

    /// Update the hasher with data
    pub fn update(&mut self, data: &[u8]) {
        self.context.update(data);
    }

    /// Finalize and get the digest
    pub fn finalize(self) -> HashOutput {
        let digest = self.context.finish();
        HashOutput::new(self.algorithm, digest.as_ref().to_vec())
    }
}
