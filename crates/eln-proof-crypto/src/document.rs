//! A rendered document frozen together with its digest

use crate::error::{Error, Result};
use crate::hash;
use eln_proof_types::{EntityRef, HashAlgorithm, HashOutput, RenderedDocument};
use std::path::Path;

/// Document bytes and the digest that will be submitted for timestamping
///
/// The bytes cannot be changed after hashing, so the digest always refers to
/// exactly the bytes that are later stored as the timestamped snapshot.
#[derive(Debug, Clone)]
pub struct HashedDocument {
    document: RenderedDocument,
    digest: HashOutput,
}

impl HashedDocument {
    /// Hash a rendered document
    pub fn new(document: RenderedDocument, algorithm: HashAlgorithm) -> Result<Self> {
        if document.bytes.is_empty() {
            return Err(Error::UnreadableInput(format!(
                "rendered document for {} is empty",
                document.entity
            )));
        }
        let digest = hash::digest(algorithm, &document.bytes);
        tracing::debug!(
            entity = %document.entity,
            algorithm = %algorithm,
            digest = %digest.to_hex(),
            "hashed document"
        );
        Ok(Self { document, digest })
    }

    /// Read a document the renderer left on disk and hash it
    pub fn from_file(
        entity: EntityRef,
        filename: impl Into<String>,
        path: impl AsRef<Path>,
        algorithm: HashAlgorithm,
    ) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| Error::UnreadableInput(format!("{}: {}", path.display(), e)))?;
        Self::new(
            RenderedDocument {
                entity,
                filename: filename.into(),
                bytes,
            },
            algorithm,
        )
    }

    pub fn document(&self) -> &RenderedDocument {
        &self.document
    }

    pub fn bytes(&self) -> &[u8] {
        &self.document.bytes
    }

    pub fn digest(&self) -> &HashOutput {
        &self.digest
    }

    pub fn digest_hex(&self) -> String {
        self.digest.to_hex()
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.digest.algorithm
    }
}
