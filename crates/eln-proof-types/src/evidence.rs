//! Rendered documents and the evidence records derived from them

use crate::entity::{EntityRef, UserId};
use crate::hash::{HashAlgorithm, HashOutput};
use serde::{Deserialize, Serialize};

/// A rendered PDF of an entity, as produced by the rendering collaborator
#[derive(Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    /// The entity the document was rendered from
    pub entity: EntityRef,
    /// Human-readable file name, e.g. `2024-03-01-my-experiment.pdf`
    pub filename: String,
    /// Document bytes
    pub bytes: Vec<u8>,
}

impl RenderedDocument {
    /// File name without its extension
    pub fn stem(&self) -> &str {
        match self.filename.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.filename,
        }
    }
}

impl std::fmt::Debug for RenderedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedDocument")
            .field("entity", &self.entity)
            .field("filename", &self.filename)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Type of an immutable evidence file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvidenceKind {
    /// Raw RFC 3161 TimeStampResp
    TimestampToken,
    /// The exact PDF bytes that were hashed and timestamped
    TimestampedPdf,
    /// Bloxberg proof archive with the timestamped PDF injected
    BloxbergProof,
}

impl EvidenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceKind::TimestampToken => "timestamp-token",
            EvidenceKind::TimestampedPdf => "timestamped-pdf",
            EvidenceKind::BloxbergProof => "bloxberg-proof",
        }
    }
}

/// Evidence to persist, handed to the evidence store
#[derive(Clone, PartialEq, Eq)]
pub struct NewEvidence {
    pub entity: EntityRef,
    pub user_id: UserId,
    pub kind: EvidenceKind,
    /// Name shown to users
    pub real_name: String,
    pub bytes: Vec<u8>,
    /// Hash of `bytes`, stored for tamper detection
    pub hash: HashOutput,
}

impl std::fmt::Debug for NewEvidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewEvidence")
            .field("entity", &self.entity)
            .field("kind", &self.kind)
            .field("real_name", &self.real_name)
            .field("len", &self.bytes.len())
            .field("hash", &self.hash.to_hex())
            .finish()
    }
}

/// A persisted evidence record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub id: u64,
    pub real_name: String,
    /// Storage key of the file
    pub long_name: String,
    pub entity: EntityRef,
    pub user_id: UserId,
    pub kind: EvidenceKind,
    /// Hex digest of the stored bytes
    pub hash: String,
    pub hash_algorithm: HashAlgorithm,
}
