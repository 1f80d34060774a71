//! Core types for trusted timestamping of ELN entities
//!
//! This crate holds the plain data shared by the request builder, the TSA
//! client, the notary client and the orchestrator: digest algorithms, entity
//! handles and their lock state, and the evidence records persisted after a
//! successful timestamp.

pub mod entity;
pub mod error;
pub mod evidence;
pub mod hash;
pub mod secret;

pub use entity::{
    Actor, EntityId, EntityKind, EntityMetadata, EntityRef, LockCommit, LockState, TeamId, UserId,
};
pub use error::{Error, Result};
pub use evidence::{EvidenceKind, EvidenceRecord, NewEvidence, RenderedDocument};
pub use hash::{HashAlgorithm, HashOutput};
pub use secret::Secret;
