//! Collaborator interfaces implemented by the hosting application

use crate::config::{InstanceSettings, TimestampSettings};
use crate::error::StoreError;
use eln_proof_types::{
    EntityMetadata, EntityRef, EvidenceRecord, LockCommit, LockState, NewEvidence, RenderedDocument,
    TeamId,
};

/// Entity storage and rendering
pub trait EntityStore: Send + Sync {
    /// Whether the entity's current status is flagged timestampable
    fn is_timestampable(&self, entity: &EntityRef) -> Result<bool, StoreError>;

    fn lock_state(&self, entity: &EntityRef) -> Result<LockState, StoreError>;

    fn metadata(&self, entity: &EntityRef) -> Result<EntityMetadata, StoreError>;

    /// Render the entity to PDF
    fn rendered_document(&self, entity: &EntityRef) -> Result<RenderedDocument, StoreError>;

    /// Lock and mark the entity timestamped in one write
    fn commit_lock(&self, entity: &EntityRef, commit: &LockCommit) -> Result<(), StoreError>;
}

/// Upload storage for immutable evidence files
pub trait EvidenceStore: Send + Sync {
    fn create_evidence_record(&self, evidence: NewEvidence) -> Result<EvidenceRecord, StoreError>;
}

/// Persisted timestamping settings
pub trait ConfigStore: Send + Sync {
    fn instance_settings(&self) -> Result<InstanceSettings, StoreError>;

    /// Team override, `None` when the team has not configured one
    fn team_settings(&self, team: TeamId) -> Result<Option<TimestampSettings>, StoreError>;
}
