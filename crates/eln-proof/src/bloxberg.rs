//! Proof-of-existence through the Bloxberg notary

use crate::config::InstanceSettings;
use crate::error::{Error, Result};
use crate::scratch::ScratchDir;
use crate::store::{EntityStore, EvidenceStore};
use eln_proof_bloxberg::{inject_document, BloxbergEndpoints, BloxbergNotary, CertifyMetadata};
use eln_proof_crypto::HashedDocument;
use eln_proof_types::{Actor, EntityRef, EvidenceKind, EvidenceRecord, HashAlgorithm, NewEvidence};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Certifies an entity's rendered document with Bloxberg and stores the proof
///
/// Unlike the RFC 3161 path this does not lock the entity.
pub struct BloxbergWorkflow {
    entities: Arc<dyn EntityStore>,
    evidence: Arc<dyn EvidenceStore>,
    endpoints: BloxbergEndpoints,
    timeout: Duration,
    scratch_root: PathBuf,
}

impl BloxbergWorkflow {
    pub fn new(entities: Arc<dyn EntityStore>, evidence: Arc<dyn EvidenceStore>) -> Self {
        Self {
            entities,
            evidence,
            endpoints: BloxbergEndpoints::production(),
            timeout: eln_proof_bloxberg::DEFAULT_TIMEOUT,
            scratch_root: std::env::temp_dir(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: BloxbergEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = root.into();
        self
    }

    #[tracing::instrument(skip_all, fields(user_id = actor.user_id, entity = %entity))]
    pub async fn run(
        &self,
        entity: EntityRef,
        actor: &Actor,
        instance: &InstanceSettings,
    ) -> Result<EvidenceRecord> {
        let result = self.attempt(entity, actor, instance).await;
        if let Err(e) = &result {
            tracing::error!(user_id = actor.user_id, entity = %entity, "Bloxberg attempt aborted: {}", e);
        }
        result
    }

    async fn attempt(
        &self,
        entity: EntityRef,
        actor: &Actor,
        instance: &InstanceSettings,
    ) -> Result<EvidenceRecord> {
        if !instance.bloxberg_enabled {
            return Err(Error::ImproperAction(
                "Bloxberg timestamping is disabled on this instance".to_string(),
            ));
        }

        let rendered = self
            .entities
            .rendered_document(&entity)
            .map_err(|e| Error::UnreadableInput(e.to_string()))?;
        let stem = rendered.stem().to_string();
        let document = HashedDocument::new(rendered, HashAlgorithm::Sha256)?;
        let metadata = self.entities.metadata(&entity)?;

        let notary = BloxbergNotary::connect(
            self.endpoints.clone(),
            instance.timestamp.proxy.as_deref(),
            self.timeout,
        )
        .await?;
        let certification = notary
            .certify(
                &document.digest_hex(),
                &CertifyMetadata::new(actor.fullname.clone(), metadata.elabid),
            )
            .await?;
        let proof = notary.fetch_proof(&certification).await?;

        let scratch = ScratchDir::new_in(&self.scratch_root)?;
        let archive = inject_document(&proof, document.bytes(), scratch.path())?;

        let record = self.evidence.create_evidence_record(NewEvidence {
            entity,
            user_id: actor.user_id,
            kind: EvidenceKind::BloxbergProof,
            real_name: format!("{}-bloxberg.zip", stem),
            hash: eln_proof_crypto::digest(HashAlgorithm::Sha256, &archive),
            bytes: archive,
        })?;

        tracing::info!(user_id = actor.user_id, entity = %entity, "Bloxberg proof stored");
        Ok(record)
    }
}
