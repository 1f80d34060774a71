//! End-to-end RFC 3161 timestamping of an entity

use crate::config::resolve_config;
use crate::error::{Error, Result};
use crate::scratch::ScratchDir;
use crate::store::{ConfigStore, EntityStore, EvidenceStore};
use eln_proof_crypto::{CredentialCipher, HashedDocument};
use eln_proof_tsa::{
    ProofInput, TimestampConfig, TimestampRequestBuilder, TimestampResponseValidator,
    TimestampTransport,
};
use eln_proof_types::{
    Actor, EntityRef, EvidenceKind, EvidenceRecord, HashAlgorithm, LockCommit, NewEvidence,
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Result of a committed timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampOutcome {
    pub entity: EntityRef,
    /// Time asserted by the TSA, `YYYY-MM-DD HH:MM:SS`
    pub timestamped_when: String,
    pub token: EvidenceRecord,
    /// Snapshot of the exact bytes that were timestamped
    pub document: EvidenceRecord,
    /// Verification engine that accepted the token
    pub engine: &'static str,
}

/// Entities with an attempt currently running
#[derive(Debug, Default, Clone)]
struct InFlight(Arc<Mutex<HashSet<EntityRef>>>);

impl InFlight {
    fn acquire(&self, entity: EntityRef) -> Result<InFlightGuard> {
        let mut running = self.0.lock().unwrap_or_else(|p| p.into_inner());
        if !running.insert(entity) {
            return Err(Error::AttemptInProgress(entity.to_string()));
        }
        Ok(InFlightGuard {
            registry: self.0.clone(),
            entity,
        })
    }
}

struct InFlightGuard {
    registry: Arc<Mutex<HashSet<EntityRef>>>,
    entity: EntityRef,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut running = self.registry.lock().unwrap_or_else(|p| p.into_inner());
        running.remove(&self.entity);
    }
}

/// Runs the timestamp workflow against the hosting application's stores
///
/// Steps run in a fixed order and any failure ends the attempt. Nothing is
/// retried, and the entity is only modified by the final lock commit. A
/// token that fails verification stays stored for audit.
pub struct TimestampOrchestrator {
    entities: Arc<dyn EntityStore>,
    evidence: Arc<dyn EvidenceStore>,
    transport: Arc<dyn TimestampTransport>,
    validator: Arc<TimestampResponseValidator>,
    builder: TimestampRequestBuilder,
    scratch_root: PathBuf,
    in_flight: InFlight,
}

impl TimestampOrchestrator {
    pub fn new(
        entities: Arc<dyn EntityStore>,
        evidence: Arc<dyn EvidenceStore>,
        transport: Arc<dyn TimestampTransport>,
        validator: Arc<TimestampResponseValidator>,
    ) -> Self {
        Self {
            entities,
            evidence,
            transport,
            validator,
            builder: TimestampRequestBuilder::new(),
            scratch_root: std::env::temp_dir(),
            in_flight: InFlight::default(),
        }
    }

    /// Directory under which per-attempt scratch directories are created
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = root.into();
        self
    }

    pub fn with_request_builder(mut self, builder: TimestampRequestBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// Resolve team or instance settings, then timestamp the entity
    #[tracing::instrument(skip_all, fields(user_id = actor.user_id, entity = %entity))]
    pub async fn run_with_settings(
        &self,
        entity: EntityRef,
        actor: &Actor,
        settings: &dyn ConfigStore,
        cipher: &CredentialCipher,
    ) -> Result<TimestampOutcome> {
        let config = settings
            .instance_settings()
            .map_err(Error::Store)
            .and_then(|instance| {
                let team = settings.team_settings(actor.team_id)?;
                resolve_config(&instance, team.as_ref(), cipher)
            });
        match config {
            Ok(config) => self.run(entity, actor, &config).await,
            Err(e) => {
                tracing::error!(user_id = actor.user_id, entity = %entity, "timestamp configuration failed: {}", e);
                Err(e)
            }
        }
    }

    /// Timestamp an entity with an already resolved configuration
    #[tracing::instrument(skip_all, fields(user_id = actor.user_id, entity = %entity))]
    pub async fn run(
        &self,
        entity: EntityRef,
        actor: &Actor,
        config: &TimestampConfig,
    ) -> Result<TimestampOutcome> {
        let result = self.attempt(entity, actor, config).await;
        match &result {
            Ok(outcome) => tracing::info!(
                user_id = actor.user_id,
                entity = %entity,
                when = %outcome.timestamped_when,
                engine = outcome.engine,
                "entity timestamped"
            ),
            Err(e) => tracing::error!(
                user_id = actor.user_id,
                entity = %entity,
                "timestamp attempt aborted: {}",
                e
            ),
        }
        result
    }

    async fn attempt(
        &self,
        entity: EntityRef,
        actor: &Actor,
        config: &TimestampConfig,
    ) -> Result<TimestampOutcome> {
        let _running = self.in_flight.acquire(entity)?;

        // Eligibility
        if !self.entities.is_timestampable(&entity)? {
            return Err(Error::NotTimestampable(entity.to_string()));
        }
        if self.entities.lock_state(&entity)?.timestamped {
            return Err(Error::AlreadyTimestamped(entity.to_string()));
        }

        // Render
        let rendered = self
            .entities
            .rendered_document(&entity)
            .map_err(|e| Error::UnreadableInput(e.to_string()))?;
        let stem = rendered.stem().to_string();

        // Build the request
        let document = HashedDocument::new(rendered, config.digest_algorithm)?;
        let request = self.builder.build_for(document.digest().clone())?;

        let scratch = ScratchDir::new_in(&self.scratch_root)?;
        let document_path = scratch.write("document.pdf", document.bytes())?;
        scratch.write("request.tsq", request.as_der())?;

        // Submit
        let token = self.transport.send(request.as_der(), config).await?;
        let token_path = scratch.write("response.tsr", &token)?;

        // Persist the token before verifying it
        let token_record = self.evidence.create_evidence_record(NewEvidence {
            entity,
            user_id: actor.user_id,
            kind: EvidenceKind::TimestampToken,
            real_name: format!("{}.asn1", stem),
            hash: eln_proof_crypto::digest(HashAlgorithm::Sha256, &token),
            bytes: token.clone(),
        })?;

        // Validate on the blocking pool, the OpenSSL engine waits on a child process
        let validator = Arc::clone(&self.validator);
        let digest = document.digest().clone();
        let chain_path = config.certificate_chain.clone();
        let (report, timestamped_when) = tokio::task::spawn_blocking(move || {
            let input = ProofInput {
                token: &token,
                token_path: &token_path,
                document_path: &document_path,
                digest: &digest,
                chain_path: &chain_path,
            };
            let report = validator.verify(&input)?;
            let timestamped_when = validator.extract_time(&report)?;
            Ok::<_, eln_proof_tsa::Error>((report, timestamped_when))
        })
        .await
        .map_err(|e| Error::Internal(format!("verification task failed: {}", e)))??;

        // A concurrent writer may have committed while we verified
        if self.entities.lock_state(&entity)?.timestamped {
            return Err(Error::AlreadyTimestamped(entity.to_string()));
        }

        // Freeze the timestamped bytes
        let document_record = self.evidence.create_evidence_record(NewEvidence {
            entity,
            user_id: actor.user_id,
            kind: EvidenceKind::TimestampedPdf,
            real_name: format!("{}-timestamped.pdf", stem),
            hash: document.digest().clone(),
            bytes: document.bytes().to_vec(),
        })?;

        let commit = LockCommit {
            user_id: actor.user_id,
            locked_when: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            timestamped_when: timestamped_when.clone(),
            timestamp_token: token_record.long_name.clone(),
        };
        self.entities.commit_lock(&entity, &commit)?;

        Ok(TimestampOutcome {
            entity,
            timestamped_when,
            token: token_record,
            document: document_record,
            engine: report.engine,
        })
    }
}
