//! In-memory collaborators shared by the integration tests

#![allow(dead_code)]

use eln_proof::{ConfigStore, EntityStore, EvidenceStore, InstanceSettings, StoreError, TimestampSettings};
use eln_proof_tsa::{
    ProofInput, ProofVerifier, TimestampConfig, TimestampResponseValidator, TimestampTransport,
    VerificationReport, VerifyFailure,
};
use eln_proof_types::{
    EntityMetadata, EntityRef, EvidenceKind, EvidenceRecord, LockCommit, LockState, NewEvidence,
    RenderedDocument, TeamId,
};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PDF: &[u8] = b"%PDF-1.7\n1 0 obj << /Type /Catalog >> endobj\n%%EOF\n";
pub const TOKEN: &[u8] = b"\x30\x82\x00\x10opaque token bytes";
pub const REPORT: &str = "Status info:\nStatus: Granted.\n\nTST info:\nVersion: 1\nTime stamp: Mar  1 10:00:00 2024 GMT\nAccuracy: unspecified\n";

#[derive(Debug, Clone)]
pub struct EntityRow {
    pub timestampable: bool,
    pub state: LockState,
    pub pdf: Option<Vec<u8>>,
}

impl Default for EntityRow {
    fn default() -> Self {
        Self {
            timestampable: true,
            state: LockState::default(),
            pdf: Some(PDF.to_vec()),
        }
    }
}

#[derive(Default)]
pub struct MemoryEntities {
    rows: Mutex<HashMap<EntityRef, EntityRow>>,
    pub commits: AtomicUsize,
    pub renders: AtomicUsize,
}

impl MemoryEntities {
    pub fn with(entity: EntityRef, row: EntityRow) -> Arc<Self> {
        let store = Self::default();
        store.rows.lock().unwrap().insert(entity, row);
        Arc::new(store)
    }

    pub fn state(&self, entity: &EntityRef) -> LockState {
        self.rows.lock().unwrap()[entity].state.clone()
    }

    /// Simulate another writer timestamping the entity
    pub fn mark_timestamped(&self, entity: &EntityRef) {
        self.rows.lock().unwrap().get_mut(entity).unwrap().state.timestamped = true;
    }

    fn row(&self, entity: &EntityRef) -> Result<EntityRow, StoreError> {
        self.rows
            .lock()
            .unwrap()
            .get(entity)
            .cloned()
            .ok_or_else(|| format!("no such entity {}", entity).into())
    }
}

impl EntityStore for MemoryEntities {
    fn is_timestampable(&self, entity: &EntityRef) -> Result<bool, StoreError> {
        Ok(self.row(entity)?.timestampable)
    }

    fn lock_state(&self, entity: &EntityRef) -> Result<LockState, StoreError> {
        Ok(self.row(entity)?.state)
    }

    fn metadata(&self, entity: &EntityRef) -> Result<EntityMetadata, StoreError> {
        self.row(entity)?;
        Ok(EntityMetadata {
            elabid: format!("20240301-{}", entity.id),
            title: "Assay".to_string(),
        })
    }

    fn rendered_document(&self, entity: &EntityRef) -> Result<RenderedDocument, StoreError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        let bytes = self.row(entity)?.pdf.ok_or("renderer produced no file")?;
        Ok(RenderedDocument {
            entity: *entity,
            filename: format!("{}-assay.pdf", entity.id),
            bytes,
        })
    }

    fn commit_lock(&self, entity: &EntityRef, commit: &LockCommit) -> Result<(), StoreError> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        let row = rows.get_mut(entity).ok_or("no such entity")?;
        row.state = LockState::committed(commit);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryEvidence {
    records: Mutex<Vec<(EvidenceRecord, Vec<u8>)>>,
}

impl MemoryEvidence {
    pub fn records(&self) -> Vec<EvidenceRecord> {
        self.records.lock().unwrap().iter().map(|(r, _)| r.clone()).collect()
    }

    pub fn bytes(&self, kind: EvidenceKind) -> Option<Vec<u8>> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|(r, _)| r.kind == kind)
            .map(|(_, b)| b.clone())
    }
}

impl EvidenceStore for MemoryEvidence {
    fn create_evidence_record(&self, evidence: NewEvidence) -> Result<EvidenceRecord, StoreError> {
        let mut records = self.records.lock().unwrap();
        let id = records.len() as u64 + 1;
        let record = EvidenceRecord {
            id,
            real_name: evidence.real_name,
            long_name: format!("{}/{}/{}", evidence.entity.kind.as_str(), evidence.entity.id, id),
            entity: evidence.entity,
            user_id: evidence.user_id,
            kind: evidence.kind,
            hash: evidence.hash.to_hex(),
            hash_algorithm: evidence.hash.algorithm,
        };
        records.push((record.clone(), evidence.bytes));
        Ok(record)
    }
}

pub struct MemorySettings {
    pub instance: InstanceSettings,
    pub team: Option<TimestampSettings>,
}

impl ConfigStore for MemorySettings {
    fn instance_settings(&self) -> Result<InstanceSettings, StoreError> {
        Ok(self.instance.clone())
    }

    fn team_settings(&self, _team: TeamId) -> Result<Option<TimestampSettings>, StoreError> {
        Ok(self.team.clone())
    }
}

/// Transport answering every request with the same scripted outcome
pub struct MockTransport {
    outcome: Result<Vec<u8>, String>,
    delay: Option<Duration>,
    pub calls: AtomicUsize,
    pub last_url: Mutex<Option<String>>,
}

impl MockTransport {
    pub fn answering(token: &[u8]) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(token.to_vec()),
            delay: None,
            calls: AtomicUsize::new(0),
            last_url: Mutex::new(None),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(message.to_string()),
            delay: None,
            calls: AtomicUsize::new(0),
            last_url: Mutex::new(None),
        })
    }

    pub fn slow(token: &[u8], delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(token.to_vec()),
            delay: Some(delay),
            calls: AtomicUsize::new(0),
            last_url: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TimestampTransport for MockTransport {
    fn send<'a>(
        &'a self,
        _request_der: &'a [u8],
        config: &'a TimestampConfig,
    ) -> Pin<Box<dyn Future<Output = eln_proof_tsa::Result<Vec<u8>>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_url.lock().unwrap() = Some(config.tsa_url.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.outcome
                .clone()
                .map_err(eln_proof_tsa::Error::TsaUnreachable)
        })
    }
}

/// Verifier with a scripted outcome that checks it was given real files
pub struct MockVerifier {
    outcome: Result<String, VerifyFailure>,
    pub calls: Arc<AtomicUsize>,
}

impl ProofVerifier for MockVerifier {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn verify(&self, input: &ProofInput<'_>) -> Result<VerificationReport, VerifyFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(std::fs::read(input.token_path).unwrap(), input.token);
        assert_eq!(std::fs::read(input.document_path).unwrap(), PDF);
        self.outcome
            .clone()
            .map(|text| VerificationReport::new("mock", text))
    }
}

pub fn validator(outcome: Result<String, VerifyFailure>) -> (Arc<TimestampResponseValidator>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let verifier = MockVerifier {
        outcome,
        calls: calls.clone(),
    };
    (
        Arc::new(TimestampResponseValidator::new(Box::new(verifier), None)),
        calls,
    )
}

pub fn accepting_validator() -> Arc<TimestampResponseValidator> {
    validator(Ok(REPORT.to_string())).0
}

pub fn scratch_is_empty(root: &std::path::Path) -> bool {
    std::fs::read_dir(root).unwrap().next().is_none()
}
