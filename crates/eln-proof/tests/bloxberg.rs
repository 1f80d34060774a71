mod support;

use eln_proof::{BloxbergWorkflow, EntityRef, Error, EvidenceKind, InstanceSettings};
use eln_proof_bloxberg::{BloxbergEndpoints, TIMESTAMPED_DATA_NAME};
use eln_proof_testkit::{StubResponse, StubServer};
use eln_proof_types::Actor;
use std::io::{Cursor, Read, Write};
use std::sync::Arc;
use std::time::Duration;
use support::*;

const CERTIFICATION: &str = r#"{"id":"https://bloxberg.org","crid":"0xabc"}"#;

fn proof_archive() -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("bloxberg-certificate.pdf", zip::write::SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"%PDF-1.4 certificate").unwrap();
    writer.finish().unwrap().into_inner()
}

fn endpoints(server: &StubServer) -> BloxbergEndpoints {
    BloxbergEndpoints {
        certify_url: server.url("/createBloxbergCertificate"),
        proof_url: server.url("/generatePDF"),
        api_key_url: server.url("/?bloxbergapikey"),
        public_key: "0xc4d84f3e6c7A7adf10f5F2aA18C2d3ee0376D4A4".to_string(),
    }
}

fn enabled() -> InstanceSettings {
    InstanceSettings {
        bloxberg_enabled: true,
        ..Default::default()
    }
}

fn actor() -> Actor {
    Actor {
        user_id: 7,
        team_id: 1,
        fullname: "Jane Doe".to_string(),
    }
}

struct Fixture {
    entity: EntityRef,
    entities: Arc<MemoryEntities>,
    evidence: Arc<MemoryEvidence>,
    scratch: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        let entity = EntityRef::experiment(42);
        Self {
            entity,
            entities: MemoryEntities::with(entity, EntityRow::default()),
            evidence: Arc::new(MemoryEvidence::default()),
            scratch: tempfile::tempdir().unwrap(),
        }
    }

    fn workflow(&self, server: &StubServer) -> BloxbergWorkflow {
        BloxbergWorkflow::new(self.entities.clone(), self.evidence.clone())
            .with_endpoints(endpoints(server))
            .with_timeout(Duration::from_secs(5))
            .with_scratch_root(self.scratch.path())
    }
}

#[tokio::test]
async fn test_proof_archive_stored_with_document() {
    let server = StubServer::start([
        ("/?bloxbergapikey", StubResponse::ok("text/plain", "k3y")),
        (
            "/createBloxbergCertificate",
            StubResponse::ok("application/json", CERTIFICATION),
        ),
        ("/generatePDF", StubResponse::ok("application/zip", proof_archive())),
    ])
    .await
    .unwrap();
    let fx = Fixture::new();

    let record = fx.workflow(&server).run(fx.entity, &actor(), &enabled()).await.unwrap();

    assert_eq!(record.kind, EvidenceKind::BloxbergProof);
    assert_eq!(record.real_name, "42-assay-bloxberg.zip");

    let certify = server
        .requests()
        .into_iter()
        .find(|r| r.path.ends_with("/createBloxbergCertificate"))
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&certify.body).unwrap();
    assert_eq!(
        body["crid"][0],
        format!("0x{}", eln_proof_crypto::hash_hex(PDF, Default::default()))
    );
    let metadata: serde_json::Value =
        serde_json::from_str(body["metadataJson"].as_str().unwrap()).unwrap();
    assert_eq!(metadata["author"], "Jane Doe");
    assert_eq!(metadata["elabid"], "20240301-42");

    let stored = fx.evidence.bytes(EvidenceKind::BloxbergProof).unwrap();
    let mut archive = zip::ZipArchive::new(Cursor::new(stored)).unwrap();
    assert!(archive.by_name("bloxberg-certificate.pdf").is_ok());
    let mut injected = Vec::new();
    archive
        .by_name(TIMESTAMPED_DATA_NAME)
        .unwrap()
        .read_to_end(&mut injected)
        .unwrap();
    assert_eq!(injected, PDF);

    // Notarization does not lock the entity.
    let state = fx.entities.state(&fx.entity);
    assert!(!state.locked);
    assert!(!state.timestamped);
    assert!(scratch_is_empty(fx.scratch.path()));
}

#[tokio::test]
async fn test_api_key_failure_stops_before_certify() {
    let server = StubServer::start([
        ("/?bloxbergapikey", StubResponse::status(500)),
        (
            "/createBloxbergCertificate",
            StubResponse::ok("application/json", CERTIFICATION),
        ),
    ])
    .await
    .unwrap();
    let fx = Fixture::new();

    let err = fx
        .workflow(&server)
        .run(fx.entity, &actor(), &enabled())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ImproperAction(_)), "{err}");
    assert_eq!(err.user_message(), err.to_string());
    assert_eq!(server.hits("/?bloxbergapikey"), 1);
    assert_eq!(server.hits("/createBloxbergCertificate"), 0);
    assert!(fx.evidence.records().is_empty());
}

#[tokio::test]
async fn test_disabled_instance_makes_no_request() {
    let server = StubServer::start([("/?bloxbergapikey", StubResponse::ok("text/plain", "k3y"))])
        .await
        .unwrap();
    let fx = Fixture::new();

    let err = fx
        .workflow(&server)
        .run(fx.entity, &actor(), &InstanceSettings::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ImproperAction(ref m) if m.contains("disabled")), "{err}");
    assert!(server.requests().is_empty());
    assert_eq!(fx.entities.renders.load(std::sync::atomic::Ordering::SeqCst), 0);
}
