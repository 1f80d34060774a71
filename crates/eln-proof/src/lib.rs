//! Trusted timestamping for ELN experiments and items
//!
//! [`TimestampOrchestrator`] takes an entity through rendering, hashing, the
//! RFC 3161 exchange with a Time-Stamp Authority, verification and the final
//! lock. Two evidence records are stored per timestamp: the TSA token and
//! the exact PDF that was hashed. [`BloxbergWorkflow`] is the blockchain
//! notarization alternative.
//!
//! Storage, rendering and settings belong to the hosting application and are
//! reached through the traits in [`store`].
//!
//! # Example
//!
//! ```no_run
//! use eln_proof::{TimestampOrchestrator, ValidatorOrder};
//! use eln_proof_tsa::{TimestampResponseValidator, TsaClient};
//! use std::sync::Arc;
//!
//! # async fn example(
//! #     entities: Arc<dyn eln_proof::EntityStore>,
//! #     evidence: Arc<dyn eln_proof::EvidenceStore>,
//! #     settings: &dyn eln_proof::ConfigStore,
//! #     cipher: &eln_proof_crypto::CredentialCipher,
//! # ) -> Result<(), eln_proof::Error> {
//! let validator = TimestampResponseValidator::detect(ValidatorOrder::NativeFirst, "openssl");
//! let orchestrator = TimestampOrchestrator::new(
//!     entities,
//!     evidence,
//!     Arc::new(TsaClient::new()),
//!     Arc::new(validator),
//! );
//!
//! let actor = eln_proof::Actor { user_id: 7, team_id: 1, fullname: "Jane Doe".into() };
//! let outcome = orchestrator
//!     .run_with_settings(eln_proof::EntityRef::experiment(42), &actor, settings, cipher)
//!     .await?;
//! println!("timestamped at {}", outcome.timestamped_when);
//! # Ok(())
//! # }
//! ```

pub mod bloxberg;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod scratch;
pub mod store;

pub use bloxberg::BloxbergWorkflow;
pub use config::{resolve_config, InstanceSettings, TimestampSettings};
pub use error::{Error, Result, StoreError, GENERIC_USER_MESSAGE};
pub use orchestrator::{TimestampOrchestrator, TimestampOutcome};
pub use scratch::ScratchDir;
pub use store::{ConfigStore, EntityStore, EvidenceStore};

pub use eln_proof_tsa::ValidatorOrder;
pub use eln_proof_types::{Actor, EntityKind, EntityRef, EvidenceKind, EvidenceRecord, LockState};
