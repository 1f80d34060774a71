//! Bloxberg proof-of-existence
//!
//! An alternative to RFC 3161: the document hash is certified by the Bloxberg
//! notary, which anchors it on its blockchain and returns a proof archive.
//! No local verification is done on that archive; trust rests with the
//! notary.

pub mod archive;
pub mod client;
pub mod error;

pub use archive::{inject_document, TIMESTAMPED_DATA_NAME};
pub use client::{BloxbergEndpoints, BloxbergNotary, CertifyMetadata, DEFAULT_TIMEOUT};
pub use error::{Error, Result};
