//! Cryptographic primitives for ELN proof-of-existence
//!
//! Digests are computed with aws-lc-rs. The same crate backs the AES-256-GCM
//! cipher that protects TSA passwords at rest.

pub mod cipher;
pub mod document;
pub mod error;
pub mod hash;

pub use cipher::CredentialCipher;
pub use document::HashedDocument;
pub use error::{Error, Result};
pub use hash::{digest, hash_file, hash_hex, Hasher};
