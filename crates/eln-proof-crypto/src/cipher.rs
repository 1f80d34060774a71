//! At-rest encryption of TSA credentials
//!
//! Payloads are `base64(nonce || ciphertext || tag)` with AES-256-GCM and a
//! random 96-bit nonce per encryption.

use crate::error::{Error, Result};
use aws_lc_rs::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use aws_lc_rs::rand::{SecureRandom, SystemRandom};
use base64::{engine::general_purpose::STANDARD, Engine};
use eln_proof_types::Secret;

/// Encrypts and decrypts stored credentials with the instance secret key
pub struct CredentialCipher {
    key: LessSafeKey,
}

impl CredentialCipher {
    /// Create a cipher from 32 bytes of key material
    pub fn new(key: &[u8]) -> Result<Self> {
        let unbound = UnboundKey::new(&AES_256_GCM, key)
            .map_err(|_| Error::InvalidKey(format!("expected 32 bytes, got {}", key.len())))?;
        Ok(Self {
            key: LessSafeKey::new(unbound),
        })
    }

    /// Encrypt a clear-text credential for storage
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        SystemRandom::new().fill(&mut nonce_bytes)?;
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        let mut in_out = plaintext.as_bytes().to_vec();
        self.key
            .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)?;

        let mut payload = nonce_bytes.to_vec();
        payload.extend_from_slice(&in_out);
        Ok(STANDARD.encode(payload))
    }

    /// Decrypt a stored credential
    pub fn decrypt(&self, payload: &str) -> Result<Secret> {
        let payload = STANDARD.decode(payload.trim())?;
        if payload.len() < NONCE_LEN {
            return Err(Error::Cipher("payload shorter than nonce".to_string()));
        }
        let (nonce_bytes, sealed) = payload.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)?;

        let mut in_out = sealed.to_vec();
        let plaintext = self
            .key
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| Error::Cipher("decryption failed".to_string()))?;

        let plaintext = std::str::from_utf8(plaintext)
            .map_err(|_| Error::Cipher("decrypted credential is not UTF-8".to_string()))?;
        Ok(Secret::new(plaintext))
    }
}
