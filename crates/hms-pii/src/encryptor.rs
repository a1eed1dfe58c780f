//! Authenticated encryption of single field values.

use std::sync::Arc;

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::PiiError;
use crate::keys::KeyProvider;

/// Marker carried by every encrypted value: `enc:<keyId>:<base64>`.
pub const ENCRYPTED_PREFIX: &str = "enc:";

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Whether a stored value already carries the encryption marker.
pub fn is_encrypted(value: &str) -> bool {
    value.starts_with(ENCRYPTED_PREFIX)
}

/// Key id embedded in an encrypted value, `None` for plaintext or garbage.
pub fn key_id_of(value: &str) -> Option<&str> {
    value
        .strip_prefix(ENCRYPTED_PREFIX)
        .and_then(|rest| rest.split_once(':'))
        .map(|(key_id, _)| key_id)
}

/// Encrypt/decrypt capability injected into the codec.
pub trait Encryptor: Send + Sync {
    /// Encrypt `plaintext`, returning a marker-prefixed string.
    fn encrypt(&self, plaintext: &str) -> Result<String, PiiError>;

    /// Decrypt a marker-prefixed string produced by [`Encryptor::encrypt`].
    fn decrypt(&self, stored: &str) -> Result<String, PiiError>;
}

/// AES-256-GCM with a random 96-bit nonce per value.
///
/// Payload layout: `base64(nonce || ciphertext || tag)`. The key id is bound
/// as associated data so a value cannot be replayed under another key id.
#[derive(Clone)]
pub struct AesGcmEncryptor {
    keys: Arc<dyn KeyProvider>,
}

impl AesGcmEncryptor {
    pub fn new(keys: Arc<dyn KeyProvider>) -> Self {
        Self { keys }
    }

    fn cipher(&self, key_id: &str) -> Result<Aes256Gcm, PiiError> {
        let key = self
            .keys
            .key(key_id)
            .ok_or_else(|| PiiError::UnknownKey(key_id.to_owned()))?;
        Ok(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key)))
    }
}

impl Encryptor for AesGcmEncryptor {
    fn encrypt(&self, plaintext: &str) -> Result<String, PiiError> {
        let key_id = self.keys.current_key_id();
        let cipher = self.cipher(&key_id)?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(
                nonce,
                Payload {
                    msg: plaintext.as_bytes(),
                    aad: key_id.as_bytes(),
                },
            )
            .map_err(|e| PiiError::Crypto(format!("AES-GCM encrypt: {e}")))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend_from_slice(&ciphertext);
        Ok(format!("{ENCRYPTED_PREFIX}{key_id}:{}", STANDARD.encode(combined)))
    }

    fn decrypt(&self, stored: &str) -> Result<String, PiiError> {
        let (key_id, encoded) = stored
            .strip_prefix(ENCRYPTED_PREFIX)
            .and_then(|rest| rest.split_once(':'))
            .ok_or(PiiError::Malformed)?;

        let combined = STANDARD.decode(encoded).map_err(|_| PiiError::Malformed)?;
        if combined.len() < NONCE_LEN + TAG_LEN {
            return Err(PiiError::Malformed);
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        let cipher = self.cipher(key_id)?;
        let plaintext = cipher
            .decrypt(
                Nonce::from_slice(nonce_bytes),
                Payload {
                    msg: ciphertext,
                    aad: key_id.as_bytes(),
                },
            )
            .map_err(|e| PiiError::Crypto(format!("AES-GCM decrypt: {e}")))?;

        String::from_utf8(plaintext).map_err(|_| PiiError::Malformed)
    }
}
