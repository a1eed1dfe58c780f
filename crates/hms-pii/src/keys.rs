//! Key material lookup.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::PiiError;

/// Length of an AES-256 key in bytes.
pub const KEY_LEN: usize = 32;

/// Source of encryption keys, consulted on every encrypt/decrypt call.
pub trait KeyProvider: Send + Sync {
    /// Identifier of the key new ciphertext is written with.
    fn current_key_id(&self) -> String;

    /// Raw key bytes for `key_id`, if the provider still holds it.
    fn key(&self, key_id: &str) -> Option<[u8; KEY_LEN]>;
}

/// In-memory key ring loaded once from configuration.
///
/// Older keys stay in the ring so values written before a rotation remain
/// readable until they are re-encrypted.
#[derive(Clone)]
pub struct StaticKeyRing {
    current: String,
    keys: HashMap<String, [u8; KEY_LEN]>,
}

impl std::fmt::Debug for StaticKeyRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<&String> = self.keys.keys().collect();
        ids.sort();
        f.debug_struct("StaticKeyRing")
            .field("current", &self.current)
            .field("key_ids", &ids)
            .finish()
    }
}

impl StaticKeyRing {
    pub fn new(
        current: impl Into<String>,
        keys: HashMap<String, [u8; KEY_LEN]>,
    ) -> Result<Self, PiiError> {
        let current = current.into();
        for id in keys.keys() {
            validate_key_id(id)?;
        }
        if !keys.contains_key(&current) {
            return Err(PiiError::UnknownKey(current));
        }
        Ok(Self { current, keys })
    }

    /// Parse `"<keyId>:<base64 key>"` entries separated by commas.
    pub fn parse(entries: &str, current: &str) -> Result<Self, PiiError> {
        let mut keys = HashMap::new();
        for entry in entries.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (id, encoded) = entry
                .split_once(':')
                .ok_or_else(|| PiiError::InvalidKey(format!("entry without key id: {entry}")))?;
            let bytes = STANDARD
                .decode(encoded.trim())
                .map_err(|e| PiiError::InvalidKey(format!("{id}: base64 decode: {e}")))?;
            let key: [u8; KEY_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
                PiiError::InvalidKey(format!("{id}: expected {KEY_LEN} bytes, got {}", b.len()))
            })?;
            keys.insert(id.trim().to_owned(), key);
        }
        Self::new(current, keys)
    }

    pub fn key_ids(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }
}

impl KeyProvider for StaticKeyRing {
    fn current_key_id(&self) -> String {
        self.current.clone()
    }

    fn key(&self, key_id: &str) -> Option<[u8; KEY_LEN]> {
        self.keys.get(key_id).copied()
    }
}

fn validate_key_id(id: &str) -> Result<(), PiiError> {
    // The id is embedded in ciphertext as `enc:<id>:<payload>`.
    if id.is_empty() || id.contains(':') {
        return Err(PiiError::InvalidKey(format!("invalid key id {id:?}")));
    }
    Ok(())
}
