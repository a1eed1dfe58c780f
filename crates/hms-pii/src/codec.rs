//! Encrypt-on-write / decrypt-on-read for configured document fields.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::encryptor::{Encryptor, is_encrypted, key_id_of};
use crate::error::PiiError;

/// Field-level codec for one entity type.
///
/// Fields are dot-notation paths into the entity's JSON form
/// (`"mfa_config.secret"`). Only string values are protected; missing
/// paths, `null` and non-string values are left as they are.
#[derive(Clone)]
pub struct FieldCodec {
    fields: Vec<Vec<String>>,
    encryptor: Arc<dyn Encryptor>,
}

impl std::fmt::Debug for FieldCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCodec")
            .field("fields", &self.field_paths())
            .finish_non_exhaustive()
    }
}

impl FieldCodec {
    pub fn new<I, S>(fields: I, encryptor: Arc<dyn Encryptor>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields = fields
            .into_iter()
            .map(|path| path.as_ref().split('.').map(str::to_owned).collect())
            .collect();
        Self { fields, encryptor }
    }

    pub fn field_paths(&self) -> Vec<String> {
        self.fields.iter().map(|p| p.join(".")).collect()
    }

    /// Encrypt every configured string field not already carrying the marker.
    /// Returns how many values were encrypted by this call.
    pub fn encode_document(&self, doc: &mut Value) -> Result<usize, PiiError> {
        let mut encrypted = 0;
        for path in &self.fields {
            let Some(Value::String(current)) = field_mut(doc, path) else {
                continue;
            };
            if is_encrypted(current) {
                continue;
            }
            *current = self.encryptor.encrypt(current)?;
            encrypted += 1;
        }
        Ok(encrypted)
    }

    /// Decrypt every configured field carrying the marker. A value that fails
    /// to decrypt stays in its stored form. Returns how many were decrypted.
    pub fn decode_document(&self, doc: &mut Value) -> usize {
        let mut decrypted = 0;
        for path in &self.fields {
            let Some(Value::String(current)) = field_mut(doc, path) else {
                continue;
            };
            if !is_encrypted(current) {
                continue;
            }
            match self.encryptor.decrypt(current) {
                Ok(plain) => {
                    *current = plain;
                    decrypted += 1;
                }
                Err(e) => {
                    tracing::warn!(field = %path.join("."), error = %e, "field decryption failed");
                }
            }
        }
        decrypted
    }

    /// Key ids of the configured fields that hold ciphertext, one per field.
    pub fn key_ids(&self, doc: &Value) -> Vec<String> {
        self.fields
            .iter()
            .filter_map(|path| field_ref(doc, path)?.as_str())
            .filter_map(key_id_of)
            .map(str::to_owned)
            .collect()
    }

    pub fn decode_documents(&self, docs: &mut [Value]) -> usize {
        docs.iter_mut().map(|doc| self.decode_document(doc)).sum()
    }

    /// Typed entry point used by repositories before insert/update.
    pub fn encode_for_storage<T>(&self, entity: &T) -> Result<T, PiiError>
    where
        T: Serialize + DeserializeOwned,
    {
        let mut doc = serde_json::to_value(entity)?;
        self.encode_document(&mut doc)?;
        Ok(serde_json::from_value(doc)?)
    }

    /// Typed entry point used by repositories after a single-row read.
    pub fn decode_from_storage<T>(&self, entity: T) -> Result<T, PiiError>
    where
        T: Serialize + DeserializeOwned,
    {
        let mut doc = serde_json::to_value(&entity)?;
        if self.decode_document(&mut doc) == 0 {
            return Ok(entity);
        }
        Ok(serde_json::from_value(doc)?)
    }

    /// Batch variant of [`FieldCodec::decode_from_storage`].
    pub fn decode_batch_from_storage<T>(&self, entities: Vec<T>) -> Result<Vec<T>, PiiError>
    where
        T: Serialize + DeserializeOwned,
    {
        entities
            .into_iter()
            .map(|e| self.decode_from_storage(e))
            .collect()
    }
}

fn field_ref<'a>(doc: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = doc;
    for segment in path {
        current = current.as_object()?.get(segment.as_str())?;
    }
    Some(current)
}

fn field_mut<'a>(doc: &'a mut Value, path: &[String]) -> Option<&'a mut Value> {
    let mut current = doc;
    for segment in path {
        current = current.as_object_mut()?.get_mut(segment.as_str())?;
    }
    Some(current)
}
