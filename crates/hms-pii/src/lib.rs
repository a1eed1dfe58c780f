//! Transparent field-level encryption for personally identifiable data.
//!
//! Repositories hold a [`FieldCodec`] configured with the dot-notation paths
//! of the PII fields of one entity, call [`FieldCodec::encode_for_storage`]
//! before every insert/update and [`FieldCodec::decode_from_storage`] (or the
//! batch variant) after every read. The codec itself only knows an
//! [`Encryptor`] capability; key material is resolved per call through a
//! [`KeyProvider`] so keys can rotate without rebuilding the codec.

pub mod codec;
pub mod encryptor;
pub mod error;
pub mod keys;

pub use codec::FieldCodec;
pub use encryptor::{AesGcmEncryptor, ENCRYPTED_PREFIX, Encryptor, is_encrypted, key_id_of};
pub use error::PiiError;
pub use keys::{KeyProvider, StaticKeyRing};
