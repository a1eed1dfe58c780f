/// Field-encryption failures.
#[derive(Debug, thiserror::Error)]
pub enum PiiError {
    #[error("unknown encryption key: {0}")]
    UnknownKey(String),
    #[error("invalid key material: {0}")]
    InvalidKey(String),
    #[error("malformed ciphertext")]
    Malformed,
    #[error("cryptography error: {0}")]
    Crypto(String),
    #[error("entity (de)serialization failed")]
    Serde(#[from] serde_json::Error),
}
