use serde::Deserialize;

use hms_core::config::Config;

/// Auth service configuration loaded from environment variables.
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Redis connection URL (failed-login counters).
    pub redis_url: String,
    /// TCP port to listen on. Env var: `AUTH_PORT`.
    #[serde(default = "default_port")]
    pub auth_port: u16,
    /// HMAC secret for signing MFA challenge tokens.
    pub challenge_token_secret: String,
    /// Optional secret mixed into every password hash.
    #[serde(default)]
    pub password_pepper: Option<String>,
    /// PII keys as `"<keyId>:<base64 32 bytes>"` entries separated by commas.
    pub pii_keys: String,
    /// Key id new ciphertext is written with.
    pub pii_current_key_id: String,
    /// Issuer label shown in authenticator apps.
    #[serde(default = "default_totp_issuer")]
    pub totp_issuer: String,
    #[serde(default = "default_lockout_threshold")]
    pub lockout_threshold: u64,
    #[serde(default = "default_lockout_ttl")]
    pub lockout_ttl_secs: u64,
    #[serde(default = "default_challenge_ttl")]
    pub mfa_challenge_ttl_secs: u64,
    #[serde(default = "default_rotation_max_age")]
    pub key_rotation_max_age_days: i64,
}

impl Config for AuthConfig {}

fn default_port() -> u16 {
    3112
}

fn default_totp_issuer() -> String {
    "HMS".to_owned()
}

fn default_lockout_threshold() -> u64 {
    5
}

fn default_lockout_ttl() -> u64 {
    900
}

fn default_challenge_ttl() -> u64 {
    300
}

fn default_rotation_max_age() -> i64 {
    crate::domain::types::KEY_ROTATION_MAX_AGE_DAYS
}
