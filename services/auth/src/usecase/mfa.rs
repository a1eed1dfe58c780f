use chrono::{DateTime, Utc};
use rand::RngExt;
use uuid::Uuid;

use crate::domain::repository::UserRepository;
use crate::domain::types::{
    ClientInfo, MfaConfig, MfaState, SecurityEvent, SecurityEventType, Severity, User,
};
use crate::error::AuthServiceError;
use crate::infra::totp;
use crate::usecase::security_event::SecurityEventEmitter;

pub const BACKUP_CODE_COUNT: usize = 10;
pub const BACKUP_CODE_LEN: usize = 8;
const BACKUP_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Fresh single-use backup codes, upper-case alphanumeric.
pub fn generate_backup_codes() -> Vec<String> {
    let mut rng = rand::rng();
    (0..BACKUP_CODE_COUNT)
        .map(|_| {
            (0..BACKUP_CODE_LEN)
                .map(|_| {
                    BACKUP_CODE_ALPHABET[rng.random_range(0..BACKUP_CODE_ALPHABET.len())] as char
                })
                .collect()
        })
        .collect()
}

async fn load_user<U: UserRepository>(users: &U, user_id: Uuid) -> Result<User, AuthServiceError> {
    users
        .find_by_id(user_id)
        .await?
        .ok_or(AuthServiceError::Unauthorized)
}

// ── Enable ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct EnableMfaOutput {
    pub secret: String,
    pub otpauth_url: String,
    pub backup_codes: Vec<String>,
}

/// DISABLED or PENDING → PENDING with a new secret. Calling it again while
/// pending replaces the secret and codes.
pub struct EnableMfaUseCase<U: UserRepository> {
    pub users: U,
    pub issuer: String,
}

impl<U: UserRepository> EnableMfaUseCase<U> {
    pub async fn execute(&self, user_id: Uuid) -> Result<EnableMfaOutput, AuthServiceError> {
        let user = load_user(&self.users, user_id).await?;
        if user.mfa_state() == MfaState::Enabled {
            return Err(AuthServiceError::MfaAlreadyEnabled);
        }

        let (secret, otpauth_url) = totp::generate_enrollment(&self.issuer, &user.email)?;
        let backup_codes = generate_backup_codes();
        let config = MfaConfig {
            secret: secret.clone(),
            enabled: false,
            verified_at: None,
            backup_codes: backup_codes.clone(),
        };
        self.users.set_mfa_config(user.id, Some(&config)).await?;

        Ok(EnableMfaOutput {
            secret,
            otpauth_url,
            backup_codes,
        })
    }
}

// ── Verify ───────────────────────────────────────────────────────────────────

pub struct VerifyMfaUseCase<U: UserRepository> {
    pub users: U,
    pub events: SecurityEventEmitter,
}

impl<U: UserRepository> VerifyMfaUseCase<U> {
    pub async fn execute(
        &self,
        user_id: Uuid,
        tenant_id: Option<Uuid>,
        code: &str,
        client: &ClientInfo,
    ) -> Result<DateTime<Utc>, AuthServiceError> {
        let user = load_user(&self.users, user_id).await?;
        let mut config = match user.mfa_config {
            None => return Err(AuthServiceError::MfaNotConfigured),
            Some(cfg) if cfg.enabled => return Err(AuthServiceError::MfaAlreadyEnabled),
            Some(cfg) => cfg,
        };

        if !totp::verify_code(&config.secret, code)? {
            self.events.emit(
                SecurityEvent::new(SecurityEventType::MfaFailed, Severity::Warning)
                    .user(user_id)
                    .tenant(tenant_id)
                    .client(client)
                    .details(serde_json::json!({ "stage": "enrollment" })),
            );
            return Err(AuthServiceError::InvalidMfaCode);
        }

        let verified_at = Utc::now();
        config.enabled = true;
        config.verified_at = Some(verified_at);
        self.users.set_mfa_config(user_id, Some(&config)).await?;

        self.events.emit(
            SecurityEvent::new(SecurityEventType::MfaEnabled, Severity::Info)
                .user(user_id)
                .tenant(tenant_id)
                .client(client),
        );
        Ok(verified_at)
    }
}

// ── Disable ──────────────────────────────────────────────────────────────────

/// Clears the whole configuration; re-enabling starts from scratch.
pub struct DisableMfaUseCase<U: UserRepository> {
    pub users: U,
    pub events: SecurityEventEmitter,
}

impl<U: UserRepository> DisableMfaUseCase<U> {
    pub async fn execute(
        &self,
        user_id: Uuid,
        tenant_id: Option<Uuid>,
        client: &ClientInfo,
    ) -> Result<(), AuthServiceError> {
        let user = load_user(&self.users, user_id).await?;
        if !user.mfa_enabled() {
            return Err(AuthServiceError::MfaNotEnabled);
        }
        self.users.set_mfa_config(user_id, None).await?;

        self.events.emit(
            SecurityEvent::new(SecurityEventType::MfaDisabled, Severity::Warning)
                .user(user_id)
                .tenant(tenant_id)
                .client(client),
        );
        Ok(())
    }
}
