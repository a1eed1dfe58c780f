use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use hms_auth_types::principal::AuthenticatedPrincipal;
use hms_pii::KeyProvider;

use crate::domain::repository::{KeyRotationRepository, UserRepository};
use crate::domain::types::{
    ClientInfo, KEY_ROTATE_PERMISSION, KeyRotation, PiiRewrite, SecurityEvent, SecurityEventType,
    Severity,
};
use crate::error::AuthServiceError;
use crate::usecase::security_event::SecurityEventEmitter;

// ── KeyStatus ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct LastRotation {
    pub rotated_at: DateTime<Utc>,
    pub rotated_by: Uuid,
    pub records_re_encrypted: u64,
    pub days_since_rotation: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyStatus {
    pub current_key_id: String,
    pub last_rotation: Option<LastRotation>,
    pub rotation_recommended: bool,
    pub total_rotations: u64,
}

pub struct KeyStatusUseCase<K: KeyRotationRepository> {
    pub rotations: K,
    pub keys: Arc<dyn KeyProvider>,
    pub max_age_days: i64,
}

impl<K: KeyRotationRepository> KeyStatusUseCase<K> {
    pub async fn execute(&self) -> Result<KeyStatus, AuthServiceError> {
        let latest = self.rotations.latest().await?;
        let total_rotations = self.rotations.count().await?;

        let last_rotation = latest.map(|r| LastRotation {
            days_since_rotation: (Utc::now() - r.rotated_at).num_days(),
            rotated_at: r.rotated_at,
            rotated_by: r.rotated_by,
            records_re_encrypted: r.records_re_encrypted,
        });
        let rotation_recommended = last_rotation
            .as_ref()
            .is_none_or(|r| r.days_since_rotation > self.max_age_days);

        Ok(KeyStatus {
            current_key_id: self.keys.current_key_id(),
            last_rotation,
            rotation_recommended,
            total_rotations,
        })
    }
}

// ── RotateKeys ───────────────────────────────────────────────────────────────

/// Re-encrypts every user's PII under the current key and records the rotation.
///
/// Reading decrypts each value with the key id embedded in it; writing
/// encrypts under the current key. Only rows that end up fully under the
/// current key are counted. Rows still holding a value under a key the ring
/// no longer has are left as stored and logged.
pub struct RotateKeysUseCase<U: UserRepository, K: KeyRotationRepository> {
    pub users: U,
    pub rotations: K,
    pub keys: Arc<dyn KeyProvider>,
    pub events: SecurityEventEmitter,
}

impl<U: UserRepository, K: KeyRotationRepository> RotateKeysUseCase<U, K> {
    pub async fn execute(
        &self,
        principal: &AuthenticatedPrincipal,
        client: &ClientInfo,
    ) -> Result<KeyRotation, AuthServiceError> {
        if !principal.has_permission(KEY_ROTATE_PERMISSION) {
            return Err(AuthServiceError::Forbidden);
        }

        let key_id = self.keys.current_key_id();
        let mut re_encrypted = 0u64;
        for user_id in self.users.list_ids().await? {
            match self.users.reencrypt_pii(user_id, &key_id).await? {
                PiiRewrite::Current => re_encrypted += 1,
                PiiRewrite::Stale(key_ids) => tracing::warn!(
                    user_id = %user_id,
                    key_ids = ?key_ids,
                    "pii left under retired key"
                ),
                PiiRewrite::Missing => {}
            }
        }

        let rotation = KeyRotation {
            id: Uuid::now_v7(),
            key_id,
            rotated_at: Utc::now(),
            rotated_by: principal.user_id,
            records_re_encrypted: re_encrypted,
        };
        self.rotations.insert(&rotation).await?;
        tracing::info!(
            key_id = %rotation.key_id,
            records = rotation.records_re_encrypted,
            "pii keys rotated"
        );

        self.events.emit(
            SecurityEvent::new(SecurityEventType::KeyRotated, Severity::Critical)
                .user(principal.user_id)
                .tenant(principal.tenant_id)
                .client(client)
                .details(serde_json::json!({
                    "keyId": rotation.key_id,
                    "recordsReEncrypted": rotation.records_re_encrypted,
                })),
        );
        Ok(rotation)
    }
}
