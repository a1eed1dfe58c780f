#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::types::{
    Credential, Hospital, KeyRotation, MfaConfig, Membership, PiiRewrite, Role, SecurityEvent,
    Session, Staff, User,
};
use crate::error::AuthServiceError;

/// User identity records. Implementations decrypt PII on read and encrypt on write.
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthServiceError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthServiceError>;

    async fn list_ids(&self) -> Result<Vec<Uuid>, AuthServiceError>;

    /// Re-encrypt the PII fields of one user under the current key. Only the
    /// encrypted values are written; the read and the write hold the row lock,
    /// so concurrent MFA changes are never overwritten.
    async fn reencrypt_pii(
        &self,
        user_id: Uuid,
        current_key_id: &str,
    ) -> Result<PiiRewrite, AuthServiceError>;

    /// Replace the MFA configuration; `None` clears it.
    async fn set_mfa_config(
        &self,
        user_id: Uuid,
        config: Option<&MfaConfig>,
    ) -> Result<(), AuthServiceError>;

    /// Remove `code` from the user's backup codes in one conditional update.
    /// Returns the number of codes left, or `None` when nothing was removed.
    async fn consume_backup_code(
        &self,
        user_id: Uuid,
        code: &str,
    ) -> Result<Option<usize>, AuthServiceError>;

    async fn touch_last_login(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), AuthServiceError>;
}

/// Local password credentials.
pub trait CredentialRepository: Send + Sync {
    async fn find_password(&self, user_id: Uuid) -> Result<Option<Credential>, AuthServiceError>;

    async fn update_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), AuthServiceError>;
}

/// Hospitals, staff memberships and tenant-scoped roles.
pub trait TenantRepository: Send + Sync {
    async fn find_hospital(&self, id: Uuid) -> Result<Option<Hospital>, AuthServiceError>;

    async fn find_membership(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<Staff>, AuthServiceError>;

    async fn list_memberships(&self, user_id: Uuid) -> Result<Vec<Membership>, AuthServiceError>;

    async fn find_roles(
        &self,
        tenant_id: Uuid,
        role_ids: &[Uuid],
    ) -> Result<Vec<Role>, AuthServiceError>;
}

/// Persisted access and refresh tokens.
pub trait SessionRepository: Send + Sync {
    async fn insert(&self, session: &Session) -> Result<(), AuthServiceError>;

    async fn find(&self, token: &str) -> Result<Option<Session>, AuthServiceError>;

    /// Delete one session. Returns `true` if it existed.
    async fn delete_by_token(&self, token: &str) -> Result<bool, AuthServiceError>;

    /// Delete every session of a user in a single filtered delete.
    async fn delete_all_for_user(&self, user_id: Uuid) -> Result<u64, AuthServiceError>;
}

/// Per-identifier failed login counter with a rolling TTL.
pub trait FailedLoginTracker: Send + Sync {
    /// Atomically increment and return the post-increment count.
    async fn record_failure(&self, identifier: &str) -> Result<u64, AuthServiceError>;

    async fn is_locked(&self, identifier: &str) -> Result<bool, AuthServiceError>;

    async fn reset(&self, identifier: &str) -> Result<(), AuthServiceError>;

    /// Count at which the identifier is locked.
    fn threshold(&self) -> u64;
}

pub trait SecurityEventRepository: Send + Sync {
    async fn insert(&self, event: &SecurityEvent) -> Result<(), AuthServiceError>;
}

pub trait KeyRotationRepository: Send + Sync {
    async fn latest(&self) -> Result<Option<KeyRotation>, AuthServiceError>;

    async fn count(&self) -> Result<u64, AuthServiceError>;

    async fn insert(&self, rotation: &KeyRotation) -> Result<(), AuthServiceError>;
}
