use std::sync::Arc;

use deadpool_redis::Pool as RedisPool;
use sea_orm::DatabaseConnection;

use hms_pii::{FieldCodec, KeyProvider};

use crate::infra::cache::RedisFailedLoginTracker;
use crate::infra::db::{
    DbCredentialRepository, DbKeyRotationRepository, DbSessionRepository, DbTenantRepository,
    DbUserRepository,
};
use crate::usecase::security_event::SecurityEventEmitter;
use crate::usecase::session::SessionStore;

/// Tunables taken from `AuthConfig` at startup.
#[derive(Clone, Debug)]
pub struct AuthSettings {
    pub challenge_token_secret: String,
    pub password_pepper: Option<String>,
    pub totp_issuer: String,
    pub lockout_threshold: u64,
    pub lockout_ttl_secs: u64,
    pub mfa_challenge_ttl_secs: u64,
    pub key_rotation_max_age_days: i64,
}

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub redis: RedisPool,
    pub codec: Arc<FieldCodec>,
    pub keys: Arc<dyn KeyProvider>,
    pub events: SecurityEventEmitter,
    pub settings: Arc<AuthSettings>,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
            codec: Arc::clone(&self.codec),
        }
    }

    pub fn credential_repo(&self) -> DbCredentialRepository {
        DbCredentialRepository {
            db: self.db.clone(),
        }
    }

    pub fn tenant_repo(&self) -> DbTenantRepository {
        DbTenantRepository {
            db: self.db.clone(),
        }
    }

    pub fn session_store(&self) -> SessionStore<DbSessionRepository> {
        SessionStore {
            sessions: DbSessionRepository {
                db: self.db.clone(),
            },
        }
    }

    pub fn key_rotation_repo(&self) -> DbKeyRotationRepository {
        DbKeyRotationRepository {
            db: self.db.clone(),
        }
    }

    pub fn failed_logins(&self) -> RedisFailedLoginTracker {
        RedisFailedLoginTracker {
            pool: self.redis.clone(),
            threshold: self.settings.lockout_threshold,
            ttl_secs: self.settings.lockout_ttl_secs,
        }
    }
}
