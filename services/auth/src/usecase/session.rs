use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use rand::RngExt;
use uuid::Uuid;

use crate::domain::repository::SessionRepository;
use crate::domain::types::{Session, TokenKind, TokenPair};
use crate::error::AuthServiceError;

/// Opaque bearer token: 32 random bytes, URL-safe base64.
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Session lifecycle on top of a [`SessionRepository`]. Sessions are only
/// ever inserted or deleted; expiry is fixed at creation.
pub struct SessionStore<S: SessionRepository> {
    pub sessions: S,
}

impl<S: SessionRepository> SessionStore<S> {
    pub async fn create(
        &self,
        user_id: Uuid,
        tenant_id: Option<Uuid>,
        kind: TokenKind,
    ) -> Result<Session, AuthServiceError> {
        let now = Utc::now();
        let session = Session {
            token: generate_token(),
            kind,
            user_id,
            tenant_id,
            expires_at: now + Duration::seconds(kind.lifetime_secs() as i64),
            created_at: now,
        };
        self.sessions.insert(&session).await?;
        Ok(session)
    }

    pub async fn issue_pair(
        &self,
        user_id: Uuid,
        tenant_id: Option<Uuid>,
    ) -> Result<TokenPair, AuthServiceError> {
        let access = self.create(user_id, tenant_id, TokenKind::Access).await?;
        let refresh = self.create(user_id, tenant_id, TokenKind::Refresh).await?;
        Ok(TokenPair { access, refresh })
    }

    pub async fn find(&self, token: &str) -> Result<Option<Session>, AuthServiceError> {
        self.sessions.find(token).await
    }

    /// A session of `kind` that has not expired yet.
    pub async fn find_valid(
        &self,
        token: &str,
        kind: TokenKind,
    ) -> Result<Option<Session>, AuthServiceError> {
        let now = Utc::now();
        Ok(self
            .sessions
            .find(token)
            .await?
            .filter(|s| s.kind == kind && !s.is_expired(now)))
    }

    pub async fn delete_by_token(&self, token: &str) -> Result<bool, AuthServiceError> {
        self.sessions.delete_by_token(token).await
    }

    pub async fn delete_all_for_user(&self, user_id: Uuid) -> Result<u64, AuthServiceError> {
        self.sessions.delete_all_for_user(user_id).await
    }
}
