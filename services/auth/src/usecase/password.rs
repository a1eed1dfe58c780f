use uuid::Uuid;

use crate::domain::repository::{CredentialRepository, SessionRepository};
use crate::domain::types::{ClientInfo, MIN_PASSWORD_LEN, SecurityEvent, SecurityEventType, Severity};
use crate::error::AuthServiceError;
use crate::infra::password::{hash_password, verify_password};
use crate::usecase::security_event::SecurityEventEmitter;
use crate::usecase::session::SessionStore;

pub struct ChangePasswordInput {
    pub user_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub current_password: String,
    pub new_password: String,
    pub client: ClientInfo,
}

/// Replaces the password hash, then drops every session of the user in one
/// filtered delete before reporting success.
pub struct ChangePasswordUseCase<C: CredentialRepository, S: SessionRepository> {
    pub credentials: C,
    pub sessions: SessionStore<S>,
    pub events: SecurityEventEmitter,
    pub password_pepper: Option<String>,
}

impl<C: CredentialRepository, S: SessionRepository> ChangePasswordUseCase<C, S> {
    pub async fn execute(&self, input: ChangePasswordInput) -> Result<u64, AuthServiceError> {
        if input.new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthServiceError::InvalidRequest(format!(
                "new password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let pepper = self.password_pepper.as_deref();

        let credential = self
            .credentials
            .find_password(input.user_id)
            .await?
            .ok_or(AuthServiceError::InvalidCredentials)?;
        if !verify_password(&input.current_password, &credential.password_hash, pepper)? {
            return Err(AuthServiceError::InvalidCredentials);
        }

        let hash = hash_password(&input.new_password, pepper)?;
        self.credentials.update_password(input.user_id, &hash).await?;
        let revoked = self.sessions.delete_all_for_user(input.user_id).await?;

        self.events.emit(
            SecurityEvent::new(SecurityEventType::PasswordChanged, Severity::Warning)
                .user(input.user_id)
                .tenant(input.tenant_id)
                .client(&input.client)
                .details(serde_json::json!({ "sessionsRevoked": revoked })),
        );
        Ok(revoked)
    }
}
