use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hms_auth_types::token::{ACCESS_TOKEN_EXP, REFRESH_TOKEN_EXP};

use crate::domain::repository::{
    CredentialRepository, FailedLoginTracker, SessionRepository, TenantRepository, UserRepository,
};
use crate::domain::types::{
    ClientInfo, MfaConfig, SecurityEvent, SecurityEventType, Severity, TokenKind, TokenPair, User,
};
use crate::error::AuthServiceError;
use crate::infra::{password, totp};
use crate::usecase::security_event::SecurityEventEmitter;
use crate::usecase::session::SessionStore;
use crate::usecase::tenant::{default_tenant, validate_switch};

// ── MFA challenge token ──────────────────────────────────────────────────────

const MFA_CHALLENGE_PURPOSE: &str = "mfa_challenge";

/// Claims of the short-lived token exchanged through the `mfa` grant.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChallengeClaims {
    pub sub: String,
    pub tenant: Option<Uuid>,
    pub purpose: String,
    pub exp: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

pub fn issue_challenge_token(
    user_id: Uuid,
    tenant_id: Option<Uuid>,
    secret: &str,
    ttl_secs: u64,
) -> Result<String, AuthServiceError> {
    let claims = ChallengeClaims {
        sub: user_id.to_string(),
        tenant: tenant_id,
        purpose: MFA_CHALLENGE_PURPOSE.to_owned(),
        exp: now_secs() + ttl_secs,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthServiceError::Internal(e.into()))
}

/// Validate signature, expiry and purpose. Returns `(user_id, tenant_id)`.
pub fn decode_challenge_token(
    token: &str,
    secret: &str,
) -> Result<(Uuid, Option<Uuid>), AuthServiceError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<ChallengeClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|_| AuthServiceError::Unauthorized)?;

    if data.claims.purpose != MFA_CHALLENGE_PURPOSE {
        return Err(AuthServiceError::Unauthorized);
    }
    let user_id = data
        .claims
        .sub
        .parse::<Uuid>()
        .map_err(|_| AuthServiceError::Unauthorized)?;
    Ok((user_id, data.claims.tenant))
}

// ── IssueToken ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Grant {
    Password {
        username: String,
        password: String,
        tenant_id: Option<Uuid>,
    },
    RefreshToken {
        refresh_token: String,
    },
    Mfa {
        challenge_token: String,
        code: String,
    },
}

#[derive(Debug)]
pub struct IssuedTokens {
    pub user_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub refresh_expires_in: u64,
}

impl From<TokenPair> for IssuedTokens {
    fn from(pair: TokenPair) -> Self {
        Self {
            user_id: pair.access.user_id,
            tenant_id: pair.access.tenant_id,
            access_token: pair.access.token,
            refresh_token: pair.refresh.token,
            expires_in: ACCESS_TOKEN_EXP,
            refresh_expires_in: REFRESH_TOKEN_EXP,
        }
    }
}

#[derive(Debug)]
pub enum IssueTokenOutput {
    Issued(IssuedTokens),
    MfaRequired { challenge_token: String },
}

pub struct IssueTokenUseCase<U, C, T, S, F>
where
    U: UserRepository,
    C: CredentialRepository,
    T: TenantRepository,
    S: SessionRepository,
    F: FailedLoginTracker,
{
    pub users: U,
    pub credentials: C,
    pub tenants: T,
    pub sessions: SessionStore<S>,
    pub failures: F,
    pub events: SecurityEventEmitter,
    pub challenge_secret: String,
    pub challenge_ttl_secs: u64,
    pub password_pepper: Option<String>,
}

impl<U, C, T, S, F> IssueTokenUseCase<U, C, T, S, F>
where
    U: UserRepository,
    C: CredentialRepository,
    T: TenantRepository,
    S: SessionRepository,
    F: FailedLoginTracker,
{
    pub async fn execute(
        &self,
        grant: Grant,
        client: &ClientInfo,
    ) -> Result<IssueTokenOutput, AuthServiceError> {
        match grant {
            Grant::Password {
                username,
                password,
                tenant_id,
            } => {
                self.password_grant(&username, &password, tenant_id, client)
                    .await
            }
            Grant::RefreshToken { refresh_token } => self
                .refresh_grant(&refresh_token, client)
                .await
                .map(IssueTokenOutput::Issued),
            Grant::Mfa {
                challenge_token,
                code,
            } => self
                .mfa_grant(&challenge_token, &code, client)
                .await
                .map(IssueTokenOutput::Issued),
        }
    }

    async fn password_grant(
        &self,
        username: &str,
        password: &str,
        tenant_id: Option<Uuid>,
        client: &ClientInfo,
    ) -> Result<IssueTokenOutput, AuthServiceError> {
        let identifier = username.trim().to_lowercase();
        if identifier.is_empty() || password.is_empty() {
            return Err(AuthServiceError::InvalidRequest(
                "username and password are required".to_owned(),
            ));
        }

        // Locked identifiers are refused before the password is even looked at.
        if self.failures.is_locked(&identifier).await? {
            self.events.emit(
                SecurityEvent::new(SecurityEventType::LoginFailed, Severity::Warning)
                    .client(client)
                    .details(serde_json::json!({ "email": identifier, "reason": "locked" })),
            );
            return Err(AuthServiceError::AccountLocked);
        }

        let Some(user) = self.users.find_by_email(&identifier).await? else {
            return Err(self.reject(&identifier, None, client).await);
        };
        let verified = match self.credentials.find_password(user.id).await? {
            Some(cred) => password::verify_password(
                password,
                &cred.password_hash,
                self.password_pepper.as_deref(),
            )?,
            None => false,
        };
        if !verified {
            return Err(self.reject(&identifier, Some(user.id), client).await);
        }

        let membership = match tenant_id {
            Some(id) => validate_switch(&self.tenants, user.id, id).await?,
            None => default_tenant(&self.tenants, user.id).await?,
        };
        let tenant_id = Some(membership.hospital.id);

        if user.mfa_enabled() {
            let challenge_token = issue_challenge_token(
                user.id,
                tenant_id,
                &self.challenge_secret,
                self.challenge_ttl_secs,
            )?;
            self.events.emit(
                SecurityEvent::new(SecurityEventType::MfaChallengeIssued, Severity::Info)
                    .user(user.id)
                    .tenant(tenant_id)
                    .client(client),
            );
            return Ok(IssueTokenOutput::MfaRequired { challenge_token });
        }

        let issued = self.complete_login(&user, tenant_id, "password", client).await?;
        Ok(IssueTokenOutput::Issued(issued))
    }

    /// Count a failed attempt and build the error to return. Unknown emails
    /// count too so the response never reveals whether the account exists.
    async fn reject(
        &self,
        identifier: &str,
        user_id: Option<Uuid>,
        client: &ClientInfo,
    ) -> AuthServiceError {
        let attempts = match self.failures.record_failure(identifier).await {
            Ok(n) => n,
            Err(e) => return e,
        };

        let mut failed = SecurityEvent::new(SecurityEventType::LoginFailed, Severity::Warning)
            .client(client)
            .details(serde_json::json!({
                "email": identifier,
                "reason": "invalid_credentials",
                "attempts": attempts,
            }));
        failed.user_id = user_id;
        self.events.emit(failed);

        if attempts == self.failures.threshold() {
            let mut locked = SecurityEvent::new(SecurityEventType::AccountLocked, Severity::Critical)
                .client(client)
                .details(serde_json::json!({ "email": identifier, "attempts": attempts }));
            locked.user_id = user_id;
            self.events.emit(locked);
            tracing::warn!(attempts, "login identifier locked");
        }
        AuthServiceError::InvalidCredentials
    }

    async fn refresh_grant(
        &self,
        refresh_token: &str,
        client: &ClientInfo,
    ) -> Result<IssuedTokens, AuthServiceError> {
        if refresh_token.is_empty() {
            return Err(AuthServiceError::InvalidRequest(
                "refresh_token is required".to_owned(),
            ));
        }
        let refresh = self
            .sessions
            .find_valid(refresh_token, TokenKind::Refresh)
            .await?
            .ok_or(AuthServiceError::TokenExpired)?;

        let access = self
            .sessions
            .create(refresh.user_id, refresh.tenant_id, TokenKind::Access)
            .await?;

        self.events.emit(
            SecurityEvent::new(SecurityEventType::TokenRefreshed, Severity::Info)
                .user(refresh.user_id)
                .tenant(refresh.tenant_id)
                .client(client),
        );

        let remaining = (refresh.expires_at - Utc::now()).num_seconds().max(0) as u64;
        Ok(IssuedTokens {
            user_id: refresh.user_id,
            tenant_id: refresh.tenant_id,
            access_token: access.token,
            refresh_token: refresh.token,
            expires_in: ACCESS_TOKEN_EXP,
            refresh_expires_in: remaining,
        })
    }

    async fn mfa_grant(
        &self,
        challenge_token: &str,
        code: &str,
        client: &ClientInfo,
    ) -> Result<IssuedTokens, AuthServiceError> {
        if challenge_token.is_empty() || code.trim().is_empty() {
            return Err(AuthServiceError::InvalidRequest(
                "challenge_token and code are required".to_owned(),
            ));
        }
        let (user_id, tenant_id) = decode_challenge_token(challenge_token, &self.challenge_secret)?;
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthServiceError::Unauthorized)?;
        let config = match &user.mfa_config {
            Some(cfg) if cfg.enabled => cfg,
            _ => return Err(AuthServiceError::MfaNotEnabled),
        };
        // The membership may have changed while the challenge was outstanding.
        if let Some(id) = tenant_id {
            validate_switch(&self.tenants, user.id, id).await?;
        }

        if !self.check_second_factor(&user, config, code, tenant_id, client).await? {
            self.events.emit(
                SecurityEvent::new(SecurityEventType::MfaFailed, Severity::Warning)
                    .user(user.id)
                    .tenant(tenant_id)
                    .client(client),
            );
            return Err(AuthServiceError::InvalidMfaCode);
        }

        self.complete_login(&user, tenant_id, "mfa", client).await
    }

    /// TOTP first, then a single-use backup code.
    async fn check_second_factor(
        &self,
        user: &User,
        config: &MfaConfig,
        code: &str,
        tenant_id: Option<Uuid>,
        client: &ClientInfo,
    ) -> Result<bool, AuthServiceError> {
        if totp::verify_code(&config.secret, code)? {
            return Ok(true);
        }
        let normalized = code.trim().to_uppercase();
        let Some(remaining) = self.users.consume_backup_code(user.id, &normalized).await? else {
            return Ok(false);
        };
        self.events.emit(
            SecurityEvent::new(SecurityEventType::BackupCodeUsed, Severity::Warning)
                .user(user.id)
                .tenant(tenant_id)
                .client(client)
                .details(serde_json::json!({
                    "remaining": remaining,
                })),
        );
        Ok(true)
    }

    async fn complete_login(
        &self,
        user: &User,
        tenant_id: Option<Uuid>,
        method: &str,
        client: &ClientInfo,
    ) -> Result<IssuedTokens, AuthServiceError> {
        let pair = self.sessions.issue_pair(user.id, tenant_id).await?;
        self.failures.reset(&user.email.to_lowercase()).await?;
        self.users.touch_last_login(user.id, Utc::now()).await?;

        self.events.emit(
            SecurityEvent::new(SecurityEventType::LoginSuccess, Severity::Info)
                .user(user.id)
                .tenant(tenant_id)
                .client(client)
                .details(serde_json::json!({ "method": method })),
        );
        Ok(pair.into())
    }
}

// ── RevokeToken ────────────────────────────────────────────────────────────

/// Deletes exactly the named session. Sibling tokens stay valid; a token of
/// another user or an unknown token is ignored so the outcome is not observable.
pub struct RevokeTokenUseCase<S: SessionRepository> {
    pub sessions: SessionStore<S>,
    pub events: SecurityEventEmitter,
}

impl<S: SessionRepository> RevokeTokenUseCase<S> {
    pub async fn execute(
        &self,
        caller: Uuid,
        token: &str,
        token_type_hint: Option<&str>,
        client: &ClientInfo,
    ) -> Result<bool, AuthServiceError> {
        if token.is_empty() {
            return Err(AuthServiceError::InvalidRequest("token is required".to_owned()));
        }
        // The hint only documents intent; lookup is by value either way.
        let hint = token_type_hint.and_then(|h| h.parse::<TokenKind>().ok());

        let Some(session) = self.sessions.find(token).await? else {
            return Ok(false);
        };
        if session.user_id != caller {
            return Ok(false);
        }
        let deleted = self.sessions.delete_by_token(token).await?;
        if deleted {
            self.events.emit(
                SecurityEvent::new(SecurityEventType::TokenRevoked, Severity::Info)
                    .user(caller)
                    .tenant(session.tenant_id)
                    .client(client)
                    .details(serde_json::json!({
                        "tokenType": session.kind.as_str(),
                        "hintMatched": hint.is_none_or(|h| h == session.kind),
                    })),
            );
        }
        Ok(deleted)
    }
}

/// Parse the raw request fields into a [`Grant`].
pub fn parse_grant(
    grant_type: &str,
    username: Option<String>,
    password: Option<String>,
    tenant_id: Option<Uuid>,
    refresh_token: Option<String>,
    challenge_token: Option<String>,
    code: Option<String>,
) -> Result<Grant, AuthServiceError> {
    let required = |value: Option<String>, name: &str| {
        value
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AuthServiceError::InvalidRequest(format!("{name} is required")))
    };
    match grant_type {
        "password" => Ok(Grant::Password {
            username: required(username, "username")?,
            password: required(password, "password")?,
            tenant_id,
        }),
        "refresh_token" => Ok(Grant::RefreshToken {
            refresh_token: required(refresh_token, "refresh_token")?,
        }),
        "mfa" => Ok(Grant::Mfa {
            challenge_token: required(challenge_token, "challenge_token")?,
            code: required(code, "code")?,
        }),
        _ => Err(AuthServiceError::UnsupportedGrantType),
    }
}
