use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hms_auth_types::token::TOKEN_TYPE_BEARER;

use crate::error::AuthServiceError;
use crate::handlers::extract::{Authenticated, Client};
use crate::state::AppState;
use crate::usecase::token::{
    IssueTokenOutput, IssueTokenUseCase, IssuedTokens, RevokeTokenUseCase, parse_grant,
};

/// Parse an optional tenant id from a request body.
pub(crate) fn parse_tenant_id(raw: Option<&str>) -> Result<Option<Uuid>, AuthServiceError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse::<Uuid>()
            .map(Some)
            .map_err(|_| AuthServiceError::InvalidRequest("tenant_id must be a UUID".to_owned())),
    }
}

#[derive(Debug, Serialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub refresh_expires_in: u64,
}

impl From<IssuedTokens> for TokenPairResponse {
    fn from(t: IssuedTokens) -> Self {
        Self {
            access_token: t.access_token,
            refresh_token: t.refresh_token,
            token_type: TOKEN_TYPE_BEARER,
            expires_in: t.expires_in,
            refresh_expires_in: t.refresh_expires_in,
        }
    }
}

// ── POST /auth/token ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub grant_type: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub tenant_id: Option<String>,
    pub refresh_token: Option<String>,
    pub challenge_token: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChallengeResponse {
    pub challenge_token: String,
}

pub async fn issue_token(
    State(state): State<AppState>,
    Client(client): Client,
    Json(body): Json<TokenRequest>,
) -> Result<Response, AuthServiceError> {
    let grant = parse_grant(
        &body.grant_type,
        body.username,
        body.password,
        parse_tenant_id(body.tenant_id.as_deref())?,
        body.refresh_token,
        body.challenge_token,
        body.code,
    )?;

    let usecase = IssueTokenUseCase {
        users: state.user_repo(),
        credentials: state.credential_repo(),
        tenants: state.tenant_repo(),
        sessions: state.session_store(),
        failures: state.failed_logins(),
        events: state.events.clone(),
        challenge_secret: state.settings.challenge_token_secret.clone(),
        challenge_ttl_secs: state.settings.mfa_challenge_ttl_secs,
        password_pepper: state.settings.password_pepper.clone(),
    };

    let response = match usecase.execute(grant, &client).await? {
        IssueTokenOutput::Issued(tokens) => Json(TokenPairResponse::from(tokens)).into_response(),
        IssueTokenOutput::MfaRequired { challenge_token } => {
            Json(ChallengeResponse { challenge_token }).into_response()
        }
    };
    Ok(response)
}

// ── POST /auth/revoke ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RevokeRequest {
    pub token: String,
    pub token_type_hint: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RevokeResponse {
    pub revoked: bool,
}

pub async fn revoke_token(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<RevokeRequest>,
) -> Result<Json<RevokeResponse>, AuthServiceError> {
    let usecase = RevokeTokenUseCase {
        sessions: state.session_store(),
        events: state.events.clone(),
    };
    usecase
        .execute(
            auth.principal.user_id,
            &body.token,
            body.token_type_hint.as_deref(),
            &auth.client,
        )
        .await?;
    Ok(Json(RevokeResponse { revoked: true }))
}
