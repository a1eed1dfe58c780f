use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hms_core::response::ApiResponse;

use crate::error::AuthServiceError;
use crate::handlers::extract::Authenticated;
use crate::state::AppState;
use crate::usecase::mfa::{DisableMfaUseCase, EnableMfaUseCase, VerifyMfaUseCase};

// ── POST /mfa/enable ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnableMfaBody {
    pub secret: String,
    pub otpauth_url: String,
    pub backup_codes: Vec<String>,
}

pub async fn enable_mfa(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<Json<ApiResponse<EnableMfaBody>>, AuthServiceError> {
    let usecase = EnableMfaUseCase {
        users: state.user_repo(),
        issuer: state.settings.totp_issuer.clone(),
    };
    let out = usecase.execute(auth.principal.user_id).await?;
    Ok(Json(ApiResponse::ok(EnableMfaBody {
        secret: out.secret,
        otpauth_url: out.otpauth_url,
        backup_codes: out.backup_codes,
    })))
}

// ── POST /mfa/verify ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VerifyMfaRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyMfaBody {
    pub enabled: bool,
    #[serde(serialize_with = "hms_core::serde::to_rfc3339_ms")]
    pub verified_at: DateTime<Utc>,
}

pub async fn verify_mfa(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<VerifyMfaRequest>,
) -> Result<Json<ApiResponse<VerifyMfaBody>>, AuthServiceError> {
    let usecase = VerifyMfaUseCase {
        users: state.user_repo(),
        events: state.events.clone(),
    };
    let verified_at = usecase
        .execute(
            auth.principal.user_id,
            auth.principal.tenant_id,
            &body.code,
            &auth.client,
        )
        .await?;
    Ok(Json(ApiResponse::ok(VerifyMfaBody {
        enabled: true,
        verified_at,
    })))
}

// ── POST /mfa/disable ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DisableMfaBody {
    pub disabled: bool,
    pub message: &'static str,
}

pub async fn disable_mfa(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<Json<ApiResponse<DisableMfaBody>>, AuthServiceError> {
    let usecase = DisableMfaUseCase {
        users: state.user_repo(),
        events: state.events.clone(),
    };
    usecase
        .execute(auth.principal.user_id, auth.principal.tenant_id, &auth.client)
        .await?;
    Ok(Json(ApiResponse::ok(DisableMfaBody {
        disabled: true,
        message: "MFA has been disabled",
    })))
}
