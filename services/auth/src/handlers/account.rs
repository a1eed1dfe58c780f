use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use hms_auth_types::principal::AuthenticatedPrincipal;
use hms_core::response::ApiResponse;

use crate::error::AuthServiceError;
use crate::handlers::extract::Authenticated;
use crate::state::AppState;
use crate::usecase::password::{ChangePasswordInput, ChangePasswordUseCase};

// ── GET /auth/me ─────────────────────────────────────────────────────────────

pub async fn me(auth: Authenticated) -> Json<ApiResponse<AuthenticatedPrincipal>> {
    Json(ApiResponse::ok(auth.principal))
}

// ── POST /auth/password ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct ChangePasswordResponse {
    pub success: bool,
    pub message: &'static str,
}

pub async fn change_password(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<ChangePasswordResponse>, AuthServiceError> {
    let usecase = ChangePasswordUseCase {
        credentials: state.credential_repo(),
        sessions: state.session_store(),
        events: state.events.clone(),
        password_pepper: state.settings.password_pepper.clone(),
    };
    usecase
        .execute(ChangePasswordInput {
            user_id: auth.principal.user_id,
            tenant_id: auth.principal.tenant_id,
            current_password: body.current_password,
            new_password: body.new_password,
            client: auth.client,
        })
        .await?;
    Ok(Json(ChangePasswordResponse {
        success: true,
        message: "Password changed. Please sign in again.",
    }))
}
