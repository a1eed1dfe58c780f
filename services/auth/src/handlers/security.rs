use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use hms_core::response::ApiResponse;

use crate::error::AuthServiceError;
use crate::handlers::extract::Authenticated;
use crate::state::AppState;
use crate::usecase::keys::{KeyStatusUseCase, LastRotation, RotateKeysUseCase};

// ── GET /security/keys/status ────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastRotationBody {
    #[serde(serialize_with = "hms_core::serde::to_rfc3339_ms")]
    pub rotated_at: DateTime<Utc>,
    pub rotated_by: Uuid,
    pub records_re_encrypted: u64,
    pub days_since_rotation: i64,
}

impl From<LastRotation> for LastRotationBody {
    fn from(r: LastRotation) -> Self {
        Self {
            rotated_at: r.rotated_at,
            rotated_by: r.rotated_by,
            records_re_encrypted: r.records_re_encrypted,
            days_since_rotation: r.days_since_rotation,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyStatusBody {
    pub current_key_id: String,
    pub last_rotation: Option<LastRotationBody>,
    pub rotation_recommended: bool,
    pub total_rotations: u64,
}

pub async fn key_status(
    State(state): State<AppState>,
    _auth: Authenticated,
) -> Result<Json<ApiResponse<KeyStatusBody>>, AuthServiceError> {
    let usecase = KeyStatusUseCase {
        rotations: state.key_rotation_repo(),
        keys: state.keys.clone(),
        max_age_days: state.settings.key_rotation_max_age_days,
    };
    let status = usecase.execute().await?;
    Ok(Json(ApiResponse::ok(KeyStatusBody {
        current_key_id: status.current_key_id,
        last_rotation: status.last_rotation.map(LastRotationBody::from),
        rotation_recommended: status.rotation_recommended,
        total_rotations: status.total_rotations,
    })))
}

// ── POST /security/keys/rotate ───────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRotationBody {
    pub id: Uuid,
    pub key_id: String,
    #[serde(serialize_with = "hms_core::serde::to_rfc3339_ms")]
    pub rotated_at: DateTime<Utc>,
    pub rotated_by: Uuid,
    pub records_re_encrypted: u64,
}

pub async fn rotate_keys(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<Json<ApiResponse<KeyRotationBody>>, AuthServiceError> {
    let usecase = RotateKeysUseCase {
        users: state.user_repo(),
        rotations: state.key_rotation_repo(),
        keys: state.keys.clone(),
        events: state.events.clone(),
    };
    let rotation = usecase.execute(&auth.principal, &auth.client).await?;
    Ok(Json(ApiResponse::ok(KeyRotationBody {
        id: rotation.id,
        key_id: rotation.key_id,
        rotated_at: rotation.rotated_at,
        rotated_by: rotation.rotated_by,
        records_re_encrypted: rotation.records_re_encrypted,
    })))
}
