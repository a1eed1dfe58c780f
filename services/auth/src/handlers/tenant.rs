use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hms_core::response::ApiResponse;

use crate::domain::types::{StaffStatus, TenantStatus};
use crate::error::AuthServiceError;
use crate::handlers::extract::Authenticated;
use crate::handlers::token::{TokenPairResponse, parse_tenant_id};
use crate::state::AppState;
use crate::usecase::tenant::{
    ListTenantsUseCase, SwitchTenantInput, SwitchTenantUseCase, TenantSummary,
};
use crate::usecase::token::IssuedTokens;

// ── GET /auth/tenants ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RoleBody {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantBody {
    pub id: Uuid,
    pub name: String,
    pub status: TenantStatus,
    pub staff_status: StaffStatus,
    pub is_current: bool,
    pub roles: Vec<RoleBody>,
}

impl From<TenantSummary> for TenantBody {
    fn from(t: TenantSummary) -> Self {
        Self {
            id: t.id,
            name: t.name,
            status: t.status,
            staff_status: t.staff_status,
            is_current: t.is_current,
            roles: t
                .roles
                .into_iter()
                .map(|r| RoleBody {
                    id: r.id,
                    name: r.name,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantListBody {
    pub tenants: Vec<TenantBody>,
    pub current_tenant_id: Option<Uuid>,
}

pub async fn list_tenants(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<Json<ApiResponse<TenantListBody>>, AuthServiceError> {
    let usecase = ListTenantsUseCase {
        tenants: state.tenant_repo(),
    };
    let out = usecase
        .execute(auth.principal.user_id, auth.principal.tenant_id)
        .await?;
    Ok(Json(ApiResponse::ok(TenantListBody {
        tenants: out.tenants.into_iter().map(TenantBody::from).collect(),
        current_tenant_id: out.current_tenant_id,
    })))
}

// ── POST /auth/tenants/switch ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SwitchTenantRequest {
    pub tenant_id: String,
}

pub async fn switch_tenant(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<SwitchTenantRequest>,
) -> Result<Json<TokenPairResponse>, AuthServiceError> {
    let tenant_id = parse_tenant_id(Some(&body.tenant_id))?
        .ok_or_else(|| AuthServiceError::InvalidRequest("tenant_id is required".to_owned()))?;

    let usecase = SwitchTenantUseCase {
        tenants: state.tenant_repo(),
        sessions: state.session_store(),
        events: state.events.clone(),
    };
    let pair = usecase
        .execute(SwitchTenantInput {
            user_id: auth.principal.user_id,
            current_tenant_id: auth.principal.tenant_id,
            tenant_id,
            client: auth.client,
        })
        .await?;
    Ok(Json(TokenPairResponse::from(IssuedTokens::from(pair))))
}
