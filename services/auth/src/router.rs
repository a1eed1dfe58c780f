use axum::{
    Router,
    routing::{get, post},
};

use hms_core::health::{healthz, readyz};
use hms_core::middleware::{propagate_request_id_layer, request_id_layer, trace_layer};

use crate::handlers::{
    account::{change_password, me},
    mfa::{disable_mfa, enable_mfa, verify_mfa},
    security::{key_status, rotate_keys},
    tenant::{list_tenants, switch_tenant},
    token::{issue_token, revoke_token},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Token
        .route("/auth/token", post(issue_token))
        .route("/auth/revoke", post(revoke_token))
        // Account
        .route("/auth/me", get(me))
        .route("/auth/password", post(change_password))
        // Tenants
        .route("/auth/tenants", get(list_tenants))
        .route("/auth/tenants/switch", post(switch_tenant))
        // MFA
        .route("/mfa/enable", post(enable_mfa))
        .route("/mfa/verify", post(verify_mfa))
        .route("/mfa/disable", post(disable_mfa))
        // PII keys
        .route("/security/keys/status", get(key_status))
        .route("/security/keys/rotate", post(rotate_keys))
        .layer(propagate_request_id_layer())
        .layer(trace_layer())
        .layer(request_id_layer())
        .with_state(state)
}
