use axum::Json;
use axum::http::StatusCode;
use serde_json::{Value, json};

/// Handler for `GET /healthz` — liveness check.
pub async fn healthz() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

/// Handler for `GET /readyz`. Services with hard dependencies mount their own.
pub async fn readyz() -> StatusCode {
    StatusCode::OK
}
