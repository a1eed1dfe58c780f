use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tower::ServiceExt;

use hms_auth::router::build_router;
use hms_auth::state::{AppState, AuthSettings};
use hms_auth::usecase::security_event::SecurityEventEmitter;

use crate::helpers::*;

/// Router over a state whose stores are never reached: every request here is
/// rejected or answered before any repository call.
fn router() -> Router {
    let keys = key_ring("k1", &["k1"]);
    let redis = deadpool_redis::Config::from_url("redis://127.0.0.1:6379")
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .unwrap();
    let (events, _rx) = SecurityEventEmitter::channel();
    build_router(AppState {
        db: DatabaseConnection::Disconnected,
        redis,
        codec: user_codec(keys.clone()),
        keys,
        events,
        settings: Arc::new(AuthSettings {
            challenge_token_secret: CHALLENGE_SECRET.to_owned(),
            password_pepper: None,
            totp_issuer: "HMS".to_owned(),
            lockout_threshold: LOCKOUT_THRESHOLD,
            lockout_ttl_secs: 900,
            mfa_challenge_ttl_secs: 300,
            key_rotation_max_age_days: 90,
        }),
    })
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn should_answer_healthz() {
    let response = router()
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn should_reject_me_without_bearer() {
    let response = router()
        .oneshot(Request::get("/auth/me").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn should_reject_non_bearer_scheme() {
    let response = router()
        .oneshot(
            Request::get("/auth/tenants")
                .header(header::AUTHORIZATION, "Basic ZGFuYTpodW50ZXIy")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn should_reject_unsupported_grant_type() {
    let response = router()
        .oneshot(
            Request::post("/auth/token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"grant_type":"client_credentials"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"]["code"],
        "UNSUPPORTED_GRANT_TYPE"
    );
}

#[tokio::test]
async fn should_reject_password_grant_without_password() {
    let response = router()
        .oneshot(
            Request::post("/auth/token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"grant_type":"password","username":"dana@hospital.test"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");
    assert_eq!(body["error"]["message"], "password is required");
}

#[tokio::test]
async fn should_echo_request_id() {
    let response = router()
        .oneshot(
            Request::get("/healthz")
                .header("x-request-id", "req-1234")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-1234");
}

#[tokio::test]
async fn should_assign_request_id_when_missing() {
    let response = router()
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
