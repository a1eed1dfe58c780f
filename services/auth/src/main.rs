use std::sync::Arc;

use sea_orm::Database;
use tracing::info;

use hms_auth::config::AuthConfig;
use hms_auth::domain::types::USER_PII_FIELDS;
use hms_auth::infra::db::DbSecurityEventRepository;
use hms_auth::router::build_router;
use hms_auth::state::{AppState, AuthSettings};
use hms_auth::usecase::security_event::{SecurityEventEmitter, run_consumer};
use hms_core::config::Config;
use hms_pii::{AesGcmEncryptor, FieldCodec, KeyProvider, StaticKeyRing};

#[tokio::main]
async fn main() {
    hms_core::tracing::init_tracing();

    let config = AuthConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let redis_cfg = deadpool_redis::Config::from_url(&config.redis_url);
    let redis = redis_cfg
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .expect("failed to create Redis pool");

    let keys: Arc<dyn KeyProvider> = Arc::new(
        StaticKeyRing::parse(&config.pii_keys, &config.pii_current_key_id)
            .expect("invalid PII_KEYS / PII_CURRENT_KEY_ID"),
    );
    let codec = Arc::new(FieldCodec::new(
        USER_PII_FIELDS.iter().copied(),
        Arc::new(AesGcmEncryptor::new(Arc::clone(&keys))),
    ));

    let (events, rx) = SecurityEventEmitter::channel();
    tokio::spawn(run_consumer(
        DbSecurityEventRepository { db: db.clone() },
        rx,
    ));

    let state = AppState {
        db,
        redis,
        codec,
        keys,
        events,
        settings: Arc::new(AuthSettings {
            challenge_token_secret: config.challenge_token_secret,
            password_pepper: config.password_pepper,
            totp_issuer: config.totp_issuer,
            lockout_threshold: config.lockout_threshold,
            lockout_ttl_secs: config.lockout_ttl_secs,
            mfa_challenge_ttl_secs: config.mfa_challenge_ttl_secs,
            key_rotation_max_age_days: config.key_rotation_max_age_days,
        }),
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.auth_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("auth service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
