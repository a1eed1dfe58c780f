use hms_auth::domain::types::{MfaState, SecurityEventType};
use hms_auth::error::AuthServiceError;
use hms_auth::infra::totp;
use hms_auth::usecase::mfa::{
    BACKUP_CODE_COUNT, DisableMfaUseCase, EnableMfaUseCase, VerifyMfaUseCase,
};
use hms_pii::is_encrypted;
use uuid::Uuid;

use crate::helpers::*;

struct Mfa {
    enable: EnableMfaUseCase<MockUserRepo>,
    verify: VerifyMfaUseCase<MockUserRepo>,
    disable: DisableMfaUseCase<MockUserRepo>,
}

fn mfa(world: &World) -> Mfa {
    Mfa {
        enable: EnableMfaUseCase {
            users: world.users.clone(),
            issuer: "HMS".to_owned(),
        },
        verify: VerifyMfaUseCase {
            users: world.users.clone(),
            events: world.events.clone(),
        },
        disable: DisableMfaUseCase {
            users: world.users.clone(),
            events: world.events.clone(),
        },
    }
}

async fn state(world: &World) -> MfaState {
    use hms_auth::domain::repository::UserRepository;
    world
        .users
        .find_by_id(world.user.id)
        .await
        .unwrap()
        .unwrap()
        .mfa_state()
}

#[tokio::test]
async fn should_walk_disabled_pending_enabled_disabled() {
    let mut world = World::new();
    let mfa = mfa(&world);
    let tenant = Some(world.alpha.id);
    assert_eq!(state(&world).await, MfaState::Disabled);

    let enrollment = mfa.enable.execute(world.user.id).await.unwrap();
    assert!(enrollment.otpauth_url.starts_with("otpauth://totp/"));
    assert_eq!(enrollment.backup_codes.len(), BACKUP_CODE_COUNT);
    assert_eq!(state(&world).await, MfaState::Pending);

    let code = totp::current_code(&enrollment.secret).unwrap();
    mfa.verify
        .execute(world.user.id, tenant, &code, &client())
        .await
        .unwrap();
    assert_eq!(state(&world).await, MfaState::Enabled);

    mfa.disable
        .execute(world.user.id, tenant, &client())
        .await
        .unwrap();
    assert_eq!(state(&world).await, MfaState::Disabled);
    assert!(world.users.raw(world.user.id).mfa_config.is_none());

    assert_eq!(
        world.drain_events(),
        vec![SecurityEventType::MfaEnabled, SecurityEventType::MfaDisabled]
    );
}

#[tokio::test]
async fn should_replace_pending_secret_on_second_enable() {
    let world = World::new();
    let mfa = mfa(&world);

    let first = mfa.enable.execute(world.user.id).await.unwrap();
    let second = mfa.enable.execute(world.user.id).await.unwrap();
    assert_ne!(first.secret, second.secret);

    let stale = totp::current_code(&first.secret).unwrap();
    let fresh = totp::current_code(&second.secret).unwrap();
    // The stale code could collide with the fresh one by chance.
    if stale != fresh {
        let result = mfa
            .verify
            .execute(world.user.id, None, &stale, &client())
            .await;
        assert!(
            matches!(result, Err(AuthServiceError::InvalidMfaCode)),
            "expected InvalidMfaCode, got {result:?}"
        );
    }
    mfa.verify
        .execute(world.user.id, None, &fresh, &client())
        .await
        .unwrap();
}

#[tokio::test]
async fn should_refuse_enable_when_already_enabled() {
    let world = World::new();
    let mfa = mfa(&world);
    let enrollment = mfa.enable.execute(world.user.id).await.unwrap();
    let code = totp::current_code(&enrollment.secret).unwrap();
    mfa.verify
        .execute(world.user.id, None, &code, &client())
        .await
        .unwrap();

    let result = mfa.enable.execute(world.user.id).await;
    assert!(
        matches!(result, Err(AuthServiceError::MfaAlreadyEnabled)),
        "expected MfaAlreadyEnabled, got {result:?}"
    );
    let result = mfa
        .verify
        .execute(world.user.id, None, &code, &client())
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::MfaAlreadyEnabled)),
        "expected MfaAlreadyEnabled, got {result:?}"
    );
}

#[tokio::test]
async fn should_refuse_verify_before_enable() {
    let world = World::new();
    let result = mfa(&world)
        .verify
        .execute(world.user.id, None, "123456", &client())
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::MfaNotConfigured)),
        "expected MfaNotConfigured, got {result:?}"
    );
}

#[tokio::test]
async fn should_keep_pending_and_emit_failure_on_wrong_code() {
    let mut world = World::new();
    let mfa = mfa(&world);
    mfa.enable.execute(world.user.id).await.unwrap();

    let result = mfa
        .verify
        .execute(world.user.id, None, "12345x", &client())
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::InvalidMfaCode)),
        "expected InvalidMfaCode, got {result:?}"
    );
    assert_eq!(state(&world).await, MfaState::Pending);
    assert_eq!(world.drain_events(), vec![SecurityEventType::MfaFailed]);
}

#[tokio::test]
async fn should_refuse_disable_when_not_enabled() {
    let world = World::new();
    let mfa = mfa(&world);

    let result = mfa.disable.execute(world.user.id, None, &client()).await;
    assert!(
        matches!(result, Err(AuthServiceError::MfaNotEnabled)),
        "expected MfaNotEnabled, got {result:?}"
    );

    // Pending is not enabled either.
    mfa.enable.execute(world.user.id).await.unwrap();
    let result = mfa.disable.execute(world.user.id, None, &client()).await;
    assert!(
        matches!(result, Err(AuthServiceError::MfaNotEnabled)),
        "expected MfaNotEnabled, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_unknown_user() {
    let world = World::new();
    let result = mfa(&world).enable.execute(Uuid::new_v4()).await;
    assert!(
        matches!(result, Err(AuthServiceError::Unauthorized)),
        "expected Unauthorized, got {result:?}"
    );
}

#[tokio::test]
async fn should_store_totp_secret_encrypted() {
    let mut world = World::new();
    world.users = MockUserRepo::with_codec(
        vec![world.user.clone()],
        user_codec(key_ring("k1", &["k1"])),
    );
    let mfa = mfa(&world);

    let enrollment = mfa.enable.execute(world.user.id).await.unwrap();

    let raw = world.users.raw(world.user.id);
    let stored = raw.mfa_config.unwrap();
    assert!(is_encrypted(&stored.secret), "secret stored as {}", stored.secret);
    assert_ne!(stored.secret, enrollment.secret);
    assert!(is_encrypted(&raw.name));
    // Backup codes are compared in storage, so they stay plaintext.
    assert_eq!(stored.backup_codes, enrollment.backup_codes);

    // Reading back decrypts transparently.
    let code = totp::current_code(&enrollment.secret).unwrap();
    mfa.verify
        .execute(world.user.id, None, &code, &client())
        .await
        .unwrap();
    assert_eq!(state(&world).await, MfaState::Enabled);
}
