use hms_auth::domain::types::{SecurityEventType, StaffStatus, TokenKind};
use hms_auth::error::AuthServiceError;
use hms_auth::infra::totp;
use hms_auth::usecase::token::{
    Grant, IssueTokenOutput, IssuedTokens, RevokeTokenUseCase, issue_challenge_token,
};

use crate::helpers::*;

const TOTP_SECRET: &str = "JBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXP";

fn issued(output: IssueTokenOutput) -> IssuedTokens {
    match output {
        IssueTokenOutput::Issued(tokens) => tokens,
        other => panic!("expected Issued, got {other:?}"),
    }
}

fn challenge(output: IssueTokenOutput) -> String {
    match output {
        IssueTokenOutput::MfaRequired { challenge_token } => challenge_token,
        other => panic!("expected MfaRequired, got {other:?}"),
    }
}

fn mfa_world(backup_codes: &[&str]) -> World {
    let mut user = test_user("mulder@hospital.test");
    user.mfa_config = Some(enabled_mfa(TOTP_SECRET, backup_codes));
    World::with_user(user)
}

// ── Password grant ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_issue_pair_for_valid_password() {
    let mut world = World::new();
    let out = world
        .issuer()
        .execute(password_grant("dana@hospital.test", PASSWORD, None), &client())
        .await
        .unwrap();
    let tokens = issued(out);

    assert_eq!(tokens.user_id, world.user.id);
    assert_eq!(tokens.expires_in, 3600);
    assert_eq!(tokens.refresh_expires_in, 604_800);
    assert_ne!(tokens.access_token, tokens.refresh_token);
    assert_eq!(world.sessions.count(), 2);

    let access = world.sessions.sessions.lock().unwrap()[&tokens.access_token].clone();
    assert_eq!(access.kind, TokenKind::Access);
    assert_eq!(world.drain_events(), vec![SecurityEventType::LoginSuccess]);
}

#[tokio::test]
async fn should_normalize_username_before_lookup() {
    let world = World::new();
    let out = world
        .issuer()
        .execute(password_grant("  Dana@Hospital.TEST ", PASSWORD, None), &client())
        .await
        .unwrap();
    assert_eq!(issued(out).user_id, world.user.id);
}

#[tokio::test]
async fn should_find_user_stored_with_mixed_case_email() {
    let world = World::with_user(test_user("Fox.Mulder@Hospital.test"));
    let out = world
        .issuer()
        .execute(password_grant("fox.mulder@hospital.test", PASSWORD, None), &client())
        .await
        .unwrap();
    assert_eq!(issued(out).user_id, world.user.id);
}

#[tokio::test]
async fn should_pick_first_active_tenant_by_name_when_none_requested() {
    let world = World::new();
    let out = world
        .issuer()
        .execute(password_grant("dana@hospital.test", PASSWORD, None), &client())
        .await
        .unwrap();
    assert_eq!(issued(out).tenant_id, Some(world.alpha.id));
}

#[tokio::test]
async fn should_scope_pair_to_requested_tenant() {
    let world = World::new();
    let out = world
        .issuer()
        .execute(
            password_grant("dana@hospital.test", PASSWORD, Some(world.zeta.id)),
            &client(),
        )
        .await
        .unwrap();
    assert_eq!(issued(out).tenant_id, Some(world.zeta.id));
}

#[tokio::test]
async fn should_reject_login_into_locked_membership() {
    let world = World::new();
    world
        .tenants
        .set_staff_status(world.user.id, world.beta.id, StaffStatus::Locked);

    let result = world
        .issuer()
        .execute(
            password_grant("dana@hospital.test", PASSWORD, Some(world.beta.id)),
            &client(),
        )
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::MembershipLocked)),
        "expected MembershipLocked, got {result:?}"
    );
    assert_eq!(world.sessions.count(), 0);
}

#[tokio::test]
async fn should_reject_wrong_password() {
    let mut world = World::new();
    let result = world
        .issuer()
        .execute(password_grant("dana@hospital.test", "nope-nope", None), &client())
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::InvalidCredentials)),
        "expected InvalidCredentials, got {result:?}"
    );
    assert_eq!(world.failures.attempts("dana@hospital.test"), 1);
    assert_eq!(world.drain_events(), vec![SecurityEventType::LoginFailed]);
}

#[tokio::test]
async fn should_reject_unknown_email_like_wrong_password() {
    let world = World::new();
    let result = world
        .issuer()
        .execute(password_grant("nobody@hospital.test", PASSWORD, None), &client())
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::InvalidCredentials)),
        "expected InvalidCredentials, got {result:?}"
    );
    assert_eq!(world.failures.attempts("nobody@hospital.test"), 1);
}

// ── Lockout ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_lock_identifier_after_threshold_failures() {
    let mut world = World::new();
    let issuer = world.issuer();

    for _ in 0..LOCKOUT_THRESHOLD {
        let result = issuer
            .execute(password_grant("dana@hospital.test", "wrong-pass", None), &client())
            .await;
        assert!(
            matches!(result, Err(AuthServiceError::InvalidCredentials)),
            "expected InvalidCredentials, got {result:?}"
        );
    }

    // The correct password no longer helps.
    let result = issuer
        .execute(password_grant("dana@hospital.test", PASSWORD, None), &client())
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::AccountLocked)),
        "expected AccountLocked, got {result:?}"
    );
    assert_eq!(world.sessions.count(), 0);

    let events = world.drain_events();
    let locked = events
        .iter()
        .filter(|e| **e == SecurityEventType::AccountLocked)
        .count();
    assert_eq!(locked, 1);
    assert_eq!(events.last(), Some(&SecurityEventType::LoginFailed));
}

#[tokio::test]
async fn should_reset_failures_after_successful_login() {
    let world = World::new();
    let issuer = world.issuer();

    for _ in 0..LOCKOUT_THRESHOLD - 1 {
        let _ = issuer
            .execute(password_grant("dana@hospital.test", "wrong-pass", None), &client())
            .await;
    }
    assert_eq!(world.failures.attempts("dana@hospital.test"), LOCKOUT_THRESHOLD - 1);

    issuer
        .execute(password_grant("dana@hospital.test", PASSWORD, None), &client())
        .await
        .unwrap();
    assert_eq!(world.failures.attempts("dana@hospital.test"), 0);
}

#[tokio::test]
async fn should_keep_identifier_locked_in_every_tenant() {
    let world = World::new();
    let issuer = world.issuer();

    for _ in 0..LOCKOUT_THRESHOLD {
        let _ = issuer
            .execute(
                password_grant("dana@hospital.test", "wrong-pass", Some(world.alpha.id)),
                &client(),
            )
            .await;
    }

    let result = issuer
        .execute(
            password_grant("dana@hospital.test", PASSWORD, Some(world.beta.id)),
            &client(),
        )
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::AccountLocked)),
        "expected AccountLocked, got {result:?}"
    );
    assert_eq!(world.sessions.count(), 0);
}

// ── MFA grant ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_return_challenge_instead_of_tokens_when_mfa_enabled() {
    let mut world = mfa_world(&[]);
    let out = world
        .issuer()
        .execute(password_grant("mulder@hospital.test", PASSWORD, None), &client())
        .await
        .unwrap();
    let token = challenge(out);

    assert!(!token.is_empty());
    assert_eq!(world.sessions.count(), 0);
    assert_eq!(world.drain_events(), vec![SecurityEventType::MfaChallengeIssued]);
}

#[tokio::test]
async fn should_exchange_challenge_and_totp_for_pair() {
    let mut world = mfa_world(&[]);
    let issuer = world.issuer();
    let token = challenge(
        issuer
            .execute(password_grant("mulder@hospital.test", PASSWORD, None), &client())
            .await
            .unwrap(),
    );

    let code = totp::current_code(TOTP_SECRET).unwrap();
    let tokens = issued(
        issuer
            .execute(
                Grant::Mfa {
                    challenge_token: token,
                    code,
                },
                &client(),
            )
            .await
            .unwrap(),
    );

    assert_eq!(tokens.user_id, world.user.id);
    assert_eq!(tokens.tenant_id, Some(world.alpha.id));
    assert_eq!(world.sessions.count(), 2);
    assert_eq!(
        world.drain_events(),
        vec![
            SecurityEventType::MfaChallengeIssued,
            SecurityEventType::LoginSuccess
        ]
    );
}

#[tokio::test]
async fn should_reject_wrong_totp_code() {
    let mut world = mfa_world(&[]);
    let token = issue_challenge_token(world.user.id, None, CHALLENGE_SECRET, 300).unwrap();

    let result = world
        .issuer()
        .execute(
            Grant::Mfa {
                challenge_token: token,
                code: "not-a-code".to_owned(),
            },
            &client(),
        )
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::InvalidMfaCode)),
        "expected InvalidMfaCode, got {result:?}"
    );
    assert_eq!(world.drain_events(), vec![SecurityEventType::MfaFailed]);
}

#[tokio::test]
async fn should_accept_backup_code_once_case_insensitively() {
    let mut world = mfa_world(&["AB12CD34", "ZZ99YY88"]);
    let issuer = world.issuer();

    let token = issue_challenge_token(world.user.id, None, CHALLENGE_SECRET, 300).unwrap();
    let grant = Grant::Mfa {
        challenge_token: token,
        code: "ab12cd34".to_owned(),
    };
    issuer.execute(grant.clone(), &client()).await.unwrap();

    let remaining = world.users.raw(world.user.id).mfa_config.unwrap().backup_codes;
    assert_eq!(remaining, vec!["ZZ99YY88".to_owned()]);

    let result = issuer.execute(grant, &client()).await;
    assert!(
        matches!(result, Err(AuthServiceError::InvalidMfaCode)),
        "expected InvalidMfaCode, got {result:?}"
    );
    assert_eq!(
        world.drain_events(),
        vec![
            SecurityEventType::BackupCodeUsed,
            SecurityEventType::LoginSuccess,
            SecurityEventType::MfaFailed
        ]
    );
}

#[tokio::test]
async fn should_report_backup_codes_left_after_use() {
    let mut world = mfa_world(&["AB12CD34", "ZZ99YY88"]);
    let token = issue_challenge_token(world.user.id, None, CHALLENGE_SECRET, 300).unwrap();

    world
        .issuer()
        .execute(
            Grant::Mfa {
                challenge_token: token,
                code: "AB12CD34".to_owned(),
            },
            &client(),
        )
        .await
        .unwrap();

    let used = std::iter::from_fn(|| world.event_rx.try_recv().ok())
        .find(|e| e.event_type == SecurityEventType::BackupCodeUsed)
        .unwrap();
    assert_eq!(used.details["remaining"], 1);
}

#[tokio::test]
async fn should_reject_mfa_grant_when_membership_locked_after_challenge() {
    let world = mfa_world(&[]);
    let issuer = world.issuer();
    let token = challenge(
        issuer
            .execute(password_grant("mulder@hospital.test", PASSWORD, None), &client())
            .await
            .unwrap(),
    );
    world
        .tenants
        .set_staff_status(world.user.id, world.alpha.id, StaffStatus::Locked);

    let result = issuer
        .execute(
            Grant::Mfa {
                challenge_token: token,
                code: totp::current_code(TOTP_SECRET).unwrap(),
            },
            &client(),
        )
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::MembershipLocked)),
        "expected MembershipLocked, got {result:?}"
    );
    assert_eq!(world.sessions.count(), 0);
}

#[tokio::test]
async fn should_reject_challenge_signed_with_another_secret() {
    let world = mfa_world(&[]);
    let forged = issue_challenge_token(world.user.id, None, "someone-else", 300).unwrap();

    let result = world
        .issuer()
        .execute(
            Grant::Mfa {
                challenge_token: forged,
                code: totp::current_code(TOTP_SECRET).unwrap(),
            },
            &client(),
        )
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::Unauthorized)),
        "expected Unauthorized, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_mfa_grant_for_user_without_mfa() {
    let world = World::new();
    let token = issue_challenge_token(world.user.id, None, CHALLENGE_SECRET, 300).unwrap();

    let result = world
        .issuer()
        .execute(
            Grant::Mfa {
                challenge_token: token,
                code: "123456".to_owned(),
            },
            &client(),
        )
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::MfaNotEnabled)),
        "expected MfaNotEnabled, got {result:?}"
    );
}

// ── Refresh grant ────────────────────────────────────────────────────────────

async fn login(world: &World) -> IssuedTokens {
    issued(
        world
            .issuer()
            .execute(password_grant("dana@hospital.test", PASSWORD, None), &client())
            .await
            .unwrap(),
    )
}

#[tokio::test]
async fn should_refresh_after_access_token_expired() {
    let mut world = World::new();
    let first = login(&world).await;
    world.sessions.expire(&first.access_token);
    world.drain_events();

    let refreshed = issued(
        world
            .issuer()
            .execute(
                Grant::RefreshToken {
                    refresh_token: first.refresh_token.clone(),
                },
                &client(),
            )
            .await
            .unwrap(),
    );

    assert_eq!(refreshed.refresh_token, first.refresh_token);
    assert_ne!(refreshed.access_token, first.access_token);
    assert_eq!(refreshed.tenant_id, first.tenant_id);
    assert!(refreshed.refresh_expires_in <= 604_800);
    assert!(refreshed.refresh_expires_in > 604_000);
    assert_eq!(world.drain_events(), vec![SecurityEventType::TokenRefreshed]);
}

#[tokio::test]
async fn should_keep_refresh_token_across_refreshes() {
    let world = World::new();
    let first = login(&world).await;
    let issuer = world.issuer();
    let grant = Grant::RefreshToken {
        refresh_token: first.refresh_token.clone(),
    };

    let a = issued(issuer.execute(grant.clone(), &client()).await.unwrap());
    let b = issued(issuer.execute(grant, &client()).await.unwrap());

    assert_eq!(a.refresh_token, b.refresh_token);
    assert_ne!(a.access_token, b.access_token);
    // Earlier access tokens stay valid.
    assert!(world.sessions.contains(&first.access_token));
    assert!(world.sessions.contains(&a.access_token));
}

#[tokio::test]
async fn should_reject_access_token_used_as_refresh_token() {
    let world = World::new();
    let first = login(&world).await;

    let result = world
        .issuer()
        .execute(
            Grant::RefreshToken {
                refresh_token: first.access_token,
            },
            &client(),
        )
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::TokenExpired)),
        "expected TokenExpired, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_expired_refresh_token() {
    let world = World::new();
    let first = login(&world).await;
    world.sessions.expire(&first.refresh_token);

    let result = world
        .issuer()
        .execute(
            Grant::RefreshToken {
                refresh_token: first.refresh_token,
            },
            &client(),
        )
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::TokenExpired)),
        "expected TokenExpired, got {result:?}"
    );
}

// ── Revoke ───────────────────────────────────────────────────────────────────

fn revoker(world: &World) -> RevokeTokenUseCase<MockSessionRepo> {
    RevokeTokenUseCase {
        sessions: world.session_store(),
        events: world.events.clone(),
    }
}

#[tokio::test]
async fn should_revoke_refresh_token_and_keep_access_token() {
    let mut world = World::new();
    let tokens = login(&world).await;
    world.drain_events();

    let revoked = revoker(&world)
        .execute(
            world.user.id,
            &tokens.refresh_token,
            Some("refresh_token"),
            &client(),
        )
        .await
        .unwrap();

    assert!(revoked);
    assert!(!world.sessions.contains(&tokens.refresh_token));
    assert!(world.sessions.contains(&tokens.access_token));
    assert_eq!(world.drain_events(), vec![SecurityEventType::TokenRevoked]);

    let result = world
        .issuer()
        .execute(
            Grant::RefreshToken {
                refresh_token: tokens.refresh_token,
            },
            &client(),
        )
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::TokenExpired)),
        "expected TokenExpired, got {result:?}"
    );
}

#[tokio::test]
async fn should_revoke_access_token_and_keep_refresh_token() {
    let world = World::new();
    let tokens = login(&world).await;

    let revoked = revoker(&world)
        .execute(world.user.id, &tokens.access_token, None, &client())
        .await
        .unwrap();

    assert!(revoked);
    assert!(!world.sessions.contains(&tokens.access_token));
    assert!(world.sessions.contains(&tokens.refresh_token));
}

#[tokio::test]
async fn should_ignore_revoke_of_another_users_token() {
    let mut world = World::new();
    let tokens = login(&world).await;
    world.drain_events();

    let revoked = revoker(&world)
        .execute(uuid::Uuid::new_v4(), &tokens.refresh_token, None, &client())
        .await
        .unwrap();

    assert!(!revoked);
    assert!(world.sessions.contains(&tokens.refresh_token));
    assert!(world.drain_events().is_empty());
}

#[tokio::test]
async fn should_ignore_revoke_of_unknown_token() {
    let world = World::new();
    let revoked = revoker(&world)
        .execute(world.user.id, "no-such-token", None, &client())
        .await
        .unwrap();
    assert!(!revoked);
}
