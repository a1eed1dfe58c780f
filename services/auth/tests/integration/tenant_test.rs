use hms_auth::domain::types::{SecurityEventType, StaffStatus, TenantStatus, TokenKind};
use hms_auth::error::AuthServiceError;
use hms_auth::usecase::tenant::{
    ListTenantsUseCase, SwitchTenantInput, SwitchTenantUseCase, TenantSummary,
};

use crate::helpers::*;

fn names(tenants: &[TenantSummary]) -> Vec<&str> {
    tenants.iter().map(|t| t.name.as_str()).collect()
}

fn switcher(world: &World) -> SwitchTenantUseCase<MockTenantRepo, MockSessionRepo> {
    SwitchTenantUseCase {
        tenants: world.tenants.clone(),
        sessions: world.session_store(),
        events: world.events.clone(),
    }
}

fn switch_input(world: &World, from: uuid::Uuid, to: uuid::Uuid) -> SwitchTenantInput {
    SwitchTenantInput {
        user_id: world.user.id,
        current_tenant_id: Some(from),
        tenant_id: to,
        client: client(),
    }
}

// ── List ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_list_current_tenant_first_then_by_name() {
    let world = World::new();
    let out = ListTenantsUseCase {
        tenants: world.tenants.clone(),
    }
    .execute(world.user.id, Some(world.beta.id))
    .await
    .unwrap();

    assert_eq!(names(&out.tenants), vec!["Beta", "Alpha", "Zeta"]);
    assert_eq!(out.current_tenant_id, Some(world.beta.id));
    let current: Vec<bool> = out.tenants.iter().map(|t| t.is_current).collect();
    assert_eq!(current, vec![true, false, false]);
    assert_eq!(out.tenants[0].roles.len(), 1);
    assert_eq!(out.tenants[0].roles[0].name, "doctor");
}

#[tokio::test]
async fn should_sort_names_case_sensitively() {
    let world = World::new();
    let lower = world.tenants.add_hospital("acme", TenantStatus::Active);
    world
        .tenants
        .add_staff(world.user.id, lower.id, vec![], StaffStatus::Active);

    let out = ListTenantsUseCase {
        tenants: world.tenants.clone(),
    }
    .execute(world.user.id, None)
    .await
    .unwrap();

    assert_eq!(names(&out.tenants), vec!["Alpha", "Beta", "Zeta", "acme"]);
    assert!(out.tenants.iter().all(|t| !t.is_current));
}

#[tokio::test]
async fn should_report_tenant_and_staff_status_independently() {
    let world = World::new();
    world
        .tenants
        .set_hospital_status(world.zeta.id, TenantStatus::Suspended);
    world
        .tenants
        .set_staff_status(world.user.id, world.beta.id, StaffStatus::PasswordExpired);

    let out = ListTenantsUseCase {
        tenants: world.tenants.clone(),
    }
    .execute(world.user.id, Some(world.alpha.id))
    .await
    .unwrap();

    let beta = out.tenants.iter().find(|t| t.id == world.beta.id).unwrap();
    assert_eq!(beta.status, TenantStatus::Active);
    assert_eq!(beta.staff_status, StaffStatus::PasswordExpired);

    let zeta = out.tenants.iter().find(|t| t.id == world.zeta.id).unwrap();
    assert_eq!(zeta.status, TenantStatus::Suspended);
    assert_eq!(zeta.staff_status, StaffStatus::Active);
}

// ── Switch ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_switch_and_mark_only_new_tenant_current() {
    let mut world = World::new();
    let pair = switcher(&world)
        .execute(switch_input(&world, world.alpha.id, world.zeta.id))
        .await
        .unwrap();

    assert_eq!(pair.access.kind, TokenKind::Access);
    assert_eq!(pair.access.tenant_id, Some(world.zeta.id));
    assert_eq!(pair.refresh.tenant_id, Some(world.zeta.id));
    assert_eq!(world.drain_events(), vec![SecurityEventType::TenantSwitched]);

    let out = ListTenantsUseCase {
        tenants: world.tenants.clone(),
    }
    .execute(world.user.id, pair.access.tenant_id)
    .await
    .unwrap();
    let current: Vec<&str> = out
        .tenants
        .iter()
        .filter(|t| t.is_current)
        .map(|t| t.name.as_str())
        .collect();
    assert_eq!(current, vec!["Zeta"]);
}

#[tokio::test]
async fn should_keep_previous_sessions_valid_after_switch() {
    let world = World::new();
    let before = world
        .session_store()
        .issue_pair(world.user.id, Some(world.alpha.id))
        .await
        .unwrap();

    switcher(&world)
        .execute(switch_input(&world, world.alpha.id, world.beta.id))
        .await
        .unwrap();

    let still = world
        .session_store()
        .find_valid(&before.access.token, TokenKind::Access)
        .await
        .unwrap();
    assert_eq!(still.map(|s| s.tenant_id), Some(Some(world.alpha.id)));
    assert_eq!(world.sessions.count(), 4);
}

#[tokio::test]
async fn should_reject_switch_to_unknown_tenant() {
    let world = World::new();
    let result = switcher(&world)
        .execute(switch_input(&world, world.alpha.id, uuid::Uuid::new_v4()))
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::TenantNotFound)),
        "expected TenantNotFound, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_switch_to_inactive_tenant() {
    let world = World::new();
    world
        .tenants
        .set_hospital_status(world.beta.id, TenantStatus::Suspended);
    let result = switcher(&world)
        .execute(switch_input(&world, world.alpha.id, world.beta.id))
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::TenantNotActive)),
        "expected TenantNotActive, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_switch_without_membership() {
    let world = World::new();
    let other = world.tenants.add_hospital("Omega", TenantStatus::Active);
    let result = switcher(&world)
        .execute(switch_input(&world, world.alpha.id, other.id))
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::NotAssociated)),
        "expected NotAssociated, got {result:?}"
    );
}

#[tokio::test]
async fn should_map_staff_status_to_switch_errors() {
    let world = World::new();
    let cases = [
        (StaffStatus::Locked, "MembershipLocked"),
        (StaffStatus::PasswordExpired, "PasswordExpired"),
        (StaffStatus::Inactive, "MembershipInactive"),
    ];
    for (status, expected) in cases {
        world
            .tenants
            .set_staff_status(world.user.id, world.beta.id, status);
        let result = switcher(&world)
            .execute(switch_input(&world, world.alpha.id, world.beta.id))
            .await;
        let ok = match (&result, status) {
            (Err(AuthServiceError::MembershipLocked), StaffStatus::Locked) => true,
            (Err(AuthServiceError::PasswordExpired), StaffStatus::PasswordExpired) => true,
            (Err(AuthServiceError::MembershipInactive), StaffStatus::Inactive) => true,
            _ => false,
        };
        assert!(ok, "expected {expected}, got {result:?}");
    }
    assert_eq!(world.sessions.count(), 0);
}
