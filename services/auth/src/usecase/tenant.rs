use uuid::Uuid;

use crate::domain::repository::{SessionRepository, TenantRepository};
use crate::domain::types::{
    ClientInfo, Membership, SecurityEvent, SecurityEventType, Severity, StaffStatus,
    TenantStatus, TokenPair,
};
use crate::error::AuthServiceError;
use crate::usecase::security_event::SecurityEventEmitter;
use crate::usecase::session::SessionStore;

/// Check that `user_id` may act inside `tenant_id`.
///
/// Tenant health is checked before membership so an unknown or suspended
/// hospital is reported the same way to members and non-members.
pub async fn validate_switch<T: TenantRepository>(
    tenants: &T,
    user_id: Uuid,
    tenant_id: Uuid,
) -> Result<Membership, AuthServiceError> {
    let hospital = tenants
        .find_hospital(tenant_id)
        .await?
        .ok_or(AuthServiceError::TenantNotFound)?;
    if hospital.status != TenantStatus::Active {
        return Err(AuthServiceError::TenantNotActive);
    }

    let staff = tenants
        .find_membership(user_id, tenant_id)
        .await?
        .ok_or(AuthServiceError::NotAssociated)?;
    match staff.status {
        StaffStatus::Active => Ok(Membership { staff, hospital }),
        StaffStatus::Locked => Err(AuthServiceError::MembershipLocked),
        StaffStatus::PasswordExpired => Err(AuthServiceError::PasswordExpired),
        StaffStatus::Inactive => Err(AuthServiceError::MembershipInactive),
    }
}

/// First usable membership by hospital name, for logins that name no tenant.
pub async fn default_tenant<T: TenantRepository>(
    tenants: &T,
    user_id: Uuid,
) -> Result<Membership, AuthServiceError> {
    let mut usable: Vec<Membership> = tenants
        .list_memberships(user_id)
        .await?
        .into_iter()
        .filter(|m| {
            m.staff.status == StaffStatus::Active && m.hospital.status == TenantStatus::Active
        })
        .collect();
    usable.sort_by(|a, b| a.hospital.name.cmp(&b.hospital.name));
    usable
        .into_iter()
        .next()
        .ok_or(AuthServiceError::NotAssociated)
}

// ── ListTenants ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct RoleRef {
    pub id: Uuid,
    pub name: String,
}

/// One row of the tenant picker. `status` and `staff_status` are reported
/// independently.
#[derive(Debug, Clone, PartialEq)]
pub struct TenantSummary {
    pub id: Uuid,
    pub name: String,
    pub status: TenantStatus,
    pub staff_status: StaffStatus,
    pub is_current: bool,
    pub roles: Vec<RoleRef>,
}

#[derive(Debug)]
pub struct ListTenantsOutput {
    pub tenants: Vec<TenantSummary>,
    pub current_tenant_id: Option<Uuid>,
}

pub struct ListTenantsUseCase<T: TenantRepository> {
    pub tenants: T,
}

impl<T: TenantRepository> ListTenantsUseCase<T> {
    pub async fn execute(
        &self,
        user_id: Uuid,
        current_tenant_id: Option<Uuid>,
    ) -> Result<ListTenantsOutput, AuthServiceError> {
        let memberships = self.tenants.list_memberships(user_id).await?;

        let mut tenants = Vec::with_capacity(memberships.len());
        for Membership { staff, hospital } in memberships {
            let roles = self
                .tenants
                .find_roles(hospital.id, &staff.roles)
                .await?
                .into_iter()
                .map(|r| RoleRef {
                    id: r.id,
                    name: r.name,
                })
                .collect();
            tenants.push(TenantSummary {
                is_current: Some(hospital.id) == current_tenant_id,
                id: hospital.id,
                name: hospital.name,
                status: hospital.status,
                staff_status: staff.status,
                roles,
            });
        }

        // Current first, then by name (byte-wise, case-sensitive).
        tenants.sort_by(|a, b| {
            b.is_current
                .cmp(&a.is_current)
                .then_with(|| a.name.cmp(&b.name))
        });

        Ok(ListTenantsOutput {
            tenants,
            current_tenant_id,
        })
    }
}

// ── SwitchTenant ─────────────────────────────────────────────────────────────

pub struct SwitchTenantInput {
    pub user_id: Uuid,
    pub current_tenant_id: Option<Uuid>,
    pub tenant_id: Uuid,
    pub client: ClientInfo,
}

/// Issues a fresh pair scoped to the target tenant. Existing sessions stay valid.
pub struct SwitchTenantUseCase<T: TenantRepository, S: SessionRepository> {
    pub tenants: T,
    pub sessions: SessionStore<S>,
    pub events: SecurityEventEmitter,
}

impl<T: TenantRepository, S: SessionRepository> SwitchTenantUseCase<T, S> {
    pub async fn execute(&self, input: SwitchTenantInput) -> Result<TokenPair, AuthServiceError> {
        let membership = validate_switch(&self.tenants, input.user_id, input.tenant_id).await?;
        let pair = self
            .sessions
            .issue_pair(input.user_id, Some(membership.hospital.id))
            .await?;

        self.events.emit(
            SecurityEvent::new(SecurityEventType::TenantSwitched, Severity::Info)
                .user(input.user_id)
                .tenant(Some(input.tenant_id))
                .client(&input.client)
                .details(serde_json::json!({
                    "fromTenantId": input.current_tenant_id,
                    "toTenantId": input.tenant_id,
                })),
        );
        Ok(pair)
    }
}
