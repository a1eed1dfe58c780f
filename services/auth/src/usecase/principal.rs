use hms_auth_types::principal::AuthenticatedPrincipal;

use crate::domain::repository::{SessionRepository, TenantRepository};
use crate::domain::types::{StaffStatus, TokenKind};
use crate::error::AuthServiceError;
use crate::usecase::session::SessionStore;

/// Turns a bearer access token into the principal handed to business modules.
pub struct ResolvePrincipalUseCase<S: SessionRepository, T: TenantRepository> {
    pub sessions: SessionStore<S>,
    pub tenants: T,
}

impl<S: SessionRepository, T: TenantRepository> ResolvePrincipalUseCase<S, T> {
    pub async fn execute(&self, token: &str) -> Result<AuthenticatedPrincipal, AuthServiceError> {
        let session = self
            .sessions
            .find_valid(token, TokenKind::Access)
            .await?
            .ok_or(AuthServiceError::TokenExpired)?;

        let mut roles = Vec::new();
        let mut permissions: Vec<String> = Vec::new();
        if let Some(tenant_id) = session.tenant_id {
            let staff = self
                .tenants
                .find_membership(session.user_id, tenant_id)
                .await?
                .filter(|s| s.status == StaffStatus::Active);
            if let Some(staff) = staff {
                for role in self.tenants.find_roles(tenant_id, &staff.roles).await? {
                    for p in role.permissions {
                        if !permissions.contains(&p) {
                            permissions.push(p);
                        }
                    }
                    roles.push(role.name);
                }
            }
        }

        Ok(AuthenticatedPrincipal {
            user_id: session.user_id,
            tenant_id: session.tenant_id,
            roles,
            permissions,
            expires_at: session.expires_at,
        })
    }
}
