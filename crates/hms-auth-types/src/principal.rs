//! The identity decision handed to business modules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Permission granting every action inside the tenant.
pub const WILDCARD_PERMISSION: &str = "*";

/// Caller identity resolved from a valid access session.
///
/// `roles` and `permissions` are scoped to `tenant_id`; both are empty when
/// the session has no tenant or the membership is not active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedPrincipal {
    pub user_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub expires_at: DateTime<Utc>,
}

impl AuthenticatedPrincipal {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .iter()
            .any(|p| p == WILDCARD_PERMISSION || p == permission)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}
