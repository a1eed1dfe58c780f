use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use hms_auth_types::token::{ACCESS_TOKEN_EXP, REFRESH_TOKEN_EXP};

// ── Users & credentials ───────────────────────────────────────────────────────

/// Identity record. PII fields are plaintext here; repositories encrypt them
/// at the storage boundary (see [`USER_PII_FIELDS`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub mfa_config: Option<MfaConfig>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn mfa_state(&self) -> MfaState {
        match &self.mfa_config {
            None => MfaState::Disabled,
            Some(cfg) if cfg.enabled => MfaState::Enabled,
            Some(_) => MfaState::Pending,
        }
    }

    pub fn mfa_enabled(&self) -> bool {
        self.mfa_state() == MfaState::Enabled
    }
}

/// Dot-notation paths of the user fields stored encrypted.
pub const USER_PII_FIELDS: &[&str] = &["name", "phone", "mfa_config.secret"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MfaConfig {
    /// Base32 TOTP secret.
    pub secret: String,
    pub enabled: bool,
    pub verified_at: Option<DateTime<Utc>>,
    /// Unused backup codes, upper-case.
    pub backup_codes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MfaState {
    Disabled,
    /// Secret generated, waiting for the first valid code.
    Pending,
    Enabled,
}

#[derive(Debug, Clone)]
pub struct Credential {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider_id: String,
    pub password_hash: String,
}

/// Provider id of the local email + password credential.
pub const PASSWORD_PROVIDER: &str = "credential";

/// Minimum accepted length for a new password.
pub const MIN_PASSWORD_LEN: usize = 8;

// ── Tenants ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TenantStatus {
    Pending,
    Verified,
    Active,
    Suspended,
    Inactive,
}

impl TenantStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Verified => "VERIFIED",
            Self::Active => "ACTIVE",
            Self::Suspended => "SUSPENDED",
            Self::Inactive => "INACTIVE",
        }
    }
}

impl FromStr for TenantStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "VERIFIED" => Ok(Self::Verified),
            "ACTIVE" => Ok(Self::Active),
            "SUSPENDED" => Ok(Self::Suspended),
            "INACTIVE" => Ok(Self::Inactive),
            other => Err(format!("unknown tenant status {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaffStatus {
    Active,
    Inactive,
    Locked,
    PasswordExpired,
}

impl StaffStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::Locked => "LOCKED",
            Self::PasswordExpired => "PASSWORD_EXPIRED",
        }
    }
}

impl FromStr for StaffStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "INACTIVE" => Ok(Self::Inactive),
            "LOCKED" => Ok(Self::Locked),
            "PASSWORD_EXPIRED" => Ok(Self::PasswordExpired),
            other => Err(format!("unknown staff status {other:?}")),
        }
    }
}

/// Hospital (tenant).
#[derive(Debug, Clone, PartialEq)]
pub struct Hospital {
    pub id: Uuid,
    pub name: String,
    pub status: TenantStatus,
}

/// Staff record: a user's membership in one tenant.
#[derive(Debug, Clone, PartialEq)]
pub struct Staff {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub roles: Vec<Uuid>,
    pub status: StaffStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Role {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub permissions: Vec<String>,
}

/// A staff record joined with its hospital.
#[derive(Debug, Clone, PartialEq)]
pub struct Membership {
    pub staff: Staff,
    pub hospital: Hospital,
}

// ── Sessions ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }

    pub fn lifetime_secs(self) -> u64 {
        match self {
            Self::Access => ACCESS_TOKEN_EXP,
            Self::Refresh => REFRESH_TOKEN_EXP,
        }
    }
}

impl FromStr for TokenKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access" | "access_token" => Ok(Self::Access),
            "refresh" | "refresh_token" => Ok(Self::Refresh),
            other => Err(format!("unknown token type {other:?}")),
        }
    }
}

/// Persisted access or refresh token. `expires_at` never changes after insert.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub kind: TokenKind,
    pub user_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Access + refresh pair handed back by every successful grant.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: Session,
    pub refresh: Session,
}

// ── Security events ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityEventType {
    LoginSuccess,
    LoginFailed,
    AccountLocked,
    MfaChallengeIssued,
    MfaEnabled,
    MfaFailed,
    MfaDisabled,
    BackupCodeUsed,
    TokenRefreshed,
    TokenRevoked,
    TenantSwitched,
    PasswordChanged,
    KeyRotated,
}

impl SecurityEventType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoginSuccess => "LOGIN_SUCCESS",
            Self::LoginFailed => "LOGIN_FAILED",
            Self::AccountLocked => "ACCOUNT_LOCKED",
            Self::MfaChallengeIssued => "MFA_CHALLENGE_ISSUED",
            Self::MfaEnabled => "MFA_ENABLED",
            Self::MfaFailed => "MFA_FAILED",
            Self::MfaDisabled => "MFA_DISABLED",
            Self::BackupCodeUsed => "BACKUP_CODE_USED",
            Self::TokenRefreshed => "TOKEN_REFRESHED",
            Self::TokenRevoked => "TOKEN_REVOKED",
            Self::TenantSwitched => "TENANT_SWITCHED",
            Self::PasswordChanged => "PASSWORD_CHANGED",
            Self::KeyRotated => "KEY_ROTATED",
        }
    }
}

impl fmt::Display for SecurityEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
        }
    }
}

/// Caller network metadata attached to audit events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Append-only audit record.
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityEvent {
    pub id: Uuid,
    pub event_type: SecurityEventType,
    pub severity: Severity,
    pub tenant_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub details: Value,
    pub timestamp: DateTime<Utc>,
}

impl SecurityEvent {
    pub fn new(event_type: SecurityEventType, severity: Severity) -> Self {
        Self {
            id: Uuid::now_v7(),
            event_type,
            severity,
            tenant_id: None,
            user_id: None,
            ip: None,
            user_agent: None,
            details: Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn tenant(mut self, tenant_id: Option<Uuid>) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    pub fn client(mut self, client: &ClientInfo) -> Self {
        self.ip = client.ip.clone();
        self.user_agent = client.user_agent.clone();
        self
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

// ── Key rotation ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct KeyRotation {
    pub id: Uuid,
    pub key_id: String,
    pub rotated_at: DateTime<Utc>,
    pub rotated_by: Uuid,
    pub records_re_encrypted: u64,
}

/// Outcome of re-encrypting one user's PII.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PiiRewrite {
    /// Every encrypted field now carries the current key id.
    Current,
    /// Fields still under these key ids: the ring lacks the key or the value
    /// failed to decrypt.
    Stale(Vec<String>),
    /// No such user.
    Missing,
}

/// Rotation is recommended once the last one is older than this.
pub const KEY_ROTATION_MAX_AGE_DAYS: i64 = 90;

/// Permission required to trigger a PII key rotation.
pub const KEY_ROTATE_PERMISSION: &str = "security:keys:rotate";
