use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use hms_core::response::error_body;

/// Auth service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("authentication required")]
    Unauthorized,
    #[error("session expired or invalid")]
    TokenExpired,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("account temporarily locked due to too many failed login attempts")]
    AccountLocked,
    #[error("staff account is locked for this hospital")]
    MembershipLocked,
    #[error("password has expired for this hospital")]
    PasswordExpired,
    #[error("staff account is inactive for this hospital")]
    MembershipInactive,
    #[error("hospital not found")]
    TenantNotFound,
    #[error("hospital is not active")]
    TenantNotActive,
    #[error("user is not associated with this hospital")]
    NotAssociated,
    #[error("invalid MFA code")]
    InvalidMfaCode,
    #[error("MFA is already enabled")]
    MfaAlreadyEnabled,
    #[error("MFA has not been set up")]
    MfaNotConfigured,
    #[error("MFA is not enabled")]
    MfaNotEnabled,
    #[error("unsupported grant type")]
    UnsupportedGrantType,
    #[error("{0}")]
    InvalidRequest(String),
    #[error("insufficient permissions")]
    Forbidden,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AuthServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AccountLocked | Self::MembershipLocked => "ACCOUNT_LOCKED",
            Self::PasswordExpired => "PASSWORD_EXPIRED",
            Self::MembershipInactive => "ACCOUNT_INACTIVE",
            Self::TenantNotFound => "TENANT_NOT_FOUND",
            Self::TenantNotActive => "TENANT_NOT_ACTIVE",
            Self::NotAssociated => "TENANT_NOT_ASSOCIATED",
            Self::InvalidMfaCode => "INVALID_MFA_CODE",
            Self::MfaAlreadyEnabled => "MFA_ALREADY_ENABLED",
            Self::MfaNotConfigured => "MFA_NOT_CONFIGURED",
            Self::MfaNotEnabled => "MFA_NOT_ENABLED",
            Self::UnsupportedGrantType => "UNSUPPORTED_GRANT_TYPE",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::Forbidden => "FORBIDDEN",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized | Self::TokenExpired | Self::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            Self::AccountLocked
            | Self::MembershipLocked
            | Self::PasswordExpired
            | Self::MembershipInactive
            | Self::TenantNotActive
            | Self::NotAssociated
            | Self::Forbidden => StatusCode::FORBIDDEN,
            Self::TenantNotFound
            | Self::InvalidMfaCode
            | Self::MfaNotConfigured
            | Self::MfaNotEnabled
            | Self::UnsupportedGrantType
            | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::MfaAlreadyEnabled => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthServiceError {
    fn into_response(self) -> Response {
        // TraceLayer already records every request; only 500s carry a cause worth logging.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = format!("{e:#}"), kind = "INTERNAL_ERROR", "internal error");
        }
        let body = error_body(self.kind(), &self.to_string());
        (self.status(), axum::Json(body)).into_response()
    }
}
