//! Request extractors shared by the handlers.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;

use hms_auth_types::bearer::bearer_token;
use hms_auth_types::principal::AuthenticatedPrincipal;

use crate::domain::types::ClientInfo;
use crate::error::AuthServiceError;
use crate::state::AppState;
use crate::usecase::principal::ResolvePrincipalUseCase;

fn client_info(headers: &HeaderMap) -> ClientInfo {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    let ip = header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .or_else(|| header("x-real-ip"))
        .map(str::to_owned);
    ClientInfo {
        ip,
        user_agent: header("user-agent").map(str::to_owned),
    }
}

/// Caller network metadata for audit events.
#[derive(Debug, Clone)]
pub struct Client(pub ClientInfo);

impl<S> FromRequestParts<S> for Client
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let client = client_info(&parts.headers);
        async move { Ok(Self(client)) }
    }
}

/// A caller holding a valid access session.
///
/// Missing or garbled `Authorization` → 401 `UNAUTHORIZED`; unknown or
/// expired session → 401 `TOKEN_EXPIRED`.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub principal: AuthenticatedPrincipal,
    pub client: ClientInfo,
}

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AuthServiceError;

    // Read headers synchronously, then resolve in a 'static async block.
    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let token = bearer_token(&parts.headers);
        let client = client_info(&parts.headers);
        let state = state.clone();

        async move {
            let token = token.map_err(|_| AuthServiceError::Unauthorized)?;
            let usecase = ResolvePrincipalUseCase {
                sessions: state.session_store(),
                tenants: state.tenant_repo(),
            };
            let principal = usecase.execute(&token).await?;
            Ok(Self { principal, client })
        }
    }
}
