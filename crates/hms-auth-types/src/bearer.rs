//! `Authorization: Bearer <token>` header parsing.

use http::HeaderMap;
use http::header::AUTHORIZATION;

/// Why a bearer token could not be read from the request.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum BearerError {
    #[error("missing authorization header")]
    Missing,
    #[error("malformed authorization header")]
    Malformed,
}

/// Extract the bearer token from request headers.
///
/// The scheme is matched case-insensitively; the token itself is returned
/// verbatim (surrounding whitespace trimmed).
pub fn bearer_token(headers: &HeaderMap) -> Result<String, BearerError> {
    let raw = headers
        .get(AUTHORIZATION)
        .ok_or(BearerError::Missing)?
        .to_str()
        .map_err(|_| BearerError::Malformed)?;

    let (scheme, token) = raw.trim().split_once(' ').ok_or(BearerError::Malformed)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(BearerError::Malformed);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(BearerError::Malformed);
    }
    Ok(token.to_owned())
}
