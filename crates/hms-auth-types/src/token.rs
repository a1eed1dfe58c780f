//! Token lifetimes and wire constants shared by issuer and consumers.

/// Access-token lifetime in seconds (1 hour).
pub const ACCESS_TOKEN_EXP: u64 = 3600;

/// Refresh-token lifetime in seconds (7 days).
pub const REFRESH_TOKEN_EXP: u64 = 604_800;

/// `token_type` value returned with every token pair.
pub const TOKEN_TYPE_BEARER: &str = "Bearer";
