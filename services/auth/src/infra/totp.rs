//! RFC 6238 TOTP: SHA-1, 6 digits, 30 s step, one step of skew either side.

use anyhow::anyhow;
use totp_rs::{Algorithm, Secret, TOTP};

use crate::error::AuthServiceError;

const DIGITS: usize = 6;
const SKEW: u8 = 1;
const STEP_SECS: u64 = 30;

fn build(secret_b32: &str, issuer: &str, account: &str) -> Result<TOTP, AuthServiceError> {
    let secret_bytes = Secret::Encoded(secret_b32.to_owned())
        .to_bytes()
        .map_err(|e| anyhow!("decode TOTP secret: {e:?}"))?;
    let totp = TOTP::new(
        Algorithm::SHA1,
        DIGITS,
        SKEW,
        STEP_SECS,
        secret_bytes,
        Some(issuer.to_owned()),
        account.to_owned(),
    )
    .map_err(|e| anyhow!("TOTP init: {e}"))?;
    Ok(totp)
}

/// A fresh enrollment: `(base32_secret, otpauth_url)`.
pub fn generate_enrollment(issuer: &str, account: &str) -> Result<(String, String), AuthServiceError> {
    let secret = Secret::generate_secret().to_encoded().to_string();
    let url = build(&secret, issuer, account)?.get_url();
    Ok((secret, url))
}

/// Check `code` against the current window. Non-numeric or wrong-length input is a mismatch.
pub fn verify_code(secret_b32: &str, code: &str) -> Result<bool, AuthServiceError> {
    let code = code.trim();
    if code.len() != DIGITS || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(false);
    }
    let totp = build(secret_b32, "HMS", "verify")?;
    totp.check_current(code)
        .map_err(|e| anyhow!("TOTP check: {e}").into())
}

/// Current code for a secret.
pub fn current_code(secret_b32: &str) -> Result<String, AuthServiceError> {
    let totp = build(secret_b32, "HMS", "verify")?;
    totp.generate_current()
        .map_err(|e| anyhow!("TOTP generate: {e}").into())
}
