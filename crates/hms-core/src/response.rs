//! JSON envelopes shared by every HMS endpoint.
//!
//! Success: `{"success": true, "data": ...}`.
//! Failure: `{"success": false, "error": {"code": "...", "message": "..."}}`.

use serde::Serialize;
use serde_json::{Value, json};

/// Success envelope wrapping a handler payload.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Build the failure envelope. `code` is the stable machine-readable kind.
pub fn error_body(code: &str, message: &str) -> Value {
    json!({
        "success": false,
        "error": {
            "code": code,
            "message": message,
        }
    })
}
