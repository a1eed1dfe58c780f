//! Shared plumbing for HMS services: configuration, tracing, request ids,
//! health probes and the JSON envelope used by every HTTP response.

pub mod config;
pub mod health;
pub mod middleware;
pub mod response;
pub mod serde;
pub mod tracing;
