//! Auth types shared across HMS services.
//!
//! Business modules (patients, billing, inventory, ...) consume an
//! [`principal::AuthenticatedPrincipal`] produced by the identity service and
//! never look at sessions or credentials directly.

pub mod bearer;
pub mod principal;
pub mod token;
