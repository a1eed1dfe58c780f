//! sea-orm entities owned by the identity service.

pub mod credentials;
pub mod hospitals;
pub mod key_rotations;
pub mod roles;
pub mod security_events;
pub mod sessions;
pub mod staff;
pub mod users;
