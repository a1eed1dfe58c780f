pub mod keys;
pub mod mfa;
pub mod password;
pub mod principal;
pub mod security_event;
pub mod session;
pub mod tenant;
pub mod token;
