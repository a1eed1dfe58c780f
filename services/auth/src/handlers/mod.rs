pub mod account;
pub mod extract;
pub mod mfa;
pub mod security;
pub mod tenant;
pub mod token;
