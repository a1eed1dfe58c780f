
mod mfa_test;
mod router_test;
mod tenant_test;
mod token_test;
