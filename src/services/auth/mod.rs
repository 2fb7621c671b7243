pub mod authenticator;
pub mod factory;
pub mod gate;
pub mod hasher;
pub mod identity;
pub mod policy;
pub mod route_rules;
pub mod token_codec;

pub use authenticator::{AuthOutcome, RequestAuthenticator};
pub use factory::build_auth_services;
pub use gate::{AuthError, AuthGate, Credentials};
pub use identity::{Identity, Role};
