/// Factory: build the auth services from application `Config` and the user store.
use std::sync::Arc;

use crate::config::Config;
use crate::repos::user_repo::UserStore;
use crate::services::auth::{
    AuthGate, RequestAuthenticator,
    hasher::{Argon2Hasher, CredentialHasher},
    identity::IdentityResolver,
    token_codec::TokenCodec,
};

pub fn build_auth_services(
    config: &Config,
    users: Arc<dyn UserStore>,
) -> (Arc<AuthGate>, RequestAuthenticator) {
    build_with_hasher(
        config.jwt_secret.as_bytes(),
        users,
        Arc::new(Argon2Hasher::default()),
    )
}

/// One codec and one resolver shared by the gate and the per-request stage.
pub fn build_with_hasher(
    secret: &[u8],
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn CredentialHasher>,
) -> (Arc<AuthGate>, RequestAuthenticator) {
    let codec = Arc::new(TokenCodec::new(secret));
    let gate = AuthGate::new(codec.clone(), users.clone(), hasher);
    let authenticator = RequestAuthenticator::new(codec, IdentityResolver::new(users));

    (Arc::new(gate), authenticator)
}
