/*
 * Responsibility
 * - per-request identity establishment:
 *   public bypass -> extract bearer -> verify -> expiry -> resolve
 * - never rejects; the outcome only says whether an identity can be attached
 * - enforcement lives in the role gate middleware and the access policy
 */
use std::sync::Arc;

use axum::http::{HeaderMap, header};
use tracing::{debug, warn};

use crate::services::auth::identity::{Identity, IdentityResolver, ResolveError};
use crate::services::auth::route_rules;
use crate::services::auth::token_codec::{TokenCodec, TokenError};

/// Why no identity was attached. Only used for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unauthenticated {
    MissingCredential,
    MalformedHeader,
    Token(TokenError),
    PrincipalNotFound,
    StoreUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    PublicRoute,
    Unauthenticated(Unauthenticated),
    Authenticated(Identity),
}

impl AuthOutcome {
    pub fn into_identity(self) -> Option<Identity> {
        match self {
            AuthOutcome::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }
}

/// `Authorization: Bearer <token>`; the scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, Unauthenticated> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(Unauthenticated::MissingCredential)?
        .to_str()
        .map_err(|_| Unauthenticated::MalformedHeader)?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or(Unauthenticated::MalformedHeader)?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(Unauthenticated::MalformedHeader);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(Unauthenticated::MalformedHeader);
    }
    Ok(token)
}

#[derive(Clone)]
pub struct RequestAuthenticator {
    codec: Arc<TokenCodec>,
    resolver: IdentityResolver,
}

impl RequestAuthenticator {
    pub fn new(codec: Arc<TokenCodec>, resolver: IdentityResolver) -> Self {
        Self { codec, resolver }
    }

    pub async fn authenticate(&self, path: &str, headers: &HeaderMap) -> AuthOutcome {
        if route_rules::is_public(path) {
            return AuthOutcome::PublicRoute;
        }

        match self.identify(headers).await {
            Ok(identity) => AuthOutcome::Authenticated(identity),
            Err(reason) => {
                debug!(?reason, "request carries no identity");
                AuthOutcome::Unauthenticated(reason)
            }
        }
    }

    async fn identify(&self, headers: &HeaderMap) -> Result<Identity, Unauthenticated> {
        let token = bearer_token(headers)?;

        // verify_current = signature check + expiry check
        let verified = self.codec.verify_current(token).map_err(|e| {
            if e != TokenError::Expired {
                warn!(kind = ?e, "bearer token rejected");
            }
            Unauthenticated::Token(e)
        })?;

        self.resolver
            .resolve_by_subject(&verified.subject)
            .await
            .map_err(|e| match e {
                ResolveError::PrincipalNotFound => Unauthenticated::PrincipalNotFound,
                ResolveError::Store(_) => Unauthenticated::StoreUnavailable,
            })
    }
}
