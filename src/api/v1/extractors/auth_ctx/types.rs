/*
 * Responsibility
 * - the "authenticated context" type handlers see
 * - the access middleware stores it in request extensions; handlers only receive this type
 *
 * Notes
 * - token verification and identity lookup belong to middleware/services
 * - per-resource decisions (author / assignee) belong to the access policy
 */
use uuid::Uuid;

use crate::services::auth::{Identity, Role};

/// Context attached to an authenticated request.
///
/// `identity` is the snapshot loaded for this request; it is never refreshed mid-request.
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub identity: Identity,
}

impl AuthCtx {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }

    pub fn user_id(&self) -> Uuid {
        self.identity.id
    }

    pub fn email(&self) -> &str {
        &self.identity.email
    }

    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.identity.roles.iter().copied()
    }
}
