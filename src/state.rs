/*
 * Responsibility
 * - shared context attached to the Router (AppState)
 *   - stores, id codec, auth gate, request authenticator
 * - cheap to Clone (everything inside is Arc / Clone cheap)
 */
use std::sync::Arc;

use crate::repos::{task_repo::TaskStore, user_repo::UserStore};
use crate::services::auth::{AuthGate, RequestAuthenticator};
use crate::services::id_codec::IdCodec;

#[derive(Clone)]
pub struct AppState {
    pub id_codec: IdCodec,
    pub auth: Arc<AuthGate>,
    pub authenticator: RequestAuthenticator,
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
}

impl AppState {
    pub fn new(
        id_codec: IdCodec,
        auth: Arc<AuthGate>,
        authenticator: RequestAuthenticator,
        users: Arc<dyn UserStore>,
        tasks: Arc<dyn TaskStore>,
    ) -> Self {
        Self {
            id_codec,
            auth,
            authenticator,
            users,
            tasks,
        }
    }

    /// In-memory stores, minimum-cost hashing.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        use crate::repos::memory::{MemoryTaskStore, MemoryUserStore};
        use crate::services::auth::{factory, hasher::cheap_hasher};
        use crate::services::id_codec::test_codec;

        let users: Arc<dyn UserStore> = Arc::new(MemoryUserStore::default());
        let tasks: Arc<dyn TaskStore> = Arc::new(MemoryTaskStore::default());
        let (auth, authenticator) = factory::build_with_hasher(
            b"0123456789abcdef0123456789abcdef",
            users.clone(),
            Arc::new(cheap_hasher()),
        );

        Self::new(test_codec(), auth, authenticator, users, tasks)
    }
}
