use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

use crate::repos::{error::RepoError, user_repo::UserStore};

/// Role tags understood by the access checks.
///
/// Stored by name (`ADMIN`, `USER`) in the role table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Role given to every freshly registered account.
    pub const DEFAULT: Role = Role::User;

    pub const ALL: [Role; 2] = [Role::Admin, Role::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// A user record with its roles, as loaded for one request.
///
/// - Snapshot of the store at load time; never mutated afterwards.
/// - `email` is the token subject and the unique natural key.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub roles: BTreeSet<Role>,
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print the password hash
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("roles", &self.roles)
            .finish()
    }
}

impl Identity {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Like `has_role`, except that ADMIN satisfies a USER requirement.
    pub fn satisfies(&self, role: Role) -> bool {
        match role {
            Role::Admin => self.is_admin(),
            Role::User => self.is_admin() || self.has_role(Role::User),
        }
    }

    pub fn satisfies_any(&self, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.satisfies(*role))
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("principal not found")]
    PrincipalNotFound,
    #[error("identity store failure: {0}")]
    Store(#[from] RepoError),
}

/// Maps a verified token subject (email) to the full identity.
///
/// No caching: every call reads the store, so role changes are visible on the next request.
#[derive(Clone)]
pub struct IdentityResolver {
    users: Arc<dyn UserStore>,
}

impl IdentityResolver {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    pub async fn resolve_by_subject(&self, subject: &str) -> Result<Identity, ResolveError> {
        match self.users.find_by_email(subject).await {
            Ok(Some(identity)) => Ok(identity),
            Ok(None) => {
                debug!("no identity for subject");
                Err(ResolveError::PrincipalNotFound)
            }
            Err(e) => {
                error!(error = %e, "failed to load identity");
                Err(ResolveError::Store(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::memory::MemoryUserStore;
    use crate::repos::user_repo::NewIdentity;

    fn identity(roles: &[Role]) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            roles: roles.iter().copied().collect(),
        }
    }

    #[test]
    fn role_names_round_trip_through_from_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert_eq!(
            "ROLE_ADMIN".parse::<Role>(),
            Err(UnknownRole("ROLE_ADMIN".to_string()))
        );
    }

    #[test]
    fn admin_satisfies_user_requirement_but_not_vice_versa() {
        let admin = identity(&[Role::Admin]);
        let user = identity(&[Role::User]);
        let nobody = identity(&[]);

        assert!(admin.satisfies(Role::User));
        assert!(admin.satisfies(Role::Admin));
        assert!(user.satisfies(Role::User));
        assert!(!user.satisfies(Role::Admin));
        assert!(!nobody.satisfies_any(&[Role::Admin, Role::User]));
    }

    #[test]
    fn debug_output_hides_password_hash() {
        let out = format!("{:?}", identity(&[Role::User]));
        assert!(out.contains("someone@example.com"));
        assert!(!out.contains("argon2id"));
    }

    #[tokio::test]
    async fn resolve_by_subject_reads_fresh_roles_every_call() {
        let store = Arc::new(MemoryUserStore::default());
        let user_role = store.save_role(Role::User).await.unwrap();
        let saved = store
            .save(NewIdentity {
                email: "a@x.com".to_string(),
                password_hash: "hash".to_string(),
                roles: vec![user_role],
            })
            .await
            .unwrap();
        let resolver = IdentityResolver::new(store.clone());

        let first = resolver.resolve_by_subject("a@x.com").await.unwrap();
        assert!(!first.is_admin());

        let admin_role = store.save_role(Role::Admin).await.unwrap();
        store.grant_role(saved.id, &admin_role).await.unwrap();

        let second = resolver.resolve_by_subject("a@x.com").await.unwrap();
        assert!(second.is_admin());
        // the earlier snapshot is unaffected
        assert!(!first.is_admin());
    }

    #[tokio::test]
    async fn resolve_by_subject_reports_missing_principal() {
        let resolver = IdentityResolver::new(Arc::new(MemoryUserStore::default()));
        let err = resolver.resolve_by_subject("ghost@x.com").await.unwrap_err();
        assert!(matches!(err, ResolveError::PrincipalNotFound));
    }
}
