/*
 * Responsibility
 * - login: credentials -> signed token
 * - register: new account with the default role
 * - role grants (admin endpoint, bootstrap admin) and role seeding
 */
use std::sync::Arc;

use chrono::Duration;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::repos::error::RepoError;
use crate::repos::user_repo::{NewIdentity, RoleRecord, UserStore};
use crate::services::auth::hasher::{CredentialHasher, HashError};
use crate::services::auth::identity::{Identity, IdentityResolver, ResolveError, Role};
use crate::services::auth::token_codec::{IssuedToken, TokenCodec, TokenError};

/// Fixed token lifetime: 10 hours.
pub const TOKEN_TTL_SECONDS: i64 = 10 * 60 * 60;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password. Deliberately indistinguishable.
    #[error("bad credentials")]
    BadCredentials,
    #[error("email is already registered")]
    DuplicateEmail,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("principal not found")]
    PrincipalNotFound,
    #[error(transparent)]
    Hash(#[from] HashError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Store(#[from] RepoError),
}

/// Trimmed email + raw password.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.trim().to_string(),
            password: password.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.email.is_empty() {
            return Err("email is required");
        }
        if !self.email.contains('@') {
            return Err("email is invalid");
        }
        if self.password.is_empty() {
            return Err("password is required");
        }
        Ok(())
    }
}

pub struct AuthGate {
    codec: Arc<TokenCodec>,
    resolver: IdentityResolver,
    hasher: Arc<dyn CredentialHasher>,
    users: Arc<dyn UserStore>,
    token_ttl: Duration,
}

impl AuthGate {
    pub fn new(
        codec: Arc<TokenCodec>,
        users: Arc<dyn UserStore>,
        hasher: Arc<dyn CredentialHasher>,
    ) -> Self {
        Self {
            codec,
            resolver: IdentityResolver::new(users.clone()),
            hasher,
            users,
            token_ttl: Duration::seconds(TOKEN_TTL_SECONDS),
        }
    }

    pub async fn login(&self, credentials: Credentials) -> Result<IssuedToken, AuthError> {
        if credentials.validate().is_err() {
            info!("login rejected");
            return Err(AuthError::BadCredentials);
        }

        let identity = match self.resolver.resolve_by_subject(&credentials.email).await {
            Ok(identity) => identity,
            Err(ResolveError::PrincipalNotFound) => {
                info!("login rejected");
                return Err(AuthError::BadCredentials);
            }
            Err(ResolveError::Store(e)) => return Err(AuthError::Store(e)),
        };

        if !self
            .password_matches(credentials.password, identity.password_hash.clone())
            .await?
        {
            info!("login rejected");
            return Err(AuthError::BadCredentials);
        }

        let token = self.codec.issue(&identity.email, self.token_ttl)?;
        info!(user_id = %identity.id, "login succeeded");
        Ok(token)
    }

    pub async fn register(&self, credentials: Credentials) -> Result<Identity, AuthError> {
        credentials
            .validate()
            .map_err(|msg| AuthError::InvalidInput(msg.to_string()))?;

        if self.users.exists_by_email(&credentials.email).await? {
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = self.hash_password(credentials.password).await?;
        let default_role = self.role_record(Role::DEFAULT).await?;

        let saved = self
            .users
            .save(NewIdentity {
                email: credentials.email,
                password_hash,
                roles: vec![default_role],
            })
            .await
            .map_err(|e| match e {
                // lost a race with a concurrent registration
                RepoError::Conflict => AuthError::DuplicateEmail,
                other => AuthError::Store(other),
            })?;

        info!(user_id = %saved.id, "user registered");
        Ok(saved)
    }

    /// Returns false when the user already had the role.
    pub async fn grant_role(&self, user_id: Uuid, role: Role) -> Result<bool, AuthError> {
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(AuthError::PrincipalNotFound);
        }

        let record = self.role_record(role).await?;
        let granted = self.users.grant_role(user_id, &record).await?;
        if granted {
            info!(user_id = %user_id, role = %role, "role granted");
        }
        Ok(granted)
    }

    /// Creates every known role record that is missing.
    pub async fn ensure_roles(&self) -> Result<(), AuthError> {
        for role in Role::ALL {
            self.users.save_role(role).await?;
        }
        Ok(())
    }

    /// Grants ADMIN to an existing account. Missing accounts are only warned about.
    pub async fn bootstrap_admin(&self, email: &str) -> Result<bool, AuthError> {
        let Some(identity) = self.users.find_by_email(email.trim()).await? else {
            warn!("bootstrap admin account does not exist yet");
            return Ok(false);
        };
        self.grant_role(identity.id, Role::Admin).await
    }

    async fn role_record(&self, role: Role) -> Result<RoleRecord, AuthError> {
        match self.users.find_role_by_name(role).await? {
            Some(record) => Ok(record),
            None => Ok(self.users.save_role(role).await?),
        }
    }

    // Argon2 is CPU heavy; keep it off the async workers.
    async fn hash_password(&self, password: String) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| {
                error!(error = %e, "hash worker failed");
                AuthError::Hash(HashError::Hash(e.to_string()))
            })?
            .map_err(AuthError::from)
    }

    async fn password_matches(&self, password: String, hash: String) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.matches(&password, &hash))
            .await
            .map_err(|e| {
                error!(error = %e, "hash worker failed");
                AuthError::Hash(HashError::Hash(e.to_string()))
            })
    }
}
