/*
 * Responsibility
 * - users / roles / user_roles tables via SQLx
 * - UserStore: the user-lookup collaborator the auth core depends on
 * - roles are always loaded together with the user (one query, fresh snapshot)
 */
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::warn;
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};
use crate::services::auth::identity::{Identity, Role};

/// Stored role row (`roles` table).
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RoleRecord {
    pub id: i64,
    pub name: String,
}

/// Account to persist on registration. `password_hash` is already hashed.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<RoleRecord>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Identity>>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Identity>>;

    async fn exists_by_email(&self, email: &str) -> RepoResult<bool>;

    /// Insert a new user with its roles.
    ///
    /// Returns `RepoError::Conflict` when the email is already taken.
    async fn save(&self, user: NewIdentity) -> RepoResult<Identity>;

    async fn find_role_by_name(&self, role: Role) -> RepoResult<Option<RoleRecord>>;

    /// Create the role row if it does not exist yet; returns the stored row either way.
    async fn save_role(&self, role: Role) -> RepoResult<RoleRecord>;

    /// Returns `false` when the user already had the role.
    async fn grant_role(&self, user_id: Uuid, role: &RoleRecord) -> RepoResult<bool>;
}

/// Collect role names into the identity snapshot, skipping names this build does not know.
pub fn roles_from_names<I, S>(names: I) -> std::collections::BTreeSet<Role>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .filter_map(|name| match name.as_ref().parse::<Role>() {
            Ok(role) => Some(role),
            Err(e) => {
                warn!(error = %e, "ignoring unknown role");
                None
            }
        })
        .collect()
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    roles: Vec<String>,
}

impl From<UserRow> for Identity {
    fn from(row: UserRow) -> Self {
        Identity {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            roles: roles_from_names(row.roles),
        }
    }
}

const SELECT_USER_WITH_ROLES: &str = r#"
    SELECT
        u.id,
        u.email,
        u.password_hash,
        COALESCE(array_agg(r.name) FILTER (WHERE r.name IS NOT NULL), '{}') AS roles
    FROM users u
    LEFT JOIN user_roles ur ON ur.user_id = u.id
    LEFT JOIN roles r ON r.id = ur.role_id
"#;

#[derive(Clone, Debug)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Identity>> {
        let sql = format!("{SELECT_USER_WITH_ROLES} WHERE u.email = $1 GROUP BY u.id");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Identity::from))
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Identity>> {
        let sql = format!("{SELECT_USER_WITH_ROLES} WHERE u.id = $1 GROUP BY u.id");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Identity::from))
    }

    async fn exists_by_email(&self, email: &str) -> RepoResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)
            "#,
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn save(&self, user: NewIdentity) -> RepoResult<Identity> {
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(RepoError::from_sqlx)?;

        for role in &user.roles {
            sqlx::query(
                r#"
                INSERT INTO user_roles (user_id, role_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(id)
            .bind(role.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Identity {
            id,
            email: user.email,
            password_hash: user.password_hash,
            roles: roles_from_names(user.roles.iter().map(|r| r.name.as_str())),
        })
    }

    async fn find_role_by_name(&self, role: Role) -> RepoResult<Option<RoleRecord>> {
        let row = sqlx::query_as::<_, RoleRecord>(
            r#"
            SELECT id, name
            FROM roles
            WHERE name = $1
            "#,
        )
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn save_role(&self, role: Role) -> RepoResult<RoleRecord> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let row = sqlx::query_as::<_, RoleRecord>(
            r#"
            INSERT INTO roles (name)
            VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name
            "#,
        )
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn grant_role(&self, user_id: Uuid, role: &RoleRecord) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role.id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
