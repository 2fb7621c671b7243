use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("conflict")]
    Conflict,
    #[error("invalid stored value: {0}")]
    InvalidData(&'static str),
    #[error("db error: {0}")]
    Db(#[from] sqlx::Error),
}

impl RepoError {
    /// Gives meaning to the database errors callers branch on (unique violations).
    pub fn from_sqlx(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => RepoError::Conflict,
            _ => RepoError::Db(e),
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;
