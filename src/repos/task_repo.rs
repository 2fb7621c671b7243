/*
 * Responsibility
 * - tasks / comments tables via SQLx
 * - TaskStore: the task collaborator the handlers call into
 * - status/priority are TEXT columns; parsed into enums on the way out
 */
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};
use crate::services::auth::policy::ResourceOwnership;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = RepoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TaskStatus::Pending),
            "IN_PROGRESS" => Ok(TaskStatus::InProgress),
            "COMPLETED" => Ok(TaskStatus::Completed),
            _ => Err(RepoError::InvalidData("status")),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "LOW",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::High => "HIGH",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = RepoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(TaskPriority::Low),
            "MEDIUM" => Ok(TaskPriority::Medium),
            "HIGH" => Ok(TaskPriority::High),
            _ => Err(RepoError::InvalidData("priority")),
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub author_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Ownership facts handed to the access policy.
    pub fn ownership(&self) -> ResourceOwnership {
        ResourceOwnership {
            author_id: self.author_id,
            assignee_id: self.assignee_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub author_id: Uuid,
    pub assignee_id: Option<Uuid>,
}

/// Partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Comment {
    pub id: i64,
    pub task_id: i64,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Which tasks a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskScope {
    All,
    AuthorOrAssignee(Uuid),
    Author(Uuid),
    Assignee(Uuid),
}

impl TaskScope {
    fn as_parts(&self) -> (&'static str, Option<Uuid>) {
        match self {
            TaskScope::All => ("all", None),
            TaskScope::AuthorOrAssignee(id) => ("either", Some(*id)),
            TaskScope::Author(id) => ("author", Some(*id)),
            TaskScope::Assignee(id) => ("assignee", Some(*id)),
        }
    }

    pub fn includes(&self, task: &Task) -> bool {
        match self {
            TaskScope::All => true,
            TaskScope::AuthorOrAssignee(id) => {
                task.author_id == *id || task.assignee_id == Some(*id)
            }
            TaskScope::Author(id) => task.author_id == *id,
            TaskScope::Assignee(id) => task.assignee_id == Some(*id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list(&self, scope: TaskScope, page: Page) -> RepoResult<Vec<Task>>;

    async fn get(&self, id: i64) -> RepoResult<Option<Task>>;

    async fn create(&self, task: NewTask) -> RepoResult<Task>;

    async fn update(&self, id: i64, changes: TaskChanges) -> RepoResult<Option<Task>>;

    async fn delete(&self, id: i64) -> RepoResult<bool>;

    async fn add_comment(&self, task_id: i64, author_id: Uuid, text: &str) -> RepoResult<Comment>;

    async fn list_comments(&self, task_id: i64) -> RepoResult<Vec<Comment>>;
}

#[derive(Debug, FromRow)]
struct TaskRow {
    id: i64,
    title: String,
    description: String,
    status: String,
    priority: String,
    author_id: Uuid,
    assignee_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = RepoError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Task {
            id: row.id,
            title: row.title,
            description: row.description,
            status: row.status.parse()?,
            priority: row.priority.parse()?,
            author_id: row.author_id,
            assignee_id: row.assignee_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Clone, Debug)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn list(&self, scope: TaskScope, page: Page) -> RepoResult<Vec<Task>> {
        let (kind, user_id) = scope.as_parts();
        let rows = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT
                id, title, description, status, priority,
                author_id, assignee_id, created_at, updated_at
            FROM tasks
            WHERE CASE $1
                WHEN 'all' THEN TRUE
                WHEN 'author' THEN author_id = $2
                WHEN 'assignee' THEN assignee_id = $2
                ELSE author_id = $2 OR assignee_id = $2
            END
            ORDER BY id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(kind)
        .bind(user_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Task::try_from).collect()
    }

    async fn get(&self, id: i64) -> RepoResult<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT
                id, title, description, status, priority,
                author_id, assignee_id, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Task::try_from).transpose()
    }

    async fn create(&self, task: NewTask) -> RepoResult<Task> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            INSERT INTO tasks (title, description, status, priority, author_id, assignee_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING
                id, title, description, status, priority,
                author_id, assignee_id, created_at, updated_at
            "#,
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(task.author_id)
        .bind(task.assignee_id)
        .fetch_one(&self.pool)
        .await?;

        Task::try_from(row)
    }

    async fn update(&self, id: i64, changes: TaskChanges) -> RepoResult<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            UPDATE tasks
            SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                priority = COALESCE($5, priority),
                assignee_id = COALESCE($6, assignee_id),
                updated_at = now()
            WHERE id = $1
            RETURNING
                id, title, description, status, priority,
                author_id, assignee_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.title.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.status.map(|s| s.as_str()))
        .bind(changes.priority.map(|p| p.as_str()))
        .bind(changes.assignee_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Task::try_from).transpose()
    }

    async fn delete(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_comment(&self, task_id: i64, author_id: Uuid, text: &str) -> RepoResult<Comment> {
        let row = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (task_id, author_id, text)
            VALUES ($1, $2, $3)
            RETURNING id, task_id, author_id, text, created_at
            "#,
        )
        .bind(task_id)
        .bind(author_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_comments(&self, task_id: i64) -> RepoResult<Vec<Comment>> {
        let rows = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, task_id, author_id, text, created_at
            FROM comments
            WHERE task_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
