//! In-memory stores for tests. Same contracts as the Postgres stores, no database needed.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};
use crate::repos::task_repo::{
    Comment, NewTask, Page, Task, TaskChanges, TaskScope, TaskStore,
};
use crate::repos::user_repo::{NewIdentity, RoleRecord, UserStore, roles_from_names};
use crate::services::auth::identity::{Identity, Role};

#[derive(Debug, Clone)]
struct StoredUser {
    id: Uuid,
    email: String,
    password_hash: String,
    role_ids: Vec<i64>,
}

#[derive(Debug, Default)]
struct UserTables {
    users: Vec<StoredUser>,
    roles: Vec<RoleRecord>,
}

impl UserTables {
    fn snapshot(&self, user: &StoredUser) -> Identity {
        let names = self
            .roles
            .iter()
            .filter(|r| user.role_ids.contains(&r.id))
            .map(|r| r.name.as_str());

        Identity {
            id: user.id,
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            roles: roles_from_names(names),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    tables: Mutex<UserTables>,
}

impl MemoryUserStore {
    pub fn user_count(&self) -> usize {
        self.tables.lock().unwrap().users.len()
    }

    pub fn role_count(&self) -> usize {
        self.tables.lock().unwrap().roles.len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Identity>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| tables.snapshot(u)))
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Identity>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .users
            .iter()
            .find(|u| u.id == id)
            .map(|u| tables.snapshot(u)))
    }

    async fn exists_by_email(&self, email: &str) -> RepoResult<bool> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().any(|u| u.email == email))
    }

    async fn save(&self, user: NewIdentity) -> RepoResult<Identity> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(RepoError::Conflict);
        }

        let stored = StoredUser {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            role_ids: user.roles.iter().map(|r| r.id).collect(),
        };
        let identity = tables.snapshot(&stored);
        tables.users.push(stored);
        Ok(identity)
    }

    async fn find_role_by_name(&self, role: Role) -> RepoResult<Option<RoleRecord>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .roles
            .iter()
            .find(|r| r.name == role.as_str())
            .cloned())
    }

    async fn save_role(&self, role: Role) -> RepoResult<RoleRecord> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(existing) = tables.roles.iter().find(|r| r.name == role.as_str()) {
            return Ok(existing.clone());
        }

        let record = RoleRecord {
            id: tables.roles.len() as i64 + 1,
            name: role.as_str().to_string(),
        };
        tables.roles.push(record.clone());
        Ok(record)
    }

    async fn grant_role(&self, user_id: Uuid, role: &RoleRecord) -> RepoResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(RepoError::InvalidData("user_id"))?;

        if user.role_ids.contains(&role.id) {
            return Ok(false);
        }
        user.role_ids.push(role.id);
        Ok(true)
    }
}

#[derive(Debug, Default)]
struct TaskTables {
    tasks: Vec<Task>,
    comments: Vec<Comment>,
    // last issued ids; never reused after a delete, like a BIGSERIAL
    task_seq: i64,
    comment_seq: i64,
}

#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tables: Mutex<TaskTables>,
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn list(&self, scope: TaskScope, page: Page) -> RepoResult<Vec<Task>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .tasks
            .iter()
            .rev()
            .filter(|t| scope.includes(t))
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    async fn get(&self, id: i64) -> RepoResult<Option<Task>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn create(&self, task: NewTask) -> RepoResult<Task> {
        let mut tables = self.tables.lock().unwrap();
        let now = Utc::now();
        tables.task_seq += 1;
        let task = Task {
            id: tables.task_seq,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            author_id: task.author_id,
            assignee_id: task.assignee_id,
            created_at: now,
            updated_at: now,
        };
        tables.tasks.push(task.clone());
        Ok(task)
    }

    async fn update(&self, id: i64, changes: TaskChanges) -> RepoResult<Option<Task>> {
        let mut tables = self.tables.lock().unwrap();
        let Some(task) = tables.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            task.title = title;
        }
        if let Some(description) = changes.description {
            task.description = description;
        }
        if let Some(status) = changes.status {
            task.status = status;
        }
        if let Some(priority) = changes.priority {
            task.priority = priority;
        }
        if let Some(assignee_id) = changes.assignee_id {
            task.assignee_id = Some(assignee_id);
        }
        task.updated_at = Utc::now();
        Ok(Some(task.clone()))
    }

    async fn delete(&self, id: i64) -> RepoResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.tasks.len();
        tables.tasks.retain(|t| t.id != id);
        tables.comments.retain(|c| c.task_id != id);
        Ok(tables.tasks.len() < before)
    }

    async fn add_comment(&self, task_id: i64, author_id: Uuid, text: &str) -> RepoResult<Comment> {
        let mut tables = self.tables.lock().unwrap();
        tables.comment_seq += 1;
        let comment = Comment {
            id: tables.comment_seq,
            task_id,
            author_id,
            text: text.to_string(),
            created_at: Utc::now(),
        };
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_comments(&self, task_id: i64) -> RepoResult<Vec<Comment>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .comments
            .iter()
            .filter(|c| c.task_id == task_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::task_repo::{TaskPriority, TaskStatus};

    fn new_task(author_id: Uuid) -> NewTask {
        NewTask {
            title: "t".to_string(),
            description: "d".to_string(),
            status: TaskStatus::Pending,
            priority: TaskPriority::Low,
            author_id,
            assignee_id: None,
        }
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let store = MemoryTaskStore::default();
        let author = Uuid::new_v4();

        let first = store.create(new_task(author)).await.unwrap();
        let second = store.create(new_task(author)).await.unwrap();
        let c1 = store.add_comment(first.id, author, "one").await.unwrap();
        let c2 = store.add_comment(second.id, author, "two").await.unwrap();

        assert!(store.delete(first.id).await.unwrap());
        assert!(store.delete(second.id).await.unwrap());

        let third = store.create(new_task(author)).await.unwrap();
        let c3 = store.add_comment(third.id, author, "three").await.unwrap();

        assert!(third.id > second.id);
        assert!(c3.id > c2.id && c2.id > c1.id);
        assert_eq!(store.list_comments(third.id).await.unwrap(), vec![c3]);
    }
}
