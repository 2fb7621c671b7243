/*
 * Responsibility
 * - Tasks request/response DTOs
 * - ids go out as encoded public ids (internal ids never leak)
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repos::task_repo::{Page, TaskPriority, TaskStatus};

pub const TITLE_MAX_CHARS: usize = 255;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

fn validate_title(title: &str) -> Result<(), &'static str> {
    if title.trim().is_empty() {
        return Err("title is required");
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err("title must be <= 255 chars");
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assignee_id: Option<Uuid>,
}

impl CreateTaskRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        validate_title(&self.title)?;
        if self.description.trim().is_empty() {
            return Err("description is required");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Uuid>,
}

impl UpdateTaskRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(description) = &self.description
            && description.trim().is_empty()
        {
            return Err("description cannot be empty");
        }
        Ok(())
    }
}

// PATCH endpoints take their single value as a query parameter
#[derive(Debug, Deserialize)]
pub struct AssignQuery {
    pub assignee_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: TaskStatus,
}

#[derive(Debug, Deserialize)]
pub struct PriorityQuery {
    pub priority: TaskPriority,
}

/// `?page=0&size=20`, zero-based.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

impl PageQuery {
    pub fn to_page(&self) -> Result<Page, &'static str> {
        let size = self.size.unwrap_or(DEFAULT_PAGE_SIZE);
        if !(1..=MAX_PAGE_SIZE).contains(&size) {
            return Err("size must be between 1 and 100");
        }
        let page = self.page.unwrap_or(0);
        if page < 0 {
            return Err("page must be >= 0");
        }
        let offset = page
            .checked_mul(size)
            .ok_or("page is out of range")?;
        Ok(Page {
            limit: size,
            offset,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: String, // encoded
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub author_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
