/*
 * Responsibility
 * - Comments request/response DTOs
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub text: String,
}

impl CreateCommentRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.text.trim().is_empty() {
            return Err("text is required");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: i64,
    pub task_id: String, // encoded
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}
