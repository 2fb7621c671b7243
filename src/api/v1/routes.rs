/*
 * Responsibility
 * - v1 URL structure
 * - public: /health, /authenticate, /register
 * - everything else goes through the auth middleware (applied in app.rs on the outer router,
 *   where the full /api/v1 path is visible to the route table)
 */
use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

use crate::api::v1::handlers::{
    auth::{authenticate, register},
    comments::{add_comment, list_comments},
    health::health,
    tasks::{
        assign_task, create_task, delete_task, get_task, list_tasks, list_tasks_by_assignee,
        list_tasks_by_author, update_task, update_task_priority, update_task_status,
    },
    users::{add_admin_role, me},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/authenticate", post(authenticate))
        .route("/register", post(register))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/author", get(list_tasks_by_author))
        .route("/tasks/assignee", get(list_tasks_by_assignee))
        .route(
            "/tasks/{task_id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/tasks/{task_id}/assign", patch(assign_task))
        .route("/tasks/{task_id}/status", patch(update_task_status))
        .route("/tasks/{task_id}/priority", patch(update_task_priority))
        .route(
            "/tasks/{task_id}/comments",
            get(list_comments).post(add_comment),
        )
        .route("/users/me", get(me))
        .route("/users/{user_id}/add-admin-role", post(add_admin_role))
}
