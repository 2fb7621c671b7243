/*
 * Responsibility
 * - /tasks handlers
 * - path ids are public ids, decoded by the extractor into internal ids
 * - route-level roles were already checked by the role gate;
 *   per-task checks (author / assignee / admin) go through the access policy here
 */
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    api::v1::{
        dto::tasks::{
            AssignQuery, CreateTaskRequest, PageQuery, PriorityQuery, StatusQuery, TaskResponse,
            UpdateTaskRequest,
        },
        extractors::{AuthCtx, AuthCtxExtractor, JsonBody, public_id::PublicTaskId},
    },
    error::AppError,
    repos::task_repo::{NewTask, Task, TaskChanges, TaskScope},
    services::auth::policy,
    state::AppState,
};

fn to_response(state: &AppState, task: Task) -> Result<TaskResponse, AppError> {
    Ok(TaskResponse {
        id: state.id_codec.encode(task.id)?,
        title: task.title,
        description: task.description,
        status: task.status,
        priority: task.priority,
        author_id: task.author_id,
        assignee_id: task.assignee_id,
        created_at: task.created_at,
        updated_at: task.updated_at,
    })
}

fn to_responses(state: &AppState, tasks: Vec<Task>) -> Result<Vec<TaskResponse>, AppError> {
    let mut res = Vec::with_capacity(tasks.len());
    for task in tasks {
        res.push(to_response(state, task)?);
    }
    Ok(res)
}

pub(super) async fn load_task(state: &AppState, id: i64) -> Result<Task, AppError> {
    state
        .tasks
        .get(id)
        .await?
        .ok_or(AppError::not_found("task"))
}

/// Load the task and check the caller may view / modify it.
async fn load_visible_task(
    state: &AppState,
    ctx: &AuthCtx,
    id: i64,
) -> Result<Task, AppError> {
    let task = load_task(state, id).await?;
    policy::ensure(policy::can_view_or_modify_task(
        &ctx.identity,
        &task.ownership(),
    ))?;
    Ok(task)
}

async fn ensure_assignee_exists(state: &AppState, assignee_id: Uuid) -> Result<(), AppError> {
    match state.users.find_by_id(assignee_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::invalid_input("assignee not found")),
    }
}

async fn list_scoped(
    state: &AppState,
    scope: TaskScope,
    query: &PageQuery,
) -> Result<Json<Vec<TaskResponse>>, AppError> {
    let page = query.to_page().map_err(AppError::invalid_input)?;
    let tasks = state.tasks.list(scope, page).await?;
    Ok(Json(to_responses(state, tasks)?))
}

/// Tasks the caller authored or is assigned to; every task for ADMIN.
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<TaskResponse>>, AppError> {
    let scope = if policy::can_list_all(&ctx.identity) {
        TaskScope::All
    } else {
        TaskScope::AuthorOrAssignee(ctx.user_id())
    };
    list_scoped(&state, scope, &query).await
}

pub async fn list_tasks_by_author(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<TaskResponse>>, AppError> {
    list_scoped(&state, TaskScope::Author(ctx.user_id()), &query).await
}

pub async fn list_tasks_by_assignee(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<TaskResponse>>, AppError> {
    list_scoped(&state, TaskScope::Assignee(ctx.user_id()), &query).await
}

pub async fn create_task(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    JsonBody(req): JsonBody<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), AppError> {
    req.validate().map_err(AppError::invalid_input)?;
    if let Some(assignee_id) = req.assignee_id {
        ensure_assignee_exists(&state, assignee_id).await?;
    }

    let task = state
        .tasks
        .create(NewTask {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            author_id: ctx.user_id(),
            assignee_id: req.assignee_id,
        })
        .await?;

    tracing::info!(task_id = task.id, author_id = %task.author_id, "task created");
    Ok((StatusCode::CREATED, Json(to_response(&state, task)?)))
}

pub async fn get_task(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    task_id: PublicTaskId,
) -> Result<Json<TaskResponse>, AppError> {
    let task = load_visible_task(&state, &ctx, task_id.id).await?;
    Ok(Json(to_response(&state, task)?))
}

pub async fn update_task(
    State(state): State<AppState>,
    task_id: PublicTaskId,
    JsonBody(req): JsonBody<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, AppError> {
    req.validate().map_err(AppError::invalid_input)?;
    if let Some(assignee_id) = req.assignee_id {
        ensure_assignee_exists(&state, assignee_id).await?;
    }

    let changes = TaskChanges {
        title: req.title,
        description: req.description,
        status: req.status,
        priority: req.priority,
        assignee_id: req.assignee_id,
    };
    let task = state
        .tasks
        .update(task_id.id, changes)
        .await?
        .ok_or(AppError::not_found("task"))?;

    Ok(Json(to_response(&state, task)?))
}

pub async fn delete_task(
    State(state): State<AppState>,
    task_id: PublicTaskId,
) -> Result<StatusCode, AppError> {
    if state.tasks.delete(task_id.id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("task"))
    }
}

pub async fn assign_task(
    State(state): State<AppState>,
    task_id: PublicTaskId,
    Query(query): Query<AssignQuery>,
) -> Result<Json<TaskResponse>, AppError> {
    load_task(&state, task_id.id).await?;
    ensure_assignee_exists(&state, query.assignee_id).await?;

    let changes = TaskChanges {
        assignee_id: Some(query.assignee_id),
        ..Default::default()
    };
    let task = state
        .tasks
        .update(task_id.id, changes)
        .await?
        .ok_or(AppError::not_found("task"))?;

    Ok(Json(to_response(&state, task)?))
}

pub async fn update_task_status(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    task_id: PublicTaskId,
    Query(query): Query<StatusQuery>,
) -> Result<Json<TaskResponse>, AppError> {
    load_visible_task(&state, &ctx, task_id.id).await?;

    let changes = TaskChanges {
        status: Some(query.status),
        ..Default::default()
    };
    let task = state
        .tasks
        .update(task_id.id, changes)
        .await?
        .ok_or(AppError::not_found("task"))?;

    Ok(Json(to_response(&state, task)?))
}

pub async fn update_task_priority(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    task_id: PublicTaskId,
    Query(query): Query<PriorityQuery>,
) -> Result<Json<TaskResponse>, AppError> {
    load_visible_task(&state, &ctx, task_id.id).await?;

    let changes = TaskChanges {
        priority: Some(query.priority),
        ..Default::default()
    };
    let task = state
        .tasks
        .update(task_id.id, changes)
        .await?
        .ok_or(AppError::not_found("task"))?;

    Ok(Json(to_response(&state, task)?))
}
