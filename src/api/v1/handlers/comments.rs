/*
 * Responsibility
 * - /tasks/{id}/comments handlers
 * - commenting and reading comments follow the task visibility rule (canComment)
 */
use axum::{Json, extract::State, http::StatusCode};

use crate::{
    api::v1::{
        dto::comments::{CommentResponse, CreateCommentRequest},
        extractors::{AuthCtx, AuthCtxExtractor, JsonBody, public_id::PublicTaskId},
    },
    error::AppError,
    repos::task_repo::Comment,
    services::auth::policy,
    state::AppState,
};

use super::tasks::load_task;

fn to_response(state: &AppState, comment: Comment) -> Result<CommentResponse, AppError> {
    Ok(CommentResponse {
        id: comment.id,
        task_id: state.id_codec.encode(comment.task_id)?,
        author_id: comment.author_id,
        text: comment.text,
        created_at: comment.created_at,
    })
}

async fn ensure_can_comment(state: &AppState, ctx: &AuthCtx, task_id: i64) -> Result<(), AppError> {
    let task = load_task(state, task_id).await?;
    policy::ensure(policy::can_comment(&ctx.identity, &task.ownership()))?;
    Ok(())
}

pub async fn add_comment(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    task_id: PublicTaskId,
    JsonBody(req): JsonBody<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), AppError> {
    req.validate().map_err(AppError::invalid_input)?;
    ensure_can_comment(&state, &ctx, task_id.id).await?;

    let comment = state
        .tasks
        .add_comment(task_id.id, ctx.user_id(), req.text.trim())
        .await?;

    Ok((StatusCode::CREATED, Json(to_response(&state, comment)?)))
}

pub async fn list_comments(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    task_id: PublicTaskId,
) -> Result<Json<Vec<CommentResponse>>, AppError> {
    ensure_can_comment(&state, &ctx, task_id.id).await?;

    let comments = state.tasks.list_comments(task_id.id).await?;
    let mut res = Vec::with_capacity(comments.len());
    for comment in comments {
        res.push(to_response(&state, comment)?);
    }

    Ok(Json(res))
}
