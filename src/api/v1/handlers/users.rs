/*
 * Responsibility
 * - GET /users/me: the identity attached to this request
 * - POST /users/{id}/add-admin-role (ADMIN only, enforced by the role gate)
 * - users are addressed by UUID (no public id encoding)
 */
use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{
    api::v1::{
        dto::users::{MeResponse, RoleGrantResponse},
        extractors::AuthCtxExtractor,
    },
    error::AppError,
    services::auth::Role,
    state::AppState,
};

pub async fn me(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<MeResponse> {
    Json(MeResponse {
        id: ctx.user_id(),
        email: ctx.email().to_string(),
        roles: ctx.roles().map(|r| r.as_str()).collect(),
    })
}

pub async fn add_admin_role(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<RoleGrantResponse>, AppError> {
    let granted = state.auth.grant_role(user_id, Role::Admin).await?;
    Ok(Json(RoleGrantResponse::new(user_id, Role::Admin, granted)))
}
