/*
 * Responsibility
 * - POST /authenticate, POST /register (public routes)
 * - everything else is AuthGate's job; handlers only map DTOs
 */
use axum::{Json, extract::State, http::StatusCode};

use crate::{
    api::v1::{
        dto::auth::{
            AuthenticationRequest, AuthenticationResponse, REGISTERED_MESSAGE, RegisterRequest,
        },
        extractors::JsonBody,
    },
    error::AppError,
    state::AppState,
};

pub async fn authenticate(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<AuthenticationRequest>,
) -> Result<Json<AuthenticationResponse>, AppError> {
    let issued = state.auth.login(req.credentials()).await?;
    Ok(Json(AuthenticationResponse { jwt: issued.token }))
}

pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, &'static str), AppError> {
    state.auth.register(req.credentials()).await?;
    Ok((StatusCode::OK, REGISTERED_MESSAGE))
}
