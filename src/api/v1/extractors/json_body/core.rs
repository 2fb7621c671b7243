/*
 * Responsibility
 *  - wrap axum::Json so a missing / malformed / mistyped body becomes 400 INVALID_INPUT
 *    with the usual {"error": {...}} body instead of axum's plain-text rejection
 */
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use tracing::debug;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                debug!(status = %rejection.status(), "json body rejected");
                AppError::invalid_input(rejection.body_text())
            })?;
        Ok(Self(value))
    }
}
