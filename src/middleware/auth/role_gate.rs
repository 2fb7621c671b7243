//! Route-level role requirements, checked before any handler.
//!
//! 401 when no identity is attached, 403 when the identity holds none of the required roles.

use axum::{
    Router,
    body::Body,
    http::Request,
    middleware::{self, Next},
    response::Response,
};
use tracing::warn;

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::route_rules::{self, GateDecision};
use crate::state::AppState;

pub fn apply(router: Router<AppState>) -> Router<AppState> {
    router.layer(middleware::from_fn(role_gate))
}

async fn role_gate(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    let ctx = req.extensions().get::<AuthCtx>();
    let user_id = ctx.map(|c| c.user_id());
    let decision = route_rules::evaluate(
        req.method().as_str(),
        req.uri().path(),
        ctx.map(|c| &c.identity),
    );

    match decision {
        GateDecision::Allow => Ok(next.run(req).await),
        GateDecision::Unauthenticated => Err(AppError::Unauthorized),
        GateDecision::Forbidden => {
            warn!(
                user_id = ?user_id,
                method = %req.method(),
                path = %req.uri().path(),
                "role gate denied request"
            );
            Err(AppError::Forbidden)
        }
    }
}
