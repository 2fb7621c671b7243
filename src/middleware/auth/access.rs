//! bearer token -> Identity -> AuthCtx in request extensions
//!
//! - Public routes, missing / bad / expired tokens and unknown subjects all pass through
//!   with no AuthCtx attached. Rejecting is the role gate's job.
//! - An AuthCtx that is already present is left as is.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::services::auth::AuthOutcome;
use crate::state::AppState;

pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // from_fn cannot extract State, so the state is handed over explicitly
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if req.extensions().get::<AuthCtx>().is_none() {
        // owned copies: the request body is not Sync, so no borrow of `req` may cross the await
        let path = req.uri().path().to_owned();
        let headers = req.headers().clone();
        let outcome = state.authenticator.authenticate(&path, &headers).await;

        if let AuthOutcome::Authenticated(identity) = outcome {
            // picked up by AuthCtxExtractor
            req.extensions_mut().insert(AuthCtx::new(identity));
        }
    }

    next.run(req).await
}
