//! Authentication / route-level authorization for `/api/v1/*`.
//!
//! - `access`: establishes the caller identity, never rejects
//! - `role_gate`: static route table check, rejects with 401 / 403

pub mod access;
pub mod role_gate;

use axum::Router;

use crate::state::AppState;

/// Apply both stages. The identity stage runs first (outermost), then the role gate.
///
/// Must be applied on the router that still sees the full `/api/v1/...` path.
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    let router = role_gate::apply(router);
    access::apply(router, state)
}
