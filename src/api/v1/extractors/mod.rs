/*
 * Responsibility
 * - request -> typed values for handlers (auth context, public ids, JSON bodies)
 */
pub mod auth_ctx;
pub mod json_body;
pub mod public_id;

pub use auth_ctx::{AuthCtx, AuthCtxExtractor};
pub use json_body::JsonBody;
