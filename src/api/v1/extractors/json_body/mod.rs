/**
 * Responsibility
 *  - JSON request bodies whose rejection uses the API error body
 */
mod core;

pub use core::JsonBody;
