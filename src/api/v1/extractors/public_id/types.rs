/**
 * Responsibility
 *  - one tagged id type per resource exposed with a public id
 *
 * Everything `pub` here is re-exported through ./mod.rs (`pub use types::*`).
 */
use super::core::PublicId;

// tasks
pub enum TaskTag {}
pub type PublicTaskId = PublicId<TaskTag>;
