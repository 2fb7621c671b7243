/*
 * Responsibility
 * - persistence collaborators used by the auth core and the task handlers
 * - traits live next to their Postgres implementation
 */
pub mod error;
#[cfg(test)]
pub mod memory;
pub mod task_repo;
pub mod user_repo;
