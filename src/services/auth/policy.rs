//! Per-resource access decisions.
//!
//! Pure functions over role and ownership facts: no I/O, never fail.
//! Callers turn `false` into `AccessDenied` at the boundary (see `ensure`).

use thiserror::Error;
use uuid::Uuid;

use crate::services::auth::identity::Identity;

/// Ownership facts of a task, supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceOwnership {
    pub author_id: Uuid,
    pub assignee_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("access denied")]
pub struct AccessDenied;

/// ADMIN, the author, or the assignee.
pub fn can_view_or_modify_task(identity: &Identity, task: &ResourceOwnership) -> bool {
    identity.is_admin()
        || identity.id == task.author_id
        || task.assignee_id.is_some_and(|assignee| assignee == identity.id)
}

/// Commenting follows the same rule as viewing the task.
pub fn can_comment(identity: &Identity, task: &ResourceOwnership) -> bool {
    can_view_or_modify_task(identity, task)
}

/// Whether a "my tasks" listing is widened to every task.
pub fn can_list_all(identity: &Identity) -> bool {
    identity.is_admin()
}

pub fn ensure(allowed: bool) -> Result<(), AccessDenied> {
    if allowed { Ok(()) } else { Err(AccessDenied) }
}
