/*
 * Responsibility
 * - Users response DTOs (current identity, role grants)
 * - the password hash never appears here
 */
use serde::Serialize;
use uuid::Uuid;

use crate::services::auth::Role;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub email: String,
    pub roles: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct RoleGrantResponse {
    pub user_id: Uuid,
    pub role: &'static str,
    /// false when the user already had the role
    pub granted: bool,
}

impl RoleGrantResponse {
    pub fn new(user_id: Uuid, role: Role, granted: bool) -> Self {
        Self {
            user_id,
            role: role.as_str(),
            granted,
        }
    }
}
