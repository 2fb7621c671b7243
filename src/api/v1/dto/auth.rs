/*
 * Responsibility
 * - /authenticate and /register request/response DTOs
 * - field checks live in `Credentials::validate` (shared by both endpoints)
 */
use serde::{Deserialize, Serialize};

use crate::services::auth::Credentials;

#[derive(Deserialize)]
pub struct AuthenticationRequest {
    pub email: String,
    pub password: String,
}

impl AuthenticationRequest {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.email, &self.password)
    }
}

#[derive(Debug, Serialize)]
pub struct AuthenticationResponse {
    pub jwt: String,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.email, &self.password)
    }
}

pub const REGISTERED_MESSAGE: &str = "User registered successfully";
