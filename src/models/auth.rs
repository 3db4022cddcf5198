//! Authentication-related models

use serde::{Deserialize, Serialize};

use super::user::UserResponse;

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub expires_in: u64,
    pub user: UserResponse,
}
