//! Authentication response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::User;

/// Authentication token response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

/// Profile with the admin flag as of this request
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub uid: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl UserResponse {
    pub fn new(user: User, is_admin: bool) -> Self {
        Self {
            uid: user.uid,
            email: user.email,
            display_name: user.display_name,
            is_admin,
            created_at: user.created_at,
        }
    }
}

/// Logout response
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}
