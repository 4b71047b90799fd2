//! Admin registry response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{AdminGrant, User};

#[derive(Debug, Serialize)]
pub struct AdminGrantResponse {
    pub uid: Uuid,
    pub email: Option<String>,
    pub role: String,
    pub granted_by: String,
    pub granted_at: DateTime<Utc>,
}

impl AdminGrantResponse {
    pub fn new(grant: AdminGrant, user: Option<&User>) -> Self {
        Self {
            uid: grant.uid,
            email: user.map(|u| u.email.clone()),
            role: grant.role,
            granted_by: grant.granted_by,
            granted_at: grant.granted_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserListEntry {
    pub uid: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}
