//! User and admin registry models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Portal user profile, keyed by the uid issued by the identity provider
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub uid: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Presence of a grant for a uid makes that identity an admin
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminGrant {
    pub uid: Uuid,
    pub role: String,
    pub granted_by: String,
    pub granted_at: DateTime<Utc>,
}
