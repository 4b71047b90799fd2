//! Registration request response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{RegistrationRequest, RegistrationStatus, Stamp};

#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub class_grade: String,
    pub reason: Option<String>,
    pub status: RegistrationStatus,
    pub admin_note: Option<String>,
    pub rejection_reason: Option<String>,
    pub processed: Option<Stamp>,
    pub temporary_password_issued: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl From<RegistrationRequest> for RegistrationResponse {
    fn from(request: RegistrationRequest) -> Self {
        Self {
            id: request.id,
            email: request.email,
            first_name: request.first_name,
            last_name: request.last_name,
            class_grade: request.class_grade,
            reason: request.reason,
            status: request.status,
            admin_note: request.admin_note,
            rejection_reason: request.rejection_reason,
            processed: request.processed,
            temporary_password_issued: request.temporary_password_issued,
            created_at: request.created_at,
            updated_at: request.updated_at,
            version: request.version,
        }
    }
}

/// Returned to the submitter; nothing beyond the id and status is echoed back
#[derive(Debug, Serialize)]
pub struct SubmittedResponse {
    pub id: Uuid,
    pub status: RegistrationStatus,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ApprovalResponse {
    pub request: RegistrationResponse,
    pub uid: Uuid,
    /// Shown once; only present when a temporary password was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporary_password: Option<String>,
}
