//! Registration request DTOs

use serde::Deserialize;
use validator::Validate;

use crate::constants::{MAX_NAME_LENGTH, MAX_NOTE_LENGTH, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};

/// Public account request
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitRegistrationRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = MIN_PASSWORD_LENGTH, max = MAX_PASSWORD_LENGTH))]
    pub password: String,

    #[validate(length(min = 1, max = MAX_NAME_LENGTH))]
    pub first_name: String,

    #[validate(length(min = 1, max = MAX_NAME_LENGTH))]
    pub last_name: String,

    #[validate(length(min = 1, max = MAX_NAME_LENGTH))]
    pub class_grade: String,

    #[validate(length(max = MAX_NOTE_LENGTH))]
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ApproveRegistrationRequest {
    /// Create the account with a generated password instead of the submitted one
    #[serde(default)]
    pub issue_temporary_password: bool,

    #[validate(length(max = MAX_NOTE_LENGTH))]
    pub admin_note: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct RejectRegistrationRequest {
    #[validate(length(max = MAX_NOTE_LENGTH))]
    pub reason: Option<String>,

    #[validate(length(max = MAX_NOTE_LENGTH))]
    pub admin_note: Option<String>,
}

/// Query parameters for listing requests
#[derive(Debug, Deserialize)]
pub struct ListRegistrationsQuery {
    /// pending, approved or rejected
    pub status: Option<String>,
}
