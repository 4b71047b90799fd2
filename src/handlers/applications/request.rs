//! Application request DTOs

use serde::Deserialize;
use validator::Validate;

use crate::{constants::MAX_NOTE_LENGTH, models::Applicant};

/// Body of a new application; field checks depend on the competition and happen in the service
#[derive(Debug, Deserialize)]
pub struct SubmitApplicationRequest {
    pub applicant: Applicant,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct RejectApplicationRequest {
    #[validate(length(max = MAX_NOTE_LENGTH))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListApplicationsQuery {
    /// pending, approved or rejected
    pub status: Option<String>,
}
