//! Competition request DTOs

use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use crate::{
    constants::{
        MAX_COMPETITION_DESCRIPTION_LENGTH, MAX_COMPETITION_NAME_LENGTH, MAX_NAME_LENGTH,
        MAX_NOTE_LENGTH,
    },
    models::{ContentBlock, ParticipationMode, RegistrationMode},
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCompetitionRequest {
    #[validate(length(min = 1, max = MAX_COMPETITION_NAME_LENGTH))]
    pub name: String,

    pub date: NaiveDate,

    /// One of the known categories, or free text
    #[validate(length(min = 1, max = MAX_NAME_LENGTH))]
    pub category: String,

    #[serde(default)]
    #[validate(length(max = MAX_COMPETITION_DESCRIPTION_LENGTH))]
    pub description: String,

    pub registration: RegistrationMode,

    pub participation: ParticipationMode,

    /// Send straight to review instead of saving a draft
    #[serde(default)]
    pub submit_for_review: bool,

    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

/// Partial update; absent fields stay as they are
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCompetitionRequest {
    #[validate(length(min = 1, max = MAX_COMPETITION_NAME_LENGTH))]
    pub name: Option<String>,

    pub date: Option<NaiveDate>,

    #[validate(length(min = 1, max = MAX_NAME_LENGTH))]
    pub category: Option<String>,

    #[validate(length(max = MAX_COMPETITION_DESCRIPTION_LENGTH))]
    pub description: Option<String>,

    pub registration: Option<RegistrationMode>,

    pub participation: Option<ParticipationMode>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct RejectCompetitionRequest {
    #[validate(length(max = MAX_NOTE_LENGTH))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    pub applicants_visible: bool,
}

/// Which competitions to list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListScope {
    /// Public listing
    #[default]
    Published,
    /// Created by the caller
    Mine,
    /// Awaiting admin review
    Pending,
}

#[derive(Debug, Deserialize)]
pub struct ListCompetitionsQuery {
    #[serde(default)]
    pub scope: ListScope,
}
