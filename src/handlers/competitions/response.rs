//! Competition response DTOs

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{
    Application, Category, Competition, ContentBlock, Creator, ParticipationMode, Phase,
    PublicationStatus, RegistrationMode, Stamp,
};

#[derive(Debug, Serialize)]
pub struct CompetitionResponse {
    pub id: Uuid,
    pub name: String,
    pub date: NaiveDate,
    pub category: Category,
    pub description: String,
    pub registration: RegistrationMode,
    pub participation: ParticipationMode,
    pub status: PublicationStatus,
    pub phase: Phase,
    pub creator: Creator,
    pub sent: Option<Stamp>,
    pub approved: Option<Stamp>,
    pub rejected: Option<Stamp>,
    pub rejection_reason: Option<String>,
    pub started: Option<Stamp>,
    pub ended: Option<Stamp>,
    pub content: Vec<ContentBlock>,
    pub applicants_visible: bool,
    pub accepts_applications: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl From<Competition> for CompetitionResponse {
    fn from(c: Competition) -> Self {
        let accepts_applications = c.accepts_applications();
        Self {
            id: c.id,
            name: c.name,
            date: c.date,
            category: c.category,
            description: c.description,
            registration: c.registration,
            participation: c.participation,
            status: c.status,
            phase: c.phase,
            creator: c.creator,
            sent: c.sent,
            approved: c.approved,
            rejected: c.rejected,
            rejection_reason: c.rejection_reason,
            started: c.started,
            ended: c.ended,
            content: c.content,
            applicants_visible: c.applicants_visible,
            accepts_applications,
            created_at: c.created_at,
            updated_at: c.updated_at,
            version: c.version,
        }
    }
}

/// Competition list entry (content omitted)
#[derive(Debug, Serialize)]
pub struct CompetitionSummary {
    pub id: Uuid,
    pub name: String,
    pub date: NaiveDate,
    pub category: Category,
    pub registration: RegistrationMode,
    pub participation: ParticipationMode,
    pub status: PublicationStatus,
    pub phase: Phase,
    pub creator_email: String,
    pub accepts_applications: bool,
}

impl From<Competition> for CompetitionSummary {
    fn from(c: Competition) -> Self {
        let accepts_applications = c.accepts_applications();
        Self {
            id: c.id,
            name: c.name,
            date: c.date,
            category: c.category,
            registration: c.registration,
            participation: c.participation,
            status: c.status,
            phase: c.phase,
            creator_email: c.creator.email,
            accepts_applications,
        }
    }
}

/// An approved applicant offered for a derived table column
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ApplicantOption {
    pub id: Uuid,
    pub label: String,
}

impl From<&Application> for ApplicantOption {
    fn from(application: &Application) -> Self {
        Self {
            id: application.id,
            label: application.applicant.display_name(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub id: Uuid,
    /// Applications removed together with the competition
    pub applications_deleted: u64,
}
