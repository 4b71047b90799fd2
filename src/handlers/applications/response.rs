//! Application response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Applicant, ApplicantKind, Application, ApplicationStatus, Stamp};

/// Full application, shown to the competition's creator and admins
#[derive(Debug, Serialize)]
pub struct ApplicationResponse {
    pub id: Uuid,
    pub competition_id: Uuid,
    pub applicant: Applicant,
    pub status: ApplicationStatus,
    pub rejection_reason: Option<String>,
    pub reviewed: Option<Stamp>,
    pub submitted_at: DateTime<Utc>,
    pub user_id: Option<Uuid>,
    pub version: i64,
}

impl From<Application> for ApplicationResponse {
    fn from(a: Application) -> Self {
        Self {
            id: a.id,
            competition_id: a.competition_id,
            applicant: a.applicant,
            status: a.status,
            rejection_reason: a.rejection_reason,
            reviewed: a.reviewed,
            submitted_at: a.submitted_at,
            user_id: a.user_id,
            version: a.version,
        }
    }
}

/// Public view of an approved applicant; contact details are left out
#[derive(Debug, Serialize)]
pub struct PublicApplicantResponse {
    pub id: Uuid,
    pub kind: ApplicantKind,
    pub name: String,
    pub members: Vec<String>,
}

impl From<Application> for PublicApplicantResponse {
    fn from(a: Application) -> Self {
        let members = match &a.applicant {
            Applicant::Individual(_) => Vec::new(),
            Applicant::Group(group) => group
                .members
                .iter()
                .map(|m| format!("{} {}", m.name, m.surname))
                .collect(),
        };
        Self {
            id: a.id,
            kind: a.applicant.kind(),
            name: a.applicant.display_name(),
            members,
        }
    }
}

/// Listing whose shape depends on who is asking
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ApplicationList {
    Full(Vec<ApplicationResponse>),
    Public(Vec<PublicApplicantResponse>),
}

impl ApplicationList {
    pub fn len(&self) -> usize {
        match self {
            Self::Full(items) => items.len(),
            Self::Public(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
