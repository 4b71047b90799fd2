//! Competition model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ContentBlock, Creator, Stamp};

/// A competition page with its publication status and lifecycle phase
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Competition {
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
    /// Submitted for review
    pub sent: Option<Stamp>,
    pub approved: Option<Stamp>,
    pub rejected: Option<Stamp>,
    pub rejection_reason: Option<String>,
    pub started: Option<Stamp>,
    pub ended: Option<Stamp>,
    pub content: Vec<ContentBlock>,
    /// Whether approved applicants are listed publicly
    pub applicants_visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl Competition {
    /// Applications can only be filed through the portal for published competitions in prijave
    pub fn accepts_applications(&self) -> bool {
        self.status == PublicationStatus::Published
            && self.phase == Phase::Prijave
            && self.registration.is_portal()
    }
}

/// Fields supplied when a competition is created
#[derive(Debug, Clone)]
pub struct NewCompetition {
    pub name: String,
    pub date: NaiveDate,
    pub category: Category,
    pub description: String,
    pub registration: RegistrationMode,
    pub participation: ParticipationMode,
    pub status: PublicationStatus,
    pub creator: Creator,
    pub sent: Option<Stamp>,
    pub content: Vec<ContentBlock>,
}

/// Editable fields, `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct CompetitionChanges {
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
    pub category: Option<Category>,
    pub description: Option<String>,
    pub registration: Option<RegistrationMode>,
    pub participation: Option<ParticipationMode>,
}

impl CompetitionChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.date.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.registration.is_none()
            && self.participation.is_none()
    }

    pub fn apply_to(self, competition: &mut Competition) {
        if let Some(name) = self.name {
            competition.name = name;
        }
        if let Some(date) = self.date {
            competition.date = date;
        }
        if let Some(category) = self.category {
            competition.category = category;
        }
        if let Some(description) = self.description {
            competition.description = description;
        }
        if let Some(registration) = self.registration {
            competition.registration = registration;
        }
        if let Some(participation) = self.participation {
            competition.participation = participation;
        }
    }
}

/// Competition subject area; anything unlisted is kept as free text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Matematika,
    Informatika,
    Fizika,
    Kemija,
    Biologija,
    Jezici,
    Sport,
    Umjetnost,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Matematika => "matematika",
            Self::Informatika => "informatika",
            Self::Fizika => "fizika",
            Self::Kemija => "kemija",
            Self::Biologija => "biologija",
            Self::Jezici => "jezici",
            Self::Sport => "sport",
            Self::Umjetnost => "umjetnost",
            Self::Other(text) => text,
        }
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "matematika" => Self::Matematika,
            "informatika" => Self::Informatika,
            "fizika" => Self::Fizika,
            "kemija" => Self::Kemija,
            "biologija" => Self::Biologija,
            "jezici" => Self::Jezici,
            "sport" => Self::Sport,
            "umjetnost" => Self::Umjetnost,
            _ => Self::Other(value.trim().to_string()),
        }
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How participants sign up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum RegistrationMode {
    /// Applications are filed in the portal
    Portal,
    /// Participants register on an outside site
    External { link: String },
}

impl RegistrationMode {
    pub fn is_portal(&self) -> bool {
        matches!(self, Self::Portal)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Portal => "portal",
            Self::External { .. } => "external",
        }
    }

    pub fn external_link(&self) -> Option<&str> {
        match self {
            Self::Portal => None,
            Self::External { link } => Some(link),
        }
    }
}

/// Whether applicants are individuals or teams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ParticipationMode {
    Individual,
    Team(TeamBounds),
}

impl ParticipationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Team(_) => "team",
        }
    }
}

/// Inclusive bounds on team size, each side optional
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamBounds {
    pub min_members: Option<u32>,
    pub max_members: Option<u32>,
}

impl TeamBounds {
    pub fn contains(&self, members: usize) -> bool {
        let members = members as u64;
        self.min_members.is_none_or(|min| members >= u64::from(min))
            && self.max_members.is_none_or(|max| members <= u64::from(max))
    }

    /// Minimum not above maximum
    pub fn is_consistent(&self) -> bool {
        match (self.min_members, self.max_members) {
            (Some(min), Some(max)) => min <= max,
            _ => true,
        }
    }
}

/// Publication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationStatus {
    Draft,
    Pending,
    Published,
    Rejected,
}

impl PublicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Published => "published",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "pending" => Some(Self::Pending),
            "published" => Some(Self::Published),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for PublicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle phase; only ever advances
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Open for applications
    Prijave,
    /// Running
    Aktivan,
    /// Finished
    Zavrsio,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prijave => "prijave",
            Self::Aktivan => "aktivan",
            Self::Zavrsio => "zavrsio",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "prijave" => Some(Self::Prijave),
            "aktivan" => Some(Self::Aktivan),
            "zavrsio" => Some(Self::Zavrsio),
            _ => None,
        }
    }

    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Prijave => Some(Self::Aktivan),
            Self::Aktivan => Some(Self::Zavrsio),
            Self::Zavrsio => None,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
