//! Competition application model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Stamp;

/// An application to a competition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Application {
    pub id: Uuid,
    pub competition_id: Uuid,
    pub applicant: Applicant,
    pub status: ApplicationStatus,
    pub rejection_reason: Option<String>,
    pub reviewed: Option<Stamp>,
    pub submitted_at: DateTime<Utc>,
    /// Signed-in user that filed the application, if any
    pub user_id: Option<Uuid>,
    pub version: i64,
}

/// Fields supplied when an application is filed
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub competition_id: Uuid,
    pub applicant: Applicant,
    pub user_id: Option<Uuid>,
}

/// Who is applying; the variant follows the competition's participation mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Applicant {
    Individual(IndividualApplicant),
    Group(GroupApplicant),
}

impl Applicant {
    pub fn kind(&self) -> ApplicantKind {
        match self {
            Self::Individual(_) => ApplicantKind::Individual,
            Self::Group(_) => ApplicantKind::Group,
        }
    }

    /// Label shown in applicant lists and pickers
    pub fn display_name(&self) -> String {
        match self {
            Self::Individual(person) => format!("{} {}", person.name, person.surname),
            Self::Group(group) => group.group_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndividualApplicant {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub class_name: String,
    pub contact: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupApplicant {
    pub group_name: String,
    pub members: Vec<GroupMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub name: String,
    pub surname: String,
    pub class_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicantKind {
    Individual,
    Group,
}

impl ApplicantKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Group => "group",
        }
    }
}

/// Application review status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applicant_wire_format() {
        let group: Applicant = serde_json::from_str(
            r#"{"kind":"group","group_name":"Pitagorejci","members":[
                {"name":"Ana","surname":"Horvat","class_name":"3.b"}]}"#,
        )
        .unwrap();
        assert_eq!(group.kind(), ApplicantKind::Group);
        assert_eq!(group.display_name(), "Pitagorejci");

        let single = Applicant::Individual(IndividualApplicant {
            name: "Ivo".into(),
            surname: "Kovač".into(),
            email: "ivo@skola.hr".into(),
            class_name: "1.a".into(),
            contact: None,
            notes: None,
        });
        let json = serde_json::to_value(&single).unwrap();
        assert_eq!(json["kind"], "individual");
        assert_eq!(single.display_name(), "Ivo Kovač");
    }
}
