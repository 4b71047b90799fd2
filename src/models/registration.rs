//! Registration request model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Stamp;

/// A request to create a portal account, awaiting an admin decision
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub id: Uuid,
    pub email: String,
    /// Argon2 hash of the password chosen at submission
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub class_grade: String,
    pub reason: Option<String>,
    pub status: RegistrationStatus,
    pub admin_note: Option<String>,
    pub rejection_reason: Option<String>,
    /// Admin decision (approval or rejection)
    pub processed: Option<Stamp>,
    /// The account was created with a generated password instead of the submitted one
    pub temporary_password_issued: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl RegistrationRequest {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Fields supplied when a request is submitted
#[derive(Debug, Clone)]
pub struct NewRegistrationRequest {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub class_grade: String,
    pub reason: Option<String>,
}

/// Registration request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Pending,
    Approved,
    Rejected,
}

impl RegistrationStatus {
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

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [
            RegistrationStatus::Pending,
            RegistrationStatus::Approved,
            RegistrationStatus::Rejected,
        ] {
            assert_eq!(RegistrationStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RegistrationStatus::parse("archived"), None);
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let now = Utc::now();
        let request = RegistrationRequest {
            id: Uuid::new_v4(),
            email: "ana@skola.hr".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Horvat".to_string(),
            class_grade: "3.b".to_string(),
            reason: None,
            status: RegistrationStatus::Pending,
            admin_note: None,
            rejection_reason: None,
            processed: None,
            temporary_password_issued: false,
            created_at: now,
            updated_at: now,
            version: 1,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"status\":\"pending\""));
    }
}
