//! The identity performing an operation

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Signed-in identity with its admin flag resolved from the admin registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub uid: Uuid,
    pub email: String,
    pub is_admin: bool,
}

impl Actor {
    pub fn new(uid: Uuid, email: impl Into<String>, is_admin: bool) -> Self {
        Self {
            uid,
            email: email.into(),
            is_admin,
        }
    }

    /// Visitor without a session
    pub fn anonymous() -> Self {
        Self::new(Uuid::nil(), "", false)
    }

    pub fn is_anonymous(&self) -> bool {
        self.uid.is_nil()
    }

    /// Whether this actor is the given creator
    pub fn is_creator_of(&self, creator: &Creator) -> bool {
        !self.is_anonymous() && self.uid == creator.uid
    }

    /// Audit stamp for an action taken now
    pub fn stamp(&self, at: chrono::DateTime<chrono::Utc>) -> Stamp {
        Stamp {
            by: self.email.clone(),
            at,
        }
    }
}

/// Identity that created a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub uid: Uuid,
    pub email: String,
}

impl From<&Actor> for Creator {
    fn from(actor: &Actor) -> Self {
        Self {
            uid: actor.uid,
            email: actor.email.clone(),
        }
    }
}

/// Who did something and when
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamp {
    pub by: String,
    pub at: chrono::DateTime<chrono::Utc>,
}

impl Stamp {
    /// Rebuild a stamp from a pair of nullable columns
    pub fn from_columns(by: Option<String>, at: Option<chrono::DateTime<chrono::Utc>>) -> Option<Self> {
        match (by, at) {
            (Some(by), Some(at)) => Some(Self { by, at }),
            _ => None,
        }
    }
}
