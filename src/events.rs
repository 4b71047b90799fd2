//! Live change feed
//!
//! Every successful write publishes a [`ChangeEvent`]. Subscribers hold a
//! broadcast receiver; dropping it is the unsubscription.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::constants::CHANGE_FEED_CAPACITY;

/// Document collections that publish changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    RegistrationRequests,
    Competitions,
    Applications,
    AdminGrants,
    Users,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RegistrationRequests => "registration_requests",
            Self::Competitions => "competitions",
            Self::Applications => "applications",
            Self::AdminGrants => "admin_grants",
            Self::Users => "users",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "registration_requests" => Some(Self::RegistrationRequests),
            "competitions" => Some(Self::Competitions),
            "applications" => Some(Self::Applications),
            "admin_grants" => Some(Self::AdminGrants),
            "users" => Some(Self::Users),
            _ => None,
        }
    }

    /// Collections only admins may watch
    pub fn is_admin_only(&self) -> bool {
        matches!(
            self,
            Self::RegistrationRequests | Self::AdminGrants | Self::Users
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// A document changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub collection: Collection,
    /// Document id (uid for users and admin grants)
    pub id: Uuid,
    pub kind: ChangeKind,
    /// Owning competition for applications
    pub parent_id: Option<Uuid>,
    pub at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(collection: Collection, id: Uuid, kind: ChangeKind) -> Self {
        Self {
            collection,
            id,
            kind,
            parent_id: None,
            at: Utc::now(),
        }
    }

    pub fn with_parent(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// Subscription filter; `None` matches everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeFilter {
    pub collection: Option<Collection>,
    pub parent_id: Option<Uuid>,
}

impl ChangeFilter {
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        self.collection.is_none_or(|c| c == event.collection)
            && self.parent_id.is_none_or(|p| event.parent_id == Some(p))
    }
}

/// Broadcast hub for change events
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::with_capacity(CHANGE_FEED_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: ChangeEvent) {
        let delivered = self.sender.send(event.clone()).unwrap_or(0);
        tracing::debug!(
            collection = event.collection.as_str(),
            id = %event.id,
            kind = ?event.kind,
            subscribers = delivered,
            "Change published"
        );
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_and_unsubscribe_on_drop() {
        let feed = ChangeFeed::new();
        let mut rx = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 1);

        let id = Uuid::new_v4();
        feed.publish(ChangeEvent::new(Collection::Competitions, id, ChangeKind::Created));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.id, id);
        assert_eq!(event.kind, ChangeKind::Created);

        drop(rx);
        assert_eq!(feed.subscriber_count(), 0);
        // publishing without subscribers is fine
        feed.publish(ChangeEvent::new(Collection::Competitions, id, ChangeKind::Deleted));
    }

    #[test]
    fn test_filter() {
        let competition = Uuid::new_v4();
        let event = ChangeEvent::new(Collection::Applications, Uuid::new_v4(), ChangeKind::Updated)
            .with_parent(competition);

        assert!(ChangeFilter::default().matches(&event));
        assert!(ChangeFilter {
            collection: Some(Collection::Applications),
            parent_id: Some(competition),
        }
        .matches(&event));
        assert!(!ChangeFilter {
            collection: Some(Collection::Competitions),
            parent_id: None,
        }
        .matches(&event));
        assert!(!ChangeFilter {
            collection: None,
            parent_id: Some(Uuid::new_v4()),
        }
        .matches(&event));
    }

    #[test]
    fn test_collection_names() {
        for c in [
            Collection::RegistrationRequests,
            Collection::Competitions,
            Collection::Applications,
            Collection::AdminGrants,
            Collection::Users,
        ] {
            assert_eq!(Collection::parse(c.as_str()), Some(c));
        }
        assert!(Collection::RegistrationRequests.is_admin_only());
        assert!(!Collection::Competitions.is_admin_only());
    }
}
