//! Live change stream (Server-Sent Events)
//!
//! Each connection holds its own receiver on the change feed; closing the
//! connection drops it.

use std::{convert::Infallible, time::Duration};

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    constants::SSE_KEEP_ALIVE_SECS,
    error::{AppError, AppResult},
    events::{ChangeEvent, ChangeFilter, Collection},
    middleware::auth::OptionalAuth,
    services::Backend,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub collection: Option<String>,
    /// Only changes under this competition
    pub parent: Option<Uuid>,
}

/// What a subscriber is sent
#[derive(Debug, Clone, PartialEq)]
enum Delivery {
    Change(ChangeEvent),
    /// Changes dropped because the subscriber fell behind
    Lagged(u64),
}

impl Delivery {
    fn into_frame(self) -> Event {
        match self {
            Self::Change(event) => Event::default()
                .event(event.collection.as_str())
                .json_data(&event)
                .unwrap_or_else(|_| Event::default().comment("unencodable change")),
            Self::Lagged(skipped) => Event::default().event("lagged").data(skipped.to_string()),
        }
    }
}

/// One open change stream
struct Subscriber {
    receiver: broadcast::Receiver<ChangeEvent>,
    filter: ChangeFilter,
    viewer: Option<Uuid>,
    is_admin: bool,
    backend: Backend,
}

impl Subscriber {
    /// Follow grants and revokes of the viewer's own admin role
    async fn refresh(&mut self, event: &ChangeEvent) {
        let Some(uid) = self.viewer else {
            return;
        };
        if event.collection != Collection::AdminGrants || event.id != uid {
            return;
        }
        self.is_admin = match self.backend.repos.admins.is_admin(&uid).await {
            Ok(is_admin) => is_admin,
            Err(err) => {
                warn!(uid = %uid, error = %err, "Admin lookup failed for a change stream");
                false
            }
        };
        debug!(uid = %uid, is_admin = self.is_admin, "Change stream admin status refreshed");
    }

    async fn next(&mut self) -> Option<Delivery> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    self.refresh(&event).await;
                    if !self.is_admin && self.filter.collection.is_some_and(|c| c.is_admin_only()) {
                        debug!("Change stream closed after the admin role was revoked");
                        return None;
                    }
                    let hidden = event.collection.is_admin_only() && !self.is_admin;
                    if hidden || !self.filter.matches(&event) {
                        continue;
                    }
                    return Some(Delivery::Change(event));
                }
                Err(RecvError::Lagged(skipped)) => {
                    // the client should reload instead of trusting its view
                    warn!(skipped, "Change stream subscriber lagged");
                    return Some(Delivery::Lagged(skipped));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    fn into_stream(self) -> impl Stream<Item = Delivery> {
        stream::unfold(self, |mut subscriber| async move {
            subscriber.next().await.map(|delivery| (delivery, subscriber))
        })
    }
}

/// Stream changes matching the query
pub async fn stream_events(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Query(query): Query<EventsQuery>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let collection = query
        .collection
        .as_deref()
        .map(|c| {
            Collection::parse(c)
                .ok_or_else(|| AppError::InvalidInput(format!("Unknown collection '{c}'")))
        })
        .transpose()?;

    let is_admin = auth.actor().is_some_and(|a| a.is_admin);
    if collection.is_some_and(|c| c.is_admin_only()) && !is_admin {
        return Err(AppError::Forbidden(
            "admin role required for this collection".to_string(),
        ));
    }

    let filter = ChangeFilter {
        collection,
        parent_id: query.parent,
    };
    debug!(?filter, is_admin, "Change stream opened");
    let subscriber = Subscriber {
        receiver: state.backend().feed.subscribe(),
        filter,
        viewer: auth.actor().filter(|a| !a.is_anonymous()).map(|a| a.uid),
        is_admin,
        backend: state.backend().clone(),
    };
    let stream = subscriber
        .into_stream()
        .map(|delivery| Ok(delivery.into_frame()));

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new().interval(Duration::from_secs(SSE_KEEP_ALIVE_SECS)),
    ))
}

/// Event routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/events", get(stream_events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ChangeKind;
    use crate::models::Actor;
    use crate::test_utils::{grant_admin, memory_backend, user};

    fn subscriber(backend: &Backend, viewer: &Actor, filter: ChangeFilter) -> Subscriber {
        Subscriber {
            receiver: backend.feed.subscribe(),
            filter,
            viewer: Some(viewer.uid),
            is_admin: viewer.is_admin,
            backend: backend.clone(),
        }
    }

    #[tokio::test]
    async fn test_granted_viewer_starts_seeing_admin_changes() {
        let backend = memory_backend();
        let teacher = user("nastavnik@skola.hr");
        let mut stream = subscriber(&backend, &teacher, ChangeFilter::default());
        let registration = ChangeEvent::new(
            Collection::RegistrationRequests,
            Uuid::new_v4(),
            ChangeKind::Created,
        );

        backend.feed.publish(registration.clone());
        grant_admin(&backend, &teacher).await;
        let grant = ChangeEvent::new(Collection::AdminGrants, teacher.uid, ChangeKind::Created);
        backend.feed.publish(grant.clone());
        backend.feed.publish(registration.clone());

        assert_eq!(stream.next().await, Some(Delivery::Change(grant)));
        assert_eq!(stream.next().await, Some(Delivery::Change(registration)));
    }

    #[tokio::test]
    async fn test_revoked_viewer_loses_admin_stream() {
        let backend = memory_backend();
        let teacher = user("nastavnik@skola.hr");
        grant_admin(&backend, &teacher).await;
        let teacher = Actor {
            is_admin: true,
            ..teacher
        };
        let mut stream = subscriber(
            &backend,
            &teacher,
            ChangeFilter {
                collection: Some(Collection::Users),
                parent_id: None,
            },
        );
        let profile = ChangeEvent::new(Collection::Users, Uuid::new_v4(), ChangeKind::Created);

        backend.feed.publish(profile.clone());
        assert_eq!(stream.next().await, Some(Delivery::Change(profile.clone())));

        backend.repos.admins.revoke(&teacher.uid).await.unwrap();
        backend.feed.publish(ChangeEvent::new(
            Collection::AdminGrants,
            teacher.uid,
            ChangeKind::Deleted,
        ));
        backend.feed.publish(profile);

        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn test_revoked_viewer_keeps_public_changes_only() {
        let backend = memory_backend();
        let teacher = user("nastavnik@skola.hr");
        grant_admin(&backend, &teacher).await;
        let teacher = Actor {
            is_admin: true,
            ..teacher
        };
        let mut stream = subscriber(&backend, &teacher, ChangeFilter::default());
        let competition =
            ChangeEvent::new(Collection::Competitions, Uuid::new_v4(), ChangeKind::Updated);

        backend.repos.admins.revoke(&teacher.uid).await.unwrap();
        backend.feed.publish(ChangeEvent::new(
            Collection::AdminGrants,
            teacher.uid,
            ChangeKind::Deleted,
        ));
        backend.feed.publish(ChangeEvent::new(
            Collection::Users,
            Uuid::new_v4(),
            ChangeKind::Created,
        ));
        backend.feed.publish(competition.clone());

        assert_eq!(stream.next().await, Some(Delivery::Change(competition)));
    }
}
