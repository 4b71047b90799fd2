//! Business logic services
//!
//! Services load documents through the repositories, run the pure transition
//! from [`crate::workflow`], persist the result and announce it on the
//! change feed.

pub mod admin_service;
pub mod application_service;
pub mod auth_service;
pub mod competition_service;
pub mod content_service;
pub mod registration_service;

use std::sync::Arc;

use portal_rules::prelude::Denial;

use crate::{
    error::AppError,
    events::{ChangeEvent, ChangeFeed},
    db::Repositories,
    identity::IdentityProvider,
    models::Actor,
};

pub use admin_service::AdminService;
pub use application_service::ApplicationService;
pub use auth_service::AuthService;
pub use competition_service::CompetitionService;
pub use content_service::ContentService;
pub use registration_service::RegistrationService;

/// Collaborators every service works against
#[derive(Clone)]
pub struct Backend {
    pub repos: Repositories,
    pub identity: Arc<dyn IdentityProvider>,
    pub feed: ChangeFeed,
}

impl Backend {
    pub fn new(repos: Repositories, identity: Arc<dyn IdentityProvider>, feed: ChangeFeed) -> Self {
        Self {
            repos,
            identity,
            feed,
        }
    }

    pub(crate) fn announce(&self, event: ChangeEvent) {
        self.feed.publish(event);
    }
}

/// Turn a refused transition into an error, logging who was refused
pub(crate) fn allowed<T>(
    result: Result<T, Denial>,
    operation: &'static str,
    actor: &Actor,
) -> Result<T, AppError> {
    result.map_err(|denial| {
        tracing::warn!(
            operation,
            actor = %actor.email,
            reason = %denial.reason,
            "Transition refused"
        );
        AppError::from(denial)
    })
}

/// Only admins may continue
pub(crate) fn require_admin(actor: &Actor, operation: &'static str) -> Result<(), AppError> {
    if actor.is_admin {
        Ok(())
    } else {
        tracing::warn!(operation, actor = %actor.email, "Admin operation refused");
        Err(AppError::Forbidden("admin role required".to_string()))
    }
}
