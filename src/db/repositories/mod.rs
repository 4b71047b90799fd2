//! Database repositories
//!
//! One trait per document kind. Services only see the traits; the Postgres
//! implementations live next to them and the in-memory ones in
//! [`crate::db::memory`].
//!
//! Updates are conditional on the document's `version`: a write based on a
//! stale read fails with [`AppError::Conflict`] and bumps nothing.

pub mod admin_repo;
pub mod application_repo;
pub mod competition_repo;
pub mod registration_repo;
pub mod user_repo;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        AdminGrant, Application, ApplicationStatus, Competition, NewApplication, NewCompetition,
        NewRegistrationRequest, PublicationStatus, RegistrationRequest, RegistrationStatus, User,
    },
};

pub use admin_repo::PgAdminRepository;
pub use application_repo::PgApplicationRepository;
pub use competition_repo::PgCompetitionRepository;
pub use registration_repo::PgRegistrationRepository;
pub use user_repo::PgUserRepository;

#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    async fn create(&self, new: NewRegistrationRequest) -> AppResult<RegistrationRequest>;

    async fn find_by_id(&self, id: &Uuid) -> AppResult<Option<RegistrationRequest>>;

    async fn find_pending_by_email(&self, email: &str) -> AppResult<Option<RegistrationRequest>>;

    /// Newest first, optionally filtered by status
    async fn list(&self, status: Option<RegistrationStatus>) -> AppResult<Vec<RegistrationRequest>>;

    /// Versioned write of every mutable field
    async fn update(&self, request: &RegistrationRequest) -> AppResult<RegistrationRequest>;

    /// Returns whether a document was removed
    async fn delete(&self, id: &Uuid) -> AppResult<bool>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create the profile for `uid` unless it exists; the flag tells whether it was created
    async fn ensure(
        &self,
        uid: &Uuid,
        email: &str,
        display_name: Option<&str>,
    ) -> AppResult<(User, bool)>;

    async fn find_by_uid(&self, uid: &Uuid) -> AppResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn list(&self) -> AppResult<Vec<User>>;
}

#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn find(&self, uid: &Uuid) -> AppResult<Option<AdminGrant>>;

    async fn is_admin(&self, uid: &Uuid) -> AppResult<bool> {
        Ok(self.find(uid).await?.is_some())
    }

    async fn list(&self) -> AppResult<Vec<AdminGrant>>;

    /// Fails with `AlreadyExists` when the uid already holds a grant
    async fn grant(&self, grant: AdminGrant) -> AppResult<AdminGrant>;

    async fn revoke(&self, uid: &Uuid) -> AppResult<bool>;
}

#[async_trait]
pub trait CompetitionRepository: Send + Sync {
    async fn create(&self, new: NewCompetition) -> AppResult<Competition>;

    async fn find_by_id(&self, id: &Uuid) -> AppResult<Option<Competition>>;

    /// Ordered by competition date
    async fn list_by_status(&self, status: PublicationStatus) -> AppResult<Vec<Competition>>;

    /// Newest first
    async fn list_by_creator_email(&self, email: &str) -> AppResult<Vec<Competition>>;

    /// Versioned write of every mutable field
    async fn update(&self, competition: &Competition) -> AppResult<Competition>;

    async fn delete(&self, id: &Uuid) -> AppResult<bool>;
}

#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Store the application only if its competition still accepts
    /// applications at write time. Fails with `InvalidTransition` when it
    /// does not, `NotFound` when the competition is gone.
    async fn create(&self, new: NewApplication) -> AppResult<Application>;

    async fn find_by_id(&self, id: &Uuid) -> AppResult<Option<Application>>;

    /// In submission order
    async fn list_by_competition(
        &self,
        competition_id: &Uuid,
        status: Option<ApplicationStatus>,
    ) -> AppResult<Vec<Application>>;

    /// Versioned write of status and review fields
    async fn update(&self, application: &Application) -> AppResult<Application>;

    async fn delete(&self, id: &Uuid) -> AppResult<bool>;

    async fn delete_by_competition(&self, competition_id: &Uuid) -> AppResult<u64>;
}

/// Every repository the services need
#[derive(Clone)]
pub struct Repositories {
    pub registrations: Arc<dyn RegistrationRepository>,
    pub users: Arc<dyn UserRepository>,
    pub admins: Arc<dyn AdminRepository>,
    pub competitions: Arc<dyn CompetitionRepository>,
    pub applications: Arc<dyn ApplicationRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            registrations: Arc::new(PgRegistrationRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool.clone())),
            admins: Arc::new(PgAdminRepository::new(pool.clone())),
            competitions: Arc::new(PgCompetitionRepository::new(pool.clone())),
            applications: Arc::new(PgApplicationRepository::new(pool)),
        }
    }
}

/// Error for a versioned update that matched no row
pub(crate) fn stale_or_missing(exists: bool, what: &str) -> AppError {
    if exists {
        AppError::Conflict(format!(
            "{what} was changed by someone else, reload and try again"
        ))
    } else {
        AppError::NotFound(format!("{what} not found"))
    }
}

/// Error for an application whose competition closed before the write
pub(crate) fn closed_for_applications() -> AppError {
    AppError::InvalidTransition("competition no longer accepts applications".to_string())
}

/// Error for a stored enum value the code does not know
pub(crate) fn corrupt(column: &str, value: &str) -> AppError {
    AppError::Database(format!("unexpected {column} value '{value}'"))
}
