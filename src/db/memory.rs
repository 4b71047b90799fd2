//! In-memory repositories
//!
//! Used by the `memory` storage backend and by tests. They honor the same
//! contracts as the Postgres implementations, version checks included.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repositories::{
    closed_for_applications, stale_or_missing, AdminRepository, ApplicationRepository,
    CompetitionRepository, RegistrationRepository, Repositories, UserRepository,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        AdminGrant, Application, ApplicationStatus, Competition, NewApplication, NewCompetition,
        NewRegistrationRequest, Phase, PublicationStatus, RegistrationRequest, RegistrationStatus,
        User,
    },
};

impl Repositories {
    /// Fresh, empty in-memory repositories
    pub fn memory() -> Self {
        let competitions = MemoryCompetitionRepository::default();
        let applications = MemoryApplicationRepository::new(&competitions);
        Self {
            registrations: Arc::new(MemoryRegistrationRepository::default()),
            users: Arc::new(MemoryUserRepository::default()),
            admins: Arc::new(MemoryAdminRepository::default()),
            competitions: Arc::new(competitions),
            applications: Arc::new(applications),
        }
    }
}

/// Replace `current` with `next` if the versions match, bumping the version
fn versioned<T: Clone>(
    rows: &mut HashMap<Uuid, T>,
    id: Uuid,
    next: &T,
    version_of: impl Fn(&T) -> i64,
    bump: impl Fn(&mut T),
    what: &str,
) -> AppResult<T> {
    let Some(current) = rows.get_mut(&id) else {
        return Err(stale_or_missing(false, what));
    };
    if version_of(current) != version_of(next) {
        return Err(stale_or_missing(true, what));
    }
    let mut stored = next.clone();
    bump(&mut stored);
    *current = stored.clone();
    Ok(stored)
}

#[derive(Default)]
pub struct MemoryRegistrationRepository {
    rows: RwLock<HashMap<Uuid, RegistrationRequest>>,
}

#[async_trait]
impl RegistrationRepository for MemoryRegistrationRepository {
    async fn create(&self, new: NewRegistrationRequest) -> AppResult<RegistrationRequest> {
        let mut rows = self.rows.write().await;
        let duplicate = rows
            .values()
            .any(|r| r.email == new.email && r.status == RegistrationStatus::Pending);
        if duplicate {
            return Err(AppError::AlreadyExists("Resource already exists".to_string()));
        }

        let now = Utc::now();
        let request = RegistrationRequest {
            id: Uuid::new_v4(),
            email: new.email,
            password_hash: new.password_hash,
            first_name: new.first_name,
            last_name: new.last_name,
            class_grade: new.class_grade,
            reason: new.reason,
            status: RegistrationStatus::Pending,
            admin_note: None,
            rejection_reason: None,
            processed: None,
            temporary_password_issued: false,
            created_at: now,
            updated_at: now,
            version: 1,
        };
        rows.insert(request.id, request.clone());
        Ok(request)
    }

    async fn find_by_id(&self, id: &Uuid) -> AppResult<Option<RegistrationRequest>> {
        Ok(self.rows.read().await.get(id).cloned())
    }

    async fn find_pending_by_email(&self, email: &str) -> AppResult<Option<RegistrationRequest>> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|r| r.email == email && r.status == RegistrationStatus::Pending)
            .cloned())
    }

    async fn list(&self, status: Option<RegistrationStatus>) -> AppResult<Vec<RegistrationRequest>> {
        let mut requests: Vec<_> = self
            .rows
            .read()
            .await
            .values()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn update(&self, request: &RegistrationRequest) -> AppResult<RegistrationRequest> {
        let mut rows = self.rows.write().await;
        versioned(
            &mut rows,
            request.id,
            request,
            |r| r.version,
            |r| r.version += 1,
            "Registration request",
        )
    }

    async fn delete(&self, id: &Uuid) -> AppResult<bool> {
        Ok(self.rows.write().await.remove(id).is_some())
    }
}

#[derive(Default)]
pub struct MemoryUserRepository {
    rows: RwLock<HashMap<Uuid, User>>,
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn ensure(
        &self,
        uid: &Uuid,
        email: &str,
        display_name: Option<&str>,
    ) -> AppResult<(User, bool)> {
        let mut rows = self.rows.write().await;
        if let Some(user) = rows.get(uid) {
            return Ok((user.clone(), false));
        }
        if rows.values().any(|u| u.email == email) {
            return Err(AppError::AlreadyExists("Resource already exists".to_string()));
        }

        let user = User {
            uid: *uid,
            email: email.to_string(),
            display_name: display_name.map(str::to_string),
            created_at: Utc::now(),
        };
        rows.insert(*uid, user.clone());
        Ok((user, true))
    }

    async fn find_by_uid(&self, uid: &Uuid) -> AppResult<Option<User>> {
        Ok(self.rows.read().await.get(uid).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let mut users: Vec<_> = self.rows.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }
}

#[derive(Default)]
pub struct MemoryAdminRepository {
    rows: RwLock<HashMap<Uuid, AdminGrant>>,
}

#[async_trait]
impl AdminRepository for MemoryAdminRepository {
    async fn find(&self, uid: &Uuid) -> AppResult<Option<AdminGrant>> {
        Ok(self.rows.read().await.get(uid).cloned())
    }

    async fn list(&self) -> AppResult<Vec<AdminGrant>> {
        let mut grants: Vec<_> = self.rows.read().await.values().cloned().collect();
        grants.sort_by(|a, b| a.granted_at.cmp(&b.granted_at));
        Ok(grants)
    }

    async fn grant(&self, grant: AdminGrant) -> AppResult<AdminGrant> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&grant.uid) {
            return Err(AppError::AlreadyExists("User is already an admin".to_string()));
        }
        rows.insert(grant.uid, grant.clone());
        Ok(grant)
    }

    async fn revoke(&self, uid: &Uuid) -> AppResult<bool> {
        Ok(self.rows.write().await.remove(uid).is_some())
    }
}

#[derive(Default)]
pub struct MemoryCompetitionRepository {
    rows: Arc<RwLock<HashMap<Uuid, Competition>>>,
}

#[async_trait]
impl CompetitionRepository for MemoryCompetitionRepository {
    async fn create(&self, new: NewCompetition) -> AppResult<Competition> {
        let now = Utc::now();
        let competition = Competition {
            id: Uuid::new_v4(),
            name: new.name,
            date: new.date,
            category: new.category,
            description: new.description,
            registration: new.registration,
            participation: new.participation,
            status: new.status,
            phase: Phase::Prijave,
            creator: new.creator,
            sent: new.sent,
            approved: None,
            rejected: None,
            rejection_reason: None,
            started: None,
            ended: None,
            content: new.content,
            applicants_visible: false,
            created_at: now,
            updated_at: now,
            version: 1,
        };
        self.rows
            .write()
            .await
            .insert(competition.id, competition.clone());
        Ok(competition)
    }

    async fn find_by_id(&self, id: &Uuid) -> AppResult<Option<Competition>> {
        Ok(self.rows.read().await.get(id).cloned())
    }

    async fn list_by_status(&self, status: PublicationStatus) -> AppResult<Vec<Competition>> {
        let mut competitions: Vec<_> = self
            .rows
            .read()
            .await
            .values()
            .filter(|c| c.status == status)
            .cloned()
            .collect();
        competitions.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        Ok(competitions)
    }

    async fn list_by_creator_email(&self, email: &str) -> AppResult<Vec<Competition>> {
        let mut competitions: Vec<_> = self
            .rows
            .read()
            .await
            .values()
            .filter(|c| c.creator.email == email)
            .cloned()
            .collect();
        competitions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(competitions)
    }

    async fn update(&self, competition: &Competition) -> AppResult<Competition> {
        let mut rows = self.rows.write().await;
        versioned(
            &mut rows,
            competition.id,
            competition,
            |c| c.version,
            |c| c.version += 1,
            "Competition",
        )
    }

    async fn delete(&self, id: &Uuid) -> AppResult<bool> {
        Ok(self.rows.write().await.remove(id).is_some())
    }
}

/// Applications; reads the competitions map to check that a competition is open
pub struct MemoryApplicationRepository {
    competitions: Arc<RwLock<HashMap<Uuid, Competition>>>,
    rows: RwLock<HashMap<Uuid, Application>>,
}

impl MemoryApplicationRepository {
    pub fn new(competitions: &MemoryCompetitionRepository) -> Self {
        Self {
            competitions: Arc::clone(&competitions.rows),
            rows: RwLock::default(),
        }
    }
}

#[async_trait]
impl ApplicationRepository for MemoryApplicationRepository {
    async fn create(&self, new: NewApplication) -> AppResult<Application> {
        // held until the insert so a phase change cannot slip in between
        let competitions = self.competitions.read().await;
        let competition = competitions
            .get(&new.competition_id)
            .ok_or_else(|| AppError::NotFound("Competition not found".to_string()))?;
        if !competition.accepts_applications() {
            return Err(closed_for_applications());
        }

        let application = Application {
            id: Uuid::new_v4(),
            competition_id: new.competition_id,
            applicant: new.applicant,
            status: ApplicationStatus::Pending,
            rejection_reason: None,
            reviewed: None,
            submitted_at: Utc::now(),
            user_id: new.user_id,
            version: 1,
        };
        self.rows
            .write()
            .await
            .insert(application.id, application.clone());
        Ok(application)
    }

    async fn find_by_id(&self, id: &Uuid) -> AppResult<Option<Application>> {
        Ok(self.rows.read().await.get(id).cloned())
    }

    async fn list_by_competition(
        &self,
        competition_id: &Uuid,
        status: Option<ApplicationStatus>,
    ) -> AppResult<Vec<Application>> {
        let mut applications: Vec<_> = self
            .rows
            .read()
            .await
            .values()
            .filter(|a| a.competition_id == *competition_id)
            .filter(|a| status.is_none_or(|s| a.status == s))
            .cloned()
            .collect();
        applications.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        Ok(applications)
    }

    async fn update(&self, application: &Application) -> AppResult<Application> {
        let mut rows = self.rows.write().await;
        versioned(
            &mut rows,
            application.id,
            application,
            |a| a.version,
            |a| a.version += 1,
            "Application",
        )
    }

    async fn delete(&self, id: &Uuid) -> AppResult<bool> {
        Ok(self.rows.write().await.remove(id).is_some())
    }

    async fn delete_by_competition(&self, competition_id: &Uuid) -> AppResult<u64> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|_, a| a.competition_id != *competition_id);
        Ok((before - rows.len()) as u64)
    }
}
