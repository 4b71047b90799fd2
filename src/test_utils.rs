//! Fixtures shared by unit tests

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    config::JwtConfig,
    db::Repositories,
    events::ChangeFeed,
    identity::{IdentityProvider, LocalIdentityProvider, MemoryCredentialStore},
    models::{
        Actor, AdminGrant, Applicant, Application, ApplicationStatus, Category, Competition,
        Creator, IndividualApplicant, NewCompetition, ParticipationMode, Phase, PublicationStatus,
        RegistrationMode, RegistrationRequest, RegistrationStatus,
    },
    services::Backend,
    utils::crypto::hash_password,
};

pub fn user(email: &str) -> Actor {
    Actor::new(Uuid::new_v4(), email, false)
}

pub fn admin(email: &str) -> Actor {
    Actor::new(Uuid::new_v4(), email, true)
}

pub fn pending_request(email: &str) -> RegistrationRequest {
    let now = Utc::now();
    RegistrationRequest {
        id: Uuid::new_v4(),
        email: email.to_string(),
        password_hash: hash_password("lozinka123").unwrap(),
        first_name: "Ana".to_string(),
        last_name: "Horvat".to_string(),
        class_grade: "3.b".to_string(),
        reason: Some("Voditeljica matematičke grupe".to_string()),
        status: RegistrationStatus::Pending,
        admin_note: None,
        rejection_reason: None,
        processed: None,
        temporary_password_issued: false,
        created_at: now,
        updated_at: now,
        version: 0,
    }
}

/// Published competition open for individual applications in the portal
pub fn competition_by(creator: &Actor) -> Competition {
    let now = Utc::now();
    Competition {
        id: Uuid::new_v4(),
        name: "Školsko natjecanje iz matematike".to_string(),
        date: NaiveDate::from_ymd_opt(2027, 2, 14).unwrap(),
        category: Category::Matematika,
        description: "Prvi krug".to_string(),
        registration: RegistrationMode::Portal,
        participation: ParticipationMode::Individual,
        status: PublicationStatus::Published,
        phase: Phase::Prijave,
        creator: Creator::from(creator),
        sent: Some(creator.stamp(now)),
        approved: None,
        rejected: None,
        rejection_reason: None,
        started: None,
        ended: None,
        content: Vec::new(),
        applicants_visible: false,
        created_at: now,
        updated_at: now,
        version: 0,
    }
}

pub fn draft_competition_by(creator: &Actor) -> Competition {
    Competition {
        status: PublicationStatus::Draft,
        sent: None,
        ..competition_by(creator)
    }
}

pub fn individual(name: &str, email: &str) -> Applicant {
    Applicant::Individual(IndividualApplicant {
        name: name.to_string(),
        surname: "Kovač".to_string(),
        email: email.to_string(),
        class_name: "2.a".to_string(),
        contact: None,
        notes: None,
    })
}

pub fn application_for(competition: &Competition, applicant: Applicant) -> Application {
    Application {
        id: Uuid::new_v4(),
        competition_id: competition.id,
        applicant,
        status: ApplicationStatus::Pending,
        rejection_reason: None,
        reviewed: None,
        submitted_at: Utc::now(),
        user_id: None,
        version: 0,
    }
}

pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test-secret".to_string(),
        expiry_hours: 1,
    }
}

pub fn memory_identity() -> Arc<dyn IdentityProvider> {
    Arc::new(LocalIdentityProvider::new(
        Arc::new(MemoryCredentialStore::default()),
        jwt_config(),
    ))
}

/// In-memory repositories, local identity and a fresh change feed
pub fn memory_backend() -> Backend {
    Backend::new(Repositories::memory(), memory_identity(), ChangeFeed::new())
}

/// Record an admin grant for `actor` so live admin lookups see it
pub async fn grant_admin(backend: &Backend, actor: &Actor) {
    backend
        .repos
        .admins
        .grant(AdminGrant {
            uid: actor.uid,
            role: crate::constants::ADMIN_ROLE.to_string(),
            granted_by: "test".to_string(),
            granted_at: Utc::now(),
        })
        .await
        .unwrap();
}

/// Persist a fixture competition, keeping its phase and visibility
pub async fn store_competition(backend: &Backend, competition: Competition) -> Competition {
    let created = backend
        .repos
        .competitions
        .create(NewCompetition {
            name: competition.name.clone(),
            date: competition.date,
            category: competition.category.clone(),
            description: competition.description.clone(),
            registration: competition.registration.clone(),
            participation: competition.participation,
            status: competition.status,
            creator: competition.creator.clone(),
            sent: competition.sent.clone(),
            content: competition.content.clone(),
        })
        .await
        .unwrap();
    let next = Competition {
        id: created.id,
        version: created.version,
        ..competition
    };
    backend.repos.competitions.update(&next).await.unwrap()
}
