//! Competition service

use std::collections::HashSet;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::{allowed, require_admin, Backend};
use crate::{
    error::{AppError, AppResult},
    events::{ChangeEvent, ChangeKind, Collection},
    handlers::competitions::{
        request::{
            CreateCompetitionRequest, ListScope, RejectCompetitionRequest,
            UpdateCompetitionRequest,
        },
        response::{CompetitionResponse, CompetitionSummary, DeletedResponse},
    },
    models::{
        Actor, Category, Competition, CompetitionChanges, Creator, NewCompetition,
        ParticipationMode, PublicationStatus, RegistrationMode,
    },
    utils::validation::{sanitize_optional, sanitize_string, validate_link},
    workflow::{competition as flow, content},
};

/// Competition service for business logic
pub struct CompetitionService;

impl CompetitionService {
    /// Create a competition as a draft, or send it straight to review
    pub async fn create(
        backend: &Backend,
        actor: &Actor,
        payload: CreateCompetitionRequest,
    ) -> AppResult<CompetitionResponse> {
        check_modes(&payload.registration, &payload.participation)?;

        let name = sanitize_string(&payload.name);
        if name.is_empty() {
            return Err(AppError::Validation("name is required".to_string()));
        }

        let page = content::prepare(payload.content)
            .map_err(|e| AppError::Validation(e.to_string()))?;
        // nobody is approved yet, so no applicant may be referenced
        content::check_applicant_cells(&page, &HashSet::new())
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let now = Utc::now();
        let (status, sent) = if payload.submit_for_review {
            (PublicationStatus::Pending, Some(actor.stamp(now)))
        } else {
            (PublicationStatus::Draft, None)
        };

        let competition = backend
            .repos
            .competitions
            .create(NewCompetition {
                name,
                date: payload.date,
                category: Category::from(payload.category),
                description: sanitize_string(&payload.description),
                registration: payload.registration,
                participation: payload.participation,
                status,
                creator: Creator::from(actor),
                sent,
                content: page,
            })
            .await?;

        backend.announce(ChangeEvent::new(
            Collection::Competitions,
            competition.id,
            ChangeKind::Created,
        ));
        info!(
            competition_id = %competition.id,
            actor = %actor.email,
            status = %competition.status,
            "Competition created"
        );

        Ok(competition.into())
    }

    /// Published competitions are public; others only for their creator and admins
    pub async fn get(
        backend: &Backend,
        actor: Option<&Actor>,
        id: &Uuid,
    ) -> AppResult<CompetitionResponse> {
        let competition = Self::load(backend, id).await?;
        if !is_visible(actor, &competition) {
            return Err(not_found());
        }
        Ok(competition.into())
    }

    pub async fn list(
        backend: &Backend,
        actor: Option<&Actor>,
        scope: ListScope,
    ) -> AppResult<Vec<CompetitionSummary>> {
        let competitions = match scope {
            ListScope::Published => {
                backend
                    .repos
                    .competitions
                    .list_by_status(PublicationStatus::Published)
                    .await?
            }
            ListScope::Mine => {
                let actor = actor.ok_or(AppError::Unauthorized)?;
                backend
                    .repos
                    .competitions
                    .list_by_creator_email(&actor.email)
                    .await?
            }
            ListScope::Pending => {
                let actor = actor.ok_or(AppError::Unauthorized)?;
                require_admin(actor, "list_pending_competitions")?;
                backend
                    .repos
                    .competitions
                    .list_by_status(PublicationStatus::Pending)
                    .await?
            }
        };

        Ok(competitions.into_iter().map(Into::into).collect())
    }

    /// Edit descriptive fields; status and phase only move through their transitions
    pub async fn update(
        backend: &Backend,
        actor: &Actor,
        id: &Uuid,
        payload: UpdateCompetitionRequest,
    ) -> AppResult<CompetitionResponse> {
        let competition = Self::load(backend, id).await?;
        allowed(flow::can_edit(actor, &competition), "edit_competition", actor)?;

        let changes = CompetitionChanges {
            name: payload.name.as_deref().map(sanitize_string),
            date: payload.date,
            category: payload.category.map(Category::from),
            description: payload.description.as_deref().map(sanitize_string),
            registration: payload.registration,
            participation: payload.participation,
        };
        if changes.is_empty() {
            return Err(AppError::InvalidInput("Nothing to update".to_string()));
        }
        if changes.name.as_deref() == Some("") {
            return Err(AppError::Validation("name is required".to_string()));
        }

        let mut next = competition;
        changes.apply_to(&mut next);
        check_modes(&next.registration, &next.participation)?;
        next.updated_at = Utc::now();

        let saved = backend.repos.competitions.update(&next).await?;
        announce_update(backend, &saved);
        info!(competition_id = %saved.id, actor = %actor.email, "Competition updated");

        Ok(saved.into())
    }

    /// Draft to pending, by the creator
    pub async fn submit_for_review(
        backend: &Backend,
        actor: &Actor,
        id: &Uuid,
    ) -> AppResult<CompetitionResponse> {
        Self::transition(backend, actor, id, "submit_for_review", |competition| {
            flow::submit_for_review(actor, competition, Utc::now())
        })
        .await
    }

    pub async fn approve(
        backend: &Backend,
        actor: &Actor,
        id: &Uuid,
    ) -> AppResult<CompetitionResponse> {
        Self::transition(backend, actor, id, "approve_publication", |competition| {
            flow::approve_publication(actor, competition, Utc::now())
        })
        .await
    }

    pub async fn reject(
        backend: &Backend,
        actor: &Actor,
        id: &Uuid,
        payload: RejectCompetitionRequest,
    ) -> AppResult<CompetitionResponse> {
        let reason = sanitize_optional(payload.reason.as_deref());
        Self::transition(backend, actor, id, "reject_publication", move |competition| {
            flow::reject_publication(actor, competition, reason, Utc::now())
        })
        .await
    }

    /// Close applications: prijave to aktivan
    pub async fn start(backend: &Backend, actor: &Actor, id: &Uuid) -> AppResult<CompetitionResponse> {
        Self::transition(backend, actor, id, "start_competition", |competition| {
            flow::start(actor, competition, Utc::now())
        })
        .await
    }

    /// aktivan to zavrsio
    pub async fn end(backend: &Backend, actor: &Actor, id: &Uuid) -> AppResult<CompetitionResponse> {
        Self::transition(backend, actor, id, "end_competition", |competition| {
            flow::end(actor, competition, Utc::now())
        })
        .await
    }

    /// Show or hide the approved applicant list to the public
    pub async fn set_applicants_visible(
        backend: &Backend,
        actor: &Actor,
        id: &Uuid,
        visible: bool,
    ) -> AppResult<CompetitionResponse> {
        let competition = Self::load(backend, id).await?;
        allowed(flow::can_edit(actor, &competition), "set_applicants_visible", actor)?;
        if competition.applicants_visible == visible {
            return Ok(competition.into());
        }

        let mut next = competition;
        next.applicants_visible = visible;
        next.updated_at = Utc::now();

        let saved = backend.repos.competitions.update(&next).await?;
        announce_update(backend, &saved);
        info!(
            competition_id = %saved.id,
            actor = %actor.email,
            visible,
            "Applicant list visibility changed"
        );

        Ok(saved.into())
    }

    /// Delete a competition together with its applications
    pub async fn delete(backend: &Backend, actor: &Actor, id: &Uuid) -> AppResult<DeletedResponse> {
        let competition = Self::load(backend, id).await?;
        allowed(flow::can_delete(actor, &competition), "delete_competition", actor)?;

        let applications_deleted = backend.repos.applications.delete_by_competition(id).await?;
        if !backend.repos.competitions.delete(id).await? {
            return Err(not_found());
        }

        backend.announce(ChangeEvent::new(
            Collection::Competitions,
            *id,
            ChangeKind::Deleted,
        ));
        info!(
            competition_id = %id,
            actor = %actor.email,
            applications_deleted,
            "Competition deleted"
        );

        Ok(DeletedResponse {
            id: *id,
            applications_deleted,
        })
    }

    pub(crate) async fn load(backend: &Backend, id: &Uuid) -> AppResult<Competition> {
        backend
            .repos
            .competitions
            .find_by_id(id)
            .await?
            .ok_or_else(not_found)
    }

    /// Load, run a pure transition, persist and announce
    async fn transition<F>(
        backend: &Backend,
        actor: &Actor,
        id: &Uuid,
        operation: &'static str,
        step: F,
    ) -> AppResult<CompetitionResponse>
    where
        F: FnOnce(&Competition) -> Result<Competition, portal_rules::prelude::Denial>,
    {
        let competition = Self::load(backend, id).await?;
        let next = allowed(step(&competition), operation, actor)?;

        let saved = backend.repos.competitions.update(&next).await?;
        announce_update(backend, &saved);
        info!(
            competition_id = %saved.id,
            actor = %actor.email,
            operation,
            status = %saved.status,
            phase = %saved.phase,
            "Competition transition applied"
        );

        Ok(saved.into())
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Competition not found".to_string())
}

fn announce_update(backend: &Backend, competition: &Competition) {
    backend.announce(ChangeEvent::new(
        Collection::Competitions,
        competition.id,
        ChangeKind::Updated,
    ));
}

pub(crate) fn is_visible(actor: Option<&Actor>, competition: &Competition) -> bool {
    competition.status == PublicationStatus::Published
        || actor.is_some_and(|actor| flow::can_edit(actor, competition).is_ok())
}

/// External registration needs a usable link; team bounds must make sense
fn check_modes(registration: &RegistrationMode, participation: &ParticipationMode) -> AppResult<()> {
    if let Some(link) = registration.external_link() {
        validate_link(link).map_err(|e| AppError::Validation(e.to_string()))?;
    }
    if let ParticipationMode::Team(bounds) = participation {
        if !bounds.is_consistent() {
            return Err(AppError::Validation(
                "minimum team size is above the maximum".to_string(),
            ));
        }
        if bounds.min_members == Some(0) {
            return Err(AppError::Validation(
                "a team needs at least one member".to_string(),
            ));
        }
        let sizes = [bounds.min_members, bounds.max_members];
        if sizes.into_iter().flatten().any(|size| i32::try_from(size).is_err()) {
            return Err(AppError::Validation("team size is too large".to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::{ContentBlock, Phase, TeamBounds};
    use crate::test_utils::{admin, memory_backend, user};

    fn proposal(submit: bool) -> CreateCompetitionRequest {
        CreateCompetitionRequest {
            name: "Županijsko natjecanje iz informatike".to_string(),
            date: NaiveDate::from_ymd_opt(2027, 3, 1).unwrap(),
            category: "Informatika".to_string(),
            description: "Algoritmi".to_string(),
            registration: RegistrationMode::Portal,
            participation: ParticipationMode::Individual,
            submit_for_review: submit,
            content: vec![ContentBlock::Title {
                text: "Upute".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn test_submit_then_only_admin_approves() {
        let backend = memory_backend();
        let creator = user("x@y.com");
        let created = CompetitionService::create(&backend, &creator, proposal(false))
            .await
            .unwrap();
        assert_eq!(created.status, PublicationStatus::Draft);
        assert_eq!(created.category, Category::Informatika);

        let pending = CompetitionService::submit_for_review(&backend, &creator, &created.id)
            .await
            .unwrap();
        assert_eq!(pending.status, PublicationStatus::Pending);
        assert_eq!(pending.sent.unwrap().by, "x@y.com");

        let err = CompetitionService::approve(&backend, &user("z@y.com"), &created.id)
            .await
            .unwrap_err();
        assert!(err.is_authorization());
        let err = CompetitionService::approve(&backend, &creator, &created.id)
            .await
            .unwrap_err();
        assert!(err.is_authorization());

        let stored = CompetitionService::load(&backend, &created.id).await.unwrap();
        assert_eq!(stored.status, PublicationStatus::Pending);

        let published = CompetitionService::approve(&backend, &admin("admin@skola.hr"), &created.id)
            .await
            .unwrap();
        assert_eq!(published.status, PublicationStatus::Published);
        assert!(published.accepts_applications);
    }

    #[tokio::test]
    async fn test_phases_are_monotonic() {
        let backend = memory_backend();
        let creator = user("x@y.com");
        let admin = admin("admin@skola.hr");
        let created = CompetitionService::create(&backend, &creator, proposal(true))
            .await
            .unwrap();

        // not published yet
        assert!(CompetitionService::start(&backend, &creator, &created.id)
            .await
            .is_err());
        CompetitionService::approve(&backend, &admin, &created.id)
            .await
            .unwrap();

        assert!(CompetitionService::end(&backend, &creator, &created.id)
            .await
            .is_err());
        let active = CompetitionService::start(&backend, &creator, &created.id)
            .await
            .unwrap();
        assert_eq!(active.phase, Phase::Aktivan);
        assert!(!active.accepts_applications);

        assert!(CompetitionService::start(&backend, &admin, &created.id)
            .await
            .is_err());
        let finished = CompetitionService::end(&backend, &admin, &created.id)
            .await
            .unwrap();
        assert_eq!(finished.phase, Phase::Zavrsio);
        assert_eq!(finished.ended.unwrap().by, "admin@skola.hr");
    }

    #[tokio::test]
    async fn test_reject_records_reason() {
        let backend = memory_backend();
        let created = CompetitionService::create(&backend, &user("x@y.com"), proposal(true))
            .await
            .unwrap();

        let rejected = CompetitionService::reject(
            &backend,
            &admin("admin@skola.hr"),
            &created.id,
            RejectCompetitionRequest {
                reason: Some("nedostaje datum".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(rejected.status, PublicationStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("nedostaje datum"));
    }

    #[tokio::test]
    async fn test_visibility_of_unpublished_competitions() {
        let backend = memory_backend();
        let creator = user("x@y.com");
        let created = CompetitionService::create(&backend, &creator, proposal(false))
            .await
            .unwrap();

        assert!(CompetitionService::get(&backend, Some(&creator), &created.id)
            .await
            .is_ok());
        assert!(CompetitionService::get(&backend, Some(&admin("a@skola.hr")), &created.id)
            .await
            .is_ok());
        assert!(matches!(
            CompetitionService::get(&backend, None, &created.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            CompetitionService::get(&backend, Some(&user("z@y.com")), &created.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_listings() {
        let backend = memory_backend();
        let creator = user("x@y.com");
        let admin = admin("admin@skola.hr");
        let draft = CompetitionService::create(&backend, &creator, proposal(false))
            .await
            .unwrap();
        let sent = CompetitionService::create(&backend, &creator, proposal(true))
            .await
            .unwrap();

        let mine = CompetitionService::list(&backend, Some(&creator), ListScope::Mine)
            .await
            .unwrap();
        assert_eq!(mine.len(), 2);

        let pending = CompetitionService::list(&backend, Some(&admin), ListScope::Pending)
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, sent.id);
        assert!(CompetitionService::list(&backend, Some(&creator), ListScope::Pending)
            .await
            .is_err());

        assert!(CompetitionService::list(&backend, None, ListScope::Published)
            .await
            .unwrap()
            .is_empty());
        CompetitionService::approve(&backend, &admin, &sent.id)
            .await
            .unwrap();
        let public = CompetitionService::list(&backend, None, ListScope::Published)
            .await
            .unwrap();
        assert_eq!(public.len(), 1);
        assert_ne!(public[0].id, draft.id);
    }

    #[tokio::test]
    async fn test_creator_deletes_only_before_publication() {
        let backend = memory_backend();
        let creator = user("x@y.com");
        let admin = admin("admin@skola.hr");
        let draft = CompetitionService::create(&backend, &creator, proposal(false))
            .await
            .unwrap();
        let published = CompetitionService::create(&backend, &creator, proposal(true))
            .await
            .unwrap();
        CompetitionService::approve(&backend, &admin, &published.id)
            .await
            .unwrap();

        assert!(CompetitionService::delete(&backend, &creator, &draft.id)
            .await
            .is_ok());
        assert!(CompetitionService::delete(&backend, &creator, &published.id)
            .await
            .unwrap_err()
            .is_authorization());
        assert!(CompetitionService::delete(&backend, &admin, &published.id)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_mode_validation() {
        let backend = memory_backend();
        let creator = user("x@y.com");

        let mut external = proposal(false);
        external.registration = RegistrationMode::External {
            link: "ftp://nekamo".to_string(),
        };
        assert!(matches!(
            CompetitionService::create(&backend, &creator, external).await,
            Err(AppError::Validation(_))
        ));

        let mut team = proposal(false);
        team.participation = ParticipationMode::Team(TeamBounds {
            min_members: Some(4),
            max_members: Some(2),
        });
        assert!(matches!(
            CompetitionService::create(&backend, &creator, team).await,
            Err(AppError::Validation(_))
        ));

        let mut huge = proposal(false);
        huge.participation = ParticipationMode::Team(TeamBounds {
            min_members: Some(2),
            max_members: Some(u32::MAX),
        });
        assert!(matches!(
            CompetitionService::create(&backend, &creator, huge).await,
            Err(AppError::Validation(_))
        ));
        assert!(backend
            .repos
            .competitions
            .list_by_creator_email(&creator.email)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_update_by_creator_or_admin() {
        let backend = memory_backend();
        let creator = user("x@y.com");
        let created = CompetitionService::create(&backend, &creator, proposal(false))
            .await
            .unwrap();

        let changes = || UpdateCompetitionRequest {
            name: Some("Novo ime".to_string()),
            date: None,
            category: Some("robotika".to_string()),
            description: None,
            registration: None,
            participation: None,
        };

        assert!(CompetitionService::update(&backend, &user("z@y.com"), &created.id, changes())
            .await
            .unwrap_err()
            .is_authorization());
        let updated = CompetitionService::update(&backend, &creator, &created.id, changes())
            .await
            .unwrap();
        assert_eq!(updated.name, "Novo ime");
        assert_eq!(updated.category, Category::Other("robotika".to_string()));
        assert_eq!(updated.version, created.version + 1);
    }

    #[tokio::test]
    async fn test_visibility_toggle() {
        let backend = memory_backend();
        let creator = user("x@y.com");
        let created = CompetitionService::create(&backend, &creator, proposal(false))
            .await
            .unwrap();

        let shown = CompetitionService::set_applicants_visible(&backend, &creator, &created.id, true)
            .await
            .unwrap();
        assert!(shown.applicants_visible);
        assert!(
            CompetitionService::set_applicants_visible(&backend, &user("z@y.com"), &created.id, false)
                .await
                .is_err()
        );
    }
}
