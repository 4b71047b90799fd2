//! Competition application service

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::{allowed, competition_service::is_visible, Backend, CompetitionService};
use crate::{
    error::{AppError, AppResult},
    events::{ChangeEvent, ChangeKind, Collection},
    handlers::applications::{
        request::{RejectApplicationRequest, SubmitApplicationRequest},
        response::{ApplicationList, ApplicationResponse},
    },
    models::{
        Actor, Applicant, Application, ApplicationStatus, GroupApplicant, GroupMember,
        IndividualApplicant, NewApplication, PublicationStatus,
    },
    utils::validation::{normalize_email, sanitize_optional, sanitize_string},
    workflow::application as flow,
};

/// Application service for business logic
pub struct ApplicationService;

impl ApplicationService {
    /// File an application; visitors without a session may apply too
    ///
    /// Phase, status and registration mode are checked before anything is
    /// written, so a refused submission leaves no document behind.
    pub async fn submit(
        backend: &Backend,
        actor: Option<&Actor>,
        competition_id: &Uuid,
        payload: SubmitApplicationRequest,
    ) -> AppResult<ApplicationResponse> {
        let competition = CompetitionService::load(backend, competition_id).await?;
        if !is_visible(actor, &competition) {
            return Err(AppError::NotFound("Competition not found".to_string()));
        }

        let anonymous = Actor::anonymous();
        let acting = actor.unwrap_or(&anonymous);
        allowed(
            flow::can_submit(acting, &competition),
            "submit_application",
            acting,
        )?;

        let applicant = sanitize_applicant(payload.applicant);
        flow::validate_applicant(&competition.participation, &applicant)
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let application = backend
            .repos
            .applications
            .create(NewApplication {
                competition_id: competition.id,
                applicant,
                user_id: actor.map(|a| a.uid),
            })
            .await?;

        announce(backend, &application, ChangeKind::Created);
        info!(
            application_id = %application.id,
            competition_id = %competition.id,
            kind = application.applicant.kind().as_str(),
            "Application submitted"
        );

        Ok(application.into())
    }

    /// Creator and admins see every application; the public sees approved
    /// applicants only when the competition shows its list
    pub async fn list(
        backend: &Backend,
        actor: Option<&Actor>,
        competition_id: &Uuid,
        status: Option<ApplicationStatus>,
    ) -> AppResult<ApplicationList> {
        let competition = CompetitionService::load(backend, competition_id).await?;

        let reviewer = actor.is_some_and(|a| flow::can_review(a, &competition).is_ok());
        if reviewer {
            let applications = backend
                .repos
                .applications
                .list_by_competition(competition_id, status)
                .await?;
            return Ok(ApplicationList::Full(
                applications.into_iter().map(Into::into).collect(),
            ));
        }

        if !is_visible(actor, &competition) {
            return Err(AppError::NotFound("Competition not found".to_string()));
        }
        if competition.status != PublicationStatus::Published || !competition.applicants_visible {
            return Err(AppError::Forbidden(
                "The applicant list of this competition is not public".to_string(),
            ));
        }

        let approved = backend
            .repos
            .applications
            .list_by_competition(competition_id, Some(ApplicationStatus::Approved))
            .await?;
        Ok(ApplicationList::Public(
            approved.into_iter().map(Into::into).collect(),
        ))
    }

    pub async fn approve(
        backend: &Backend,
        actor: &Actor,
        id: &Uuid,
    ) -> AppResult<ApplicationResponse> {
        let application = Self::load(backend, id).await?;
        let competition = CompetitionService::load(backend, &application.competition_id).await?;
        let next = allowed(
            flow::approve(actor, &application, &competition, Utc::now()),
            "approve_application",
            actor,
        )?;
        Self::save(backend, actor, next).await
    }

    pub async fn reject(
        backend: &Backend,
        actor: &Actor,
        id: &Uuid,
        payload: RejectApplicationRequest,
    ) -> AppResult<ApplicationResponse> {
        let application = Self::load(backend, id).await?;
        let competition = CompetitionService::load(backend, &application.competition_id).await?;
        let next = allowed(
            flow::reject(
                actor,
                &application,
                &competition,
                sanitize_optional(payload.reason.as_deref()),
                Utc::now(),
            ),
            "reject_application",
            actor,
        )?;
        Self::save(backend, actor, next).await
    }

    pub async fn delete(backend: &Backend, actor: &Actor, id: &Uuid) -> AppResult<()> {
        let application = Self::load(backend, id).await?;
        let competition = CompetitionService::load(backend, &application.competition_id).await?;
        allowed(
            flow::can_review(actor, &competition),
            "delete_application",
            actor,
        )?;

        if !backend.repos.applications.delete(id).await? {
            return Err(AppError::NotFound("Application not found".to_string()));
        }
        announce(backend, &application, ChangeKind::Deleted);
        info!(
            application_id = %id,
            competition_id = %competition.id,
            actor = %actor.email,
            "Application deleted"
        );

        Ok(())
    }

    async fn load(backend: &Backend, id: &Uuid) -> AppResult<Application> {
        backend
            .repos
            .applications
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Application not found".to_string()))
    }

    async fn save(
        backend: &Backend,
        actor: &Actor,
        next: Application,
    ) -> AppResult<ApplicationResponse> {
        let saved = backend.repos.applications.update(&next).await?;
        announce(backend, &saved, ChangeKind::Updated);
        info!(
            application_id = %saved.id,
            competition_id = %saved.competition_id,
            actor = %actor.email,
            status = %saved.status,
            "Application reviewed"
        );
        Ok(saved.into())
    }
}

fn announce(backend: &Backend, application: &Application, kind: ChangeKind) {
    backend.announce(
        ChangeEvent::new(Collection::Applications, application.id, kind)
            .with_parent(application.competition_id),
    );
}

fn sanitize_applicant(applicant: Applicant) -> Applicant {
    match applicant {
        Applicant::Individual(person) => Applicant::Individual(IndividualApplicant {
            name: sanitize_string(&person.name),
            surname: sanitize_string(&person.surname),
            email: normalize_email(&person.email),
            class_name: sanitize_string(&person.class_name),
            contact: sanitize_optional(person.contact.as_deref()),
            notes: sanitize_optional(person.notes.as_deref()),
        }),
        Applicant::Group(group) => Applicant::Group(GroupApplicant {
            group_name: sanitize_string(&group.group_name),
            members: group
                .members
                .into_iter()
                .map(|m| GroupMember {
                    name: sanitize_string(&m.name),
                    surname: sanitize_string(&m.surname),
                    class_name: sanitize_string(&m.class_name),
                })
                .collect(),
        }),
    }
}
