//! Competition page content service

use std::collections::HashSet;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::{allowed, Backend, CompetitionService};
use crate::{
    error::{AppError, AppResult},
    events::{ChangeEvent, ChangeKind, Collection},
    handlers::competitions::response::{ApplicantOption, CompetitionResponse},
    models::{Actor, ApplicationStatus, ContentBlock},
    workflow::{
        competition as competition_flow,
        content::{self, ContentEdit},
    },
};

pub struct ContentService;

impl ContentService {
    /// Apply one editor action to a competition page
    ///
    /// Applicant cells may keep references that were already on the page;
    /// new ones must name a currently approved application.
    pub async fn edit(
        backend: &Backend,
        actor: &Actor,
        competition_id: &Uuid,
        edit: ContentEdit,
    ) -> AppResult<CompetitionResponse> {
        let competition = CompetitionService::load(backend, competition_id).await?;
        allowed(
            competition_flow::can_edit(actor, &competition),
            "edit_content",
            actor,
        )?;

        let page = content::apply(&competition.content, edit)
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if content::has_applicant_cells(&page) {
            let mut known = Self::approved_ids(backend, competition_id).await?;
            known.extend(referenced(&competition.content));
            content::check_applicant_cells(&page, &known)
                .map_err(|e| AppError::Validation(e.to_string()))?;
        }

        let mut next = competition;
        next.content = page;
        next.updated_at = Utc::now();

        let saved = backend.repos.competitions.update(&next).await?;
        backend.announce(ChangeEvent::new(
            Collection::Competitions,
            saved.id,
            ChangeKind::Updated,
        ));
        info!(
            competition_id = %saved.id,
            actor = %actor.email,
            blocks = saved.content.len(),
            "Competition content edited"
        );

        Ok(saved.into())
    }

    /// Approved applicants offered for applicant columns
    pub async fn picker(
        backend: &Backend,
        actor: &Actor,
        competition_id: &Uuid,
    ) -> AppResult<Vec<ApplicantOption>> {
        let competition = CompetitionService::load(backend, competition_id).await?;
        allowed(
            competition_flow::can_edit(actor, &competition),
            "applicant_picker",
            actor,
        )?;

        let approved = backend
            .repos
            .applications
            .list_by_competition(competition_id, Some(ApplicationStatus::Approved))
            .await?;
        Ok(approved.iter().map(ApplicantOption::from).collect())
    }

    async fn approved_ids(backend: &Backend, competition_id: &Uuid) -> AppResult<HashSet<String>> {
        let approved = backend
            .repos
            .applications
            .list_by_competition(competition_id, Some(ApplicationStatus::Approved))
            .await?;
        Ok(approved.into_iter().map(|a| a.id.to_string()).collect())
    }
}

fn referenced(page: &[ContentBlock]) -> Vec<String> {
    page.iter()
        .filter_map(|block| match block {
            ContentBlock::Table(table) => Some(table.applicant_cells()),
            _ => None,
        })
        .flatten()
        .map(str::to_string)
        .collect()
}
