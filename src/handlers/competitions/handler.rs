//! Competition handler implementations

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    middleware::auth::{AuthenticatedUser, OptionalAuth},
    services::{CompetitionService, ContentService},
    state::AppState,
    workflow::content::ContentEdit,
};

use super::{
    request::{
        CreateCompetitionRequest, ListCompetitionsQuery, RejectCompetitionRequest,
        UpdateCompetitionRequest, VisibilityRequest,
    },
    response::{ApplicantOption, CompetitionResponse, CompetitionSummary, DeletedResponse},
};

/// List competitions: published (public), mine, or pending review (admin)
pub async fn list_competitions(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Query(query): Query<ListCompetitionsQuery>,
) -> AppResult<Json<Vec<CompetitionSummary>>> {
    let competitions = CompetitionService::list(state.backend(), auth.actor(), query.scope).await?;
    Ok(Json(competitions))
}

pub async fn create_competition(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<CreateCompetitionRequest>,
) -> AppResult<(StatusCode, Json<CompetitionResponse>)> {
    payload.validate()?;

    let competition = CompetitionService::create(state.backend(), &actor, payload).await?;
    Ok((StatusCode::CREATED, Json(competition)))
}

pub async fn get_competition(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CompetitionResponse>> {
    let competition = CompetitionService::get(state.backend(), auth.actor(), &id).await?;
    Ok(Json(competition))
}

pub async fn update_competition(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCompetitionRequest>,
) -> AppResult<Json<CompetitionResponse>> {
    payload.validate()?;

    let competition = CompetitionService::update(state.backend(), &actor, &id, payload).await?;
    Ok(Json(competition))
}

pub async fn delete_competition(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeletedResponse>> {
    let deleted = CompetitionService::delete(state.backend(), &actor, &id).await?;
    Ok(Json(deleted))
}

/// Send a draft to admin review
pub async fn submit_competition(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CompetitionResponse>> {
    let competition = CompetitionService::submit_for_review(state.backend(), &actor, &id).await?;
    Ok(Json(competition))
}

pub async fn approve_competition(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CompetitionResponse>> {
    let competition = CompetitionService::approve(state.backend(), &actor, &id).await?;
    Ok(Json(competition))
}

pub async fn reject_competition(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectCompetitionRequest>,
) -> AppResult<Json<CompetitionResponse>> {
    payload.validate()?;

    let competition = CompetitionService::reject(state.backend(), &actor, &id, payload).await?;
    Ok(Json(competition))
}

pub async fn start_competition(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CompetitionResponse>> {
    let competition = CompetitionService::start(state.backend(), &actor, &id).await?;
    Ok(Json(competition))
}

pub async fn end_competition(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CompetitionResponse>> {
    let competition = CompetitionService::end(state.backend(), &actor, &id).await?;
    Ok(Json(competition))
}

pub async fn set_visibility(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<VisibilityRequest>,
) -> AppResult<Json<CompetitionResponse>> {
    let competition = CompetitionService::set_applicants_visible(
        state.backend(),
        &actor,
        &id,
        payload.applicants_visible,
    )
    .await?;
    Ok(Json(competition))
}

/// Apply one content editor action
pub async fn edit_content(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(edit): Json<ContentEdit>,
) -> AppResult<Json<CompetitionResponse>> {
    let competition = ContentService::edit(state.backend(), &actor, &id, edit).await?;
    Ok(Json(competition))
}

pub async fn applicant_picker(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<ApplicantOption>>> {
    let options = ContentService::picker(state.backend(), &actor, &id).await?;
    Ok(Json(options))
}
