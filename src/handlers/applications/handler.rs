//! Application handler implementations

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    middleware::auth::{AuthenticatedUser, OptionalAuth},
    models::ApplicationStatus,
    services::ApplicationService,
    state::AppState,
};

use super::{
    request::{ListApplicationsQuery, RejectApplicationRequest, SubmitApplicationRequest},
    response::{ApplicationList, ApplicationResponse},
};

/// Apply to a competition; a signed-in user is linked to the application
pub async fn submit_application(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Path(competition_id): Path<Uuid>,
    Json(payload): Json<SubmitApplicationRequest>,
) -> AppResult<(StatusCode, Json<ApplicationResponse>)> {
    let application =
        ApplicationService::submit(state.backend(), auth.actor(), &competition_id, payload).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

pub async fn list_applications(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Path(competition_id): Path<Uuid>,
    Query(query): Query<ListApplicationsQuery>,
) -> AppResult<Json<ApplicationList>> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            ApplicationStatus::parse(s)
                .ok_or_else(|| AppError::InvalidInput(format!("Unknown status '{s}'")))
        })
        .transpose()?;

    let applications =
        ApplicationService::list(state.backend(), auth.actor(), &competition_id, status).await?;
    Ok(Json(applications))
}

pub async fn approve_application(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApplicationResponse>> {
    let application = ApplicationService::approve(state.backend(), &actor, &id).await?;
    Ok(Json(application))
}

pub async fn reject_application(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectApplicationRequest>,
) -> AppResult<Json<ApplicationResponse>> {
    payload.validate()?;

    let application = ApplicationService::reject(state.backend(), &actor, &id, payload).await?;
    Ok(Json(application))
}

pub async fn delete_application(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    ApplicationService::delete(state.backend(), &actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
