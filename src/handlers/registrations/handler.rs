//! Registration request handler implementations

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    middleware::auth::AuthenticatedUser,
    models::RegistrationStatus,
    services::RegistrationService,
    state::AppState,
};

use super::{
    request::{
        ApproveRegistrationRequest, ListRegistrationsQuery, RejectRegistrationRequest,
        SubmitRegistrationRequest,
    },
    response::{ApprovalResponse, RegistrationResponse, SubmittedResponse},
};

/// Submit an account request (public)
pub async fn submit_registration(
    State(state): State<AppState>,
    Json(payload): Json<SubmitRegistrationRequest>,
) -> AppResult<(StatusCode, Json<SubmittedResponse>)> {
    payload.validate()?;

    let submitted = RegistrationService::submit(state.backend(), payload).await?;
    Ok((StatusCode::CREATED, Json(submitted)))
}

/// List requests, newest first (admin)
pub async fn list_registrations(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Query(query): Query<ListRegistrationsQuery>,
) -> AppResult<Json<Vec<RegistrationResponse>>> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            RegistrationStatus::parse(s)
                .ok_or_else(|| AppError::InvalidInput(format!("Unknown status '{s}'")))
        })
        .transpose()?;

    let requests = RegistrationService::list(state.backend(), &actor, status).await?;
    Ok(Json(requests))
}

pub async fn get_registration(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RegistrationResponse>> {
    let request = RegistrationService::get(state.backend(), &actor, &id).await?;
    Ok(Json(request))
}

/// Approve a pending request and create the account
pub async fn approve_registration(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApproveRegistrationRequest>,
) -> AppResult<Json<ApprovalResponse>> {
    payload.validate()?;

    let approval = RegistrationService::approve(state.backend(), &actor, &id, payload).await?;
    Ok(Json(approval))
}

pub async fn reject_registration(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectRegistrationRequest>,
) -> AppResult<Json<RegistrationResponse>> {
    payload.validate()?;

    let request = RegistrationService::reject(state.backend(), &actor, &id, payload).await?;
    Ok(Json(request))
}

pub async fn delete_registration(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    RegistrationService::delete(state.backend(), &actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
