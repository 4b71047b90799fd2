//! Admin handler implementations

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    middleware::auth::AuthenticatedUser,
    services::AdminService,
    state::AppState,
};

use super::{
    request::GrantAdminRequest,
    response::{AdminGrantResponse, UserListEntry},
};

pub async fn list_admins(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> AppResult<Json<Vec<AdminGrantResponse>>> {
    let grants = AdminService::list_grants(state.backend(), &actor).await?;
    Ok(Json(grants))
}

pub async fn grant_admin(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<GrantAdminRequest>,
) -> AppResult<(StatusCode, Json<AdminGrantResponse>)> {
    payload.validate()?;

    let grant = AdminService::grant(state.backend(), &actor, payload).await?;
    Ok((StatusCode::CREATED, Json(grant)))
}

pub async fn revoke_admin(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(uid): Path<Uuid>,
) -> AppResult<StatusCode> {
    AdminService::revoke(state.backend(), &actor, &uid).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_users(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> AppResult<Json<Vec<UserListEntry>>> {
    let users = AdminService::list_users(state.backend(), &actor).await?;
    Ok(Json(users))
}
