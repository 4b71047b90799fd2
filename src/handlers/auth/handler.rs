//! Authentication handler implementations

use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    error::AppResult,
    middleware::auth::AuthenticatedUser,
    services::AuthService,
    state::AppState,
};

use super::{
    request::LoginRequest,
    response::{AuthResponse, LogoutResponse, UserResponse},
};

/// Sign in with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    payload.validate()?;

    let auth = AuthService::login(state.backend(), payload).await?;
    Ok(Json(auth))
}

/// Sign out everywhere
pub async fn logout(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> AppResult<Json<LogoutResponse>> {
    AuthService::logout(state.backend(), &actor).await?;
    Ok(Json(LogoutResponse {
        message: "Signed out".to_string(),
    }))
}

/// Current user with the admin flag as of now
pub async fn me(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> AppResult<Json<UserResponse>> {
    let user = AuthService::me(state.backend(), &actor).await?;
    Ok(Json(user))
}
