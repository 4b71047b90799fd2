//! Authentication middleware
//!
//! [`optional_auth_middleware`] runs for every API request and attaches the
//! acting identity when a valid bearer token is present. Handlers that need
//! a signed-in user take [`AuthenticatedUser`]; the ones open to visitors
//! take [`OptionalAuth`].

use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::{
    error::AppError,
    models::Actor,
    services::{auth_service::bearer_token, AuthService},
    state::AppState,
};

/// Signed-in actor, admin flag resolved for this request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Actor);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// Optional authenticated user wrapper (never fails)
pub struct OptionalAuth(pub Option<Actor>);

impl OptionalAuth {
    pub fn actor(&self) -> Option<&Actor> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(
            parts
                .extensions
                .get::<AuthenticatedUser>()
                .map(|user| user.0.clone()),
        ))
    }
}

/// Attach the actor when the request carries a valid token
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(str::to_owned);

    if let Some(header) = header {
        let path = request.uri().path().to_owned();
        match bearer_token(&header) {
            Ok(token) => match AuthService::resolve(state.backend(), token).await {
                Ok(actor) => {
                    debug!(path = %path, uid = %actor.uid, is_admin = actor.is_admin, "User authenticated");
                    request.extensions_mut().insert(AuthenticatedUser(actor));
                }
                Err(e) => {
                    debug!(path = %path, error = %e, "Token rejected, continuing anonymously");
                }
            },
            Err(_) => {
                debug!(path = %path, "Auth skipped: expected 'Bearer <token>'");
            }
        }
    }

    next.run(request).await
}

/// Refuse requests without a signed-in actor
pub async fn require_auth(request: Request<Body>, next: Next) -> Result<Response, AppError> {
    if request.extensions().get::<AuthenticatedUser>().is_none() {
        debug!(path = %request.uri().path(), "Auth required");
        return Err(AppError::Unauthorized);
    }
    Ok(next.run(request).await)
}
