//! Authentication service

use tracing::{debug, info};

use super::Backend;
use crate::{
    error::{AppError, AppResult},
    events::{ChangeEvent, ChangeKind, Collection},
    handlers::auth::{
        request::LoginRequest,
        response::{AuthResponse, UserResponse},
    },
    models::{Actor, User},
    utils::validation::normalize_email,
};

/// Authentication service
pub struct AuthService;

impl AuthService {
    /// Sign in, creating the user profile on first sign-in
    pub async fn login(backend: &Backend, payload: LoginRequest) -> AppResult<AuthResponse> {
        let email = normalize_email(&payload.email);
        let session = backend.identity.sign_in(&email, &payload.password).await?;

        let user = Self::sync_profile(backend, &session.identity.uid, &session.identity.email).await?;
        let is_admin = backend.repos.admins.is_admin(&user.uid).await?;

        info!(uid = %user.uid, is_admin, "User signed in");

        Ok(AuthResponse {
            access_token: session.token,
            token_type: "Bearer".to_string(),
            expires_in: session.expires_in,
            user: UserResponse::new(user, is_admin),
        })
    }

    /// Revoke every token issued to the actor so far
    pub async fn logout(backend: &Backend, actor: &Actor) -> AppResult<()> {
        backend.identity.sign_out(&actor.uid).await?;
        info!(uid = %actor.uid, "User signed out");
        Ok(())
    }

    pub async fn me(backend: &Backend, actor: &Actor) -> AppResult<UserResponse> {
        let user = Self::sync_profile(backend, &actor.uid, &actor.email).await?;
        Ok(UserResponse::new(user, actor.is_admin))
    }

    /// Resolve a bearer token to the acting identity; the admin flag is read
    /// from the registry on every call
    pub async fn resolve(backend: &Backend, token: &str) -> AppResult<Actor> {
        let identity = backend.identity.verify(token).await?;
        let is_admin = backend.repos.admins.is_admin(&identity.uid).await?;
        debug!(uid = %identity.uid, is_admin, "Token resolved");
        Ok(Actor::new(identity.uid, identity.email, is_admin))
    }

    async fn sync_profile(backend: &Backend, uid: &uuid::Uuid, email: &str) -> AppResult<User> {
        let (user, created) = backend.repos.users.ensure(uid, email, None).await?;
        if created {
            backend.announce(ChangeEvent::new(Collection::Users, user.uid, ChangeKind::Created));
            info!(uid = %user.uid, "User profile created on first sign-in");
        }
        Ok(user)
    }
}

/// Strip the `Bearer ` prefix from an Authorization header value
pub fn bearer_token(header: &str) -> AppResult<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized)
}
