//! Admin registry service

use std::collections::HashSet;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::{allowed, require_admin, Backend};
use crate::{
    constants::ADMIN_ROLE,
    error::{AppError, AppResult},
    events::{ChangeEvent, ChangeKind, Collection},
    handlers::admin::{
        request::GrantAdminRequest,
        response::{AdminGrantResponse, UserListEntry},
    },
    models::{Actor, AdminGrant, User},
    utils::validation::normalize_email,
    workflow::admin as flow,
};

/// Admin service for business logic
pub struct AdminService;

impl AdminService {
    pub async fn list_grants(backend: &Backend, actor: &Actor) -> AppResult<Vec<AdminGrantResponse>> {
        require_admin(actor, "list_admins")?;

        let grants = backend.repos.admins.list().await?;
        let mut out = Vec::with_capacity(grants.len());
        for grant in grants {
            let user = backend.repos.users.find_by_uid(&grant.uid).await?;
            out.push(AdminGrantResponse::new(grant, user.as_ref()));
        }
        Ok(out)
    }

    /// Grant admin rights to a known user, addressed by uid or email
    pub async fn grant(
        backend: &Backend,
        actor: &Actor,
        payload: GrantAdminRequest,
    ) -> AppResult<AdminGrantResponse> {
        require_admin(actor, "grant_admin")?;
        let user = Self::target(backend, &payload).await?;
        allowed(flow::can_grant(actor, &user.uid), "grant_admin", actor)?;

        let grant = backend
            .repos
            .admins
            .grant(AdminGrant {
                uid: user.uid,
                role: ADMIN_ROLE.to_string(),
                granted_by: actor.email.clone(),
                granted_at: Utc::now(),
            })
            .await?;

        backend.announce(ChangeEvent::new(
            Collection::AdminGrants,
            grant.uid,
            ChangeKind::Created,
        ));
        info!(uid = %grant.uid, actor = %actor.email, "Admin granted");

        Ok(AdminGrantResponse::new(grant, Some(&user)))
    }

    /// Remove a grant; nobody revokes their own
    pub async fn revoke(backend: &Backend, actor: &Actor, uid: &Uuid) -> AppResult<()> {
        allowed(flow::can_revoke(actor, uid), "revoke_admin", actor)?;

        if !backend.repos.admins.revoke(uid).await? {
            return Err(AppError::NotFound("Admin grant not found".to_string()));
        }
        backend.announce(ChangeEvent::new(
            Collection::AdminGrants,
            *uid,
            ChangeKind::Deleted,
        ));
        info!(uid = %uid, actor = %actor.email, "Admin revoked");

        Ok(())
    }

    pub async fn list_users(backend: &Backend, actor: &Actor) -> AppResult<Vec<UserListEntry>> {
        require_admin(actor, "list_users")?;

        let admins: HashSet<Uuid> = backend
            .repos
            .admins
            .list()
            .await?
            .into_iter()
            .map(|g| g.uid)
            .collect();
        let users = backend.repos.users.list().await?;

        Ok(users
            .into_iter()
            .map(|u| UserListEntry {
                is_admin: admins.contains(&u.uid),
                uid: u.uid,
                email: u.email,
                display_name: u.display_name,
                created_at: u.created_at,
            })
            .collect())
    }

    async fn target(backend: &Backend, payload: &GrantAdminRequest) -> AppResult<User> {
        let user = match (&payload.uid, &payload.email) {
            (Some(uid), _) => backend.repos.users.find_by_uid(uid).await?,
            (None, Some(email)) => {
                backend
                    .repos
                    .users
                    .find_by_email(&normalize_email(email))
                    .await?
            }
            (None, None) => {
                return Err(AppError::Validation("uid or email is required".to_string()));
            }
        };
        user.ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}
