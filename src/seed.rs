//! Startup seeding

use chrono::Utc;
use tracing::info;

use crate::{
    config::BootstrapAdmin,
    constants::ADMIN_ROLE,
    error::AppResult,
    events::{ChangeEvent, ChangeKind, Collection},
    identity::Secret,
    models::AdminGrant,
    services::Backend,
    utils::validation::normalize_email,
};

/// Make sure the configured first administrator can sign in and holds the
/// admin role. Safe to run on every start.
pub async fn bootstrap_admin(backend: &Backend, admin: &BootstrapAdmin) -> AppResult<()> {
    let email = normalize_email(&admin.email);

    let identity = match backend.identity.find_by_email(&email).await? {
        Some(identity) => identity,
        None => {
            let identity = backend
                .identity
                .create_credential(&email, Secret::Password(admin.password.clone()))
                .await?;
            info!(uid = %identity.uid, email = %email, "Bootstrap admin credential created");
            identity
        }
    };

    let (user, created) = backend
        .repos
        .users
        .ensure(&identity.uid, &identity.email, None)
        .await?;
    if created {
        backend.announce(ChangeEvent::new(Collection::Users, user.uid, ChangeKind::Created));
    }

    if backend.repos.admins.is_admin(&identity.uid).await? {
        return Ok(());
    }

    backend
        .repos
        .admins
        .grant(AdminGrant {
            uid: identity.uid,
            role: ADMIN_ROLE.to_string(),
            granted_by: "bootstrap".to_string(),
            granted_at: Utc::now(),
        })
        .await?;
    backend.announce(ChangeEvent::new(
        Collection::AdminGrants,
        identity.uid,
        ChangeKind::Created,
    ));
    info!(uid = %identity.uid, "Bootstrap admin granted");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::memory_backend;

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let backend = memory_backend();
        let admin = BootstrapAdmin {
            email: "Ravnatelj@Skola.hr".to_string(),
            password: "pocetna-lozinka".to_string(),
        };

        tokio_test::assert_ok!(bootstrap_admin(&backend, &admin).await);
        tokio_test::assert_ok!(bootstrap_admin(&backend, &admin).await);

        let grants = backend.repos.admins.list().await.unwrap();
        assert_eq!(grants.len(), 1);
        assert_eq!(backend.repos.users.list().await.unwrap().len(), 1);

        let session = backend
            .identity
            .sign_in("ravnatelj@skola.hr", "pocetna-lozinka")
            .await
            .unwrap();
        assert_eq!(session.identity.uid, grants[0].uid);
    }
}
