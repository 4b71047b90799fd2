//! Registration request service

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::{allowed, require_admin, Backend};
use crate::{
    constants::TEMPORARY_PASSWORD_LENGTH,
    error::{AppError, AppResult},
    events::{ChangeEvent, ChangeKind, Collection},
    handlers::registrations::{
        request::{ApproveRegistrationRequest, RejectRegistrationRequest, SubmitRegistrationRequest},
        response::{ApprovalResponse, RegistrationResponse, SubmittedResponse},
    },
    identity::Secret,
    models::{Actor, NewRegistrationRequest, RegistrationRequest, RegistrationStatus},
    utils::{
        crypto::{generate_secure_token, hash_password},
        validation::{normalize_email, sanitize_optional, sanitize_string},
    },
    workflow::registration as flow,
};

/// Registration request service
pub struct RegistrationService;

impl RegistrationService {
    /// File a public account request; the password is hashed before anything is stored
    pub async fn submit(
        backend: &Backend,
        payload: SubmitRegistrationRequest,
    ) -> AppResult<SubmittedResponse> {
        let email = normalize_email(&payload.email);

        if backend.identity.find_by_email(&email).await?.is_some() {
            return Err(AppError::AlreadyExists(
                "An account with this email already exists".to_string(),
            ));
        }
        if backend
            .repos
            .registrations
            .find_pending_by_email(&email)
            .await?
            .is_some()
        {
            return Err(AppError::AlreadyExists(
                "A request for this email is already waiting for review".to_string(),
            ));
        }

        let first_name = sanitize_string(&payload.first_name);
        let last_name = sanitize_string(&payload.last_name);
        let class_grade = sanitize_string(&payload.class_grade);
        if first_name.is_empty() || last_name.is_empty() || class_grade.is_empty() {
            return Err(AppError::Validation(
                "first name, last name and class are required".to_string(),
            ));
        }

        let request = backend
            .repos
            .registrations
            .create(NewRegistrationRequest {
                email,
                password_hash: hash_password(&payload.password)?,
                first_name,
                last_name,
                class_grade,
                reason: sanitize_optional(payload.reason.as_deref()),
            })
            .await
            .map_err(|e| match e {
                // lost a race with another submission for the same email
                AppError::AlreadyExists(_) => AppError::AlreadyExists(
                    "A request for this email is already waiting for review".to_string(),
                ),
                other => other,
            })?;

        backend.announce(ChangeEvent::new(
            Collection::RegistrationRequests,
            request.id,
            ChangeKind::Created,
        ));
        info!(request_id = %request.id, "Registration request submitted");

        Ok(SubmittedResponse {
            id: request.id,
            status: request.status,
            message: "Your request was received and will be reviewed by an administrator"
                .to_string(),
        })
    }

    /// Newest first, optionally filtered by status
    pub async fn list(
        backend: &Backend,
        actor: &Actor,
        status: Option<RegistrationStatus>,
    ) -> AppResult<Vec<RegistrationResponse>> {
        require_admin(actor, "list_registrations")?;
        let requests = backend.repos.registrations.list(status).await?;
        Ok(requests.into_iter().map(Into::into).collect())
    }

    pub async fn get(backend: &Backend, actor: &Actor, id: &Uuid) -> AppResult<RegistrationResponse> {
        require_admin(actor, "get_registration")?;
        Ok(Self::load(backend, id).await?.into())
    }

    /// Approve a pending request, creating the credential and the user profile
    ///
    /// The request is claimed with a versioned write before the credential is
    /// created, so a concurrent reject or a refused approval leaves no account
    /// behind. If the credential cannot be created the request goes back to
    /// pending. The account uses the password chosen at submission unless a
    /// temporary one is requested.
    pub async fn approve(
        backend: &Backend,
        actor: &Actor,
        id: &Uuid,
        payload: ApproveRegistrationRequest,
    ) -> AppResult<ApprovalResponse> {
        let request = Self::load(backend, id).await?;
        let next = allowed(
            flow::approve(
                actor,
                &request,
                sanitize_optional(payload.admin_note.as_deref()),
                payload.issue_temporary_password,
                Utc::now(),
            ),
            "approve_registration",
            actor,
        )?;

        let temporary_password = payload
            .issue_temporary_password
            .then(|| generate_secure_token(TEMPORARY_PASSWORD_LENGTH));
        let secret = match &temporary_password {
            Some(password) => Secret::Password(password.clone()),
            None => Secret::Hash(request.password_hash.clone()),
        };

        let saved = backend.repos.registrations.update(&next).await?;

        let credential = backend
            .identity
            .create_credential(&request.email, secret)
            .await;
        let identity = match credential {
            Ok(identity) => identity,
            Err(err) => {
                Self::release(backend, request, saved.version).await;
                return Err(err);
            }
        };

        let (_, created) = backend
            .repos
            .users
            .ensure(&identity.uid, &identity.email, Some(&request.full_name()))
            .await?;
        if created {
            backend.announce(ChangeEvent::new(
                Collection::Users,
                identity.uid,
                ChangeKind::Created,
            ));
        }

        backend.announce(ChangeEvent::new(
            Collection::RegistrationRequests,
            saved.id,
            ChangeKind::Updated,
        ));

        info!(
            request_id = %saved.id,
            uid = %identity.uid,
            actor = %actor.email,
            temporary_password = saved.temporary_password_issued,
            "Registration request approved"
        );

        Ok(ApprovalResponse {
            request: saved.into(),
            uid: identity.uid,
            temporary_password,
        })
    }

    pub async fn reject(
        backend: &Backend,
        actor: &Actor,
        id: &Uuid,
        payload: RejectRegistrationRequest,
    ) -> AppResult<RegistrationResponse> {
        let request = Self::load(backend, id).await?;
        let next = allowed(
            flow::reject(
                actor,
                &request,
                sanitize_optional(payload.reason.as_deref()),
                sanitize_optional(payload.admin_note.as_deref()),
                Utc::now(),
            ),
            "reject_registration",
            actor,
        )?;

        let saved = backend.repos.registrations.update(&next).await?;
        backend.announce(ChangeEvent::new(
            Collection::RegistrationRequests,
            saved.id,
            ChangeKind::Updated,
        ));
        info!(request_id = %saved.id, actor = %actor.email, "Registration request rejected");

        Ok(saved.into())
    }

    /// Permanently remove a request in any status
    pub async fn delete(backend: &Backend, actor: &Actor, id: &Uuid) -> AppResult<()> {
        let request = Self::load(backend, id).await?;
        allowed(flow::can_delete(actor, &request), "delete_registration", actor)?;

        if !backend.repos.registrations.delete(id).await? {
            return Err(AppError::NotFound("Registration request not found".to_string()));
        }
        backend.announce(ChangeEvent::new(
            Collection::RegistrationRequests,
            *id,
            ChangeKind::Deleted,
        ));
        info!(request_id = %id, actor = %actor.email, "Registration request deleted");

        Ok(())
    }

    /// Put a claimed request back to its pending form
    async fn release(backend: &Backend, pending: RegistrationRequest, version: i64) {
        let restored = RegistrationRequest { version, ..pending };
        if let Err(err) = backend.repos.registrations.update(&restored).await {
            warn!(
                request_id = %restored.id,
                error = %err,
                "Failed to return a claimed registration request to pending"
            );
        }
    }

    async fn load(backend: &Backend, id: &Uuid) -> AppResult<RegistrationRequest> {
        backend
            .repos
            .registrations
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Registration request not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    use async_trait::async_trait;

    use super::*;
    use crate::db::{
        memory::MemoryRegistrationRepository, repositories::RegistrationRepository, Repositories,
    };
    use crate::identity::MockIdentityProvider;
    use crate::test_utils::{admin, memory_backend, user};

    /// Rejects the request right after handing out the pending copy
    #[derive(Default)]
    struct RejectedAfterRead {
        inner: MemoryRegistrationRepository,
        armed: AtomicBool,
    }

    #[async_trait]
    impl RegistrationRepository for RejectedAfterRead {
        async fn create(&self, new: NewRegistrationRequest) -> AppResult<RegistrationRequest> {
            self.inner.create(new).await
        }

        async fn find_by_id(&self, id: &Uuid) -> AppResult<Option<RegistrationRequest>> {
            let found = self.inner.find_by_id(id).await?;
            if let Some(request) = &found {
                if self.armed.swap(false, Ordering::SeqCst) {
                    let rejected = RegistrationRequest {
                        status: RegistrationStatus::Rejected,
                        ..request.clone()
                    };
                    self.inner.update(&rejected).await?;
                }
            }
            Ok(found)
        }

        async fn find_pending_by_email(
            &self,
            email: &str,
        ) -> AppResult<Option<RegistrationRequest>> {
            self.inner.find_pending_by_email(email).await
        }

        async fn list(
            &self,
            status: Option<RegistrationStatus>,
        ) -> AppResult<Vec<RegistrationRequest>> {
            self.inner.list(status).await
        }

        async fn update(&self, request: &RegistrationRequest) -> AppResult<RegistrationRequest> {
            self.inner.update(request).await
        }

        async fn delete(&self, id: &Uuid) -> AppResult<bool> {
            self.inner.delete(id).await
        }
    }

    fn submission(email: &str) -> SubmitRegistrationRequest {
        SubmitRegistrationRequest {
            email: email.to_string(),
            password: "lozinka123".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Horvat".to_string(),
            class_grade: "3.b".to_string(),
            reason: Some("  Mentorica  ".to_string()),
        }
    }

    #[tokio::test]
    async fn test_approve_creates_account_with_submitted_password() {
        let backend = memory_backend();
        let admin = admin("admin@skola.hr");
        let submitted = RegistrationService::submit(&backend, submission("A@B.com"))
            .await
            .unwrap();

        let approval = RegistrationService::approve(
            &backend,
            &admin,
            &submitted.id,
            ApproveRegistrationRequest::default(),
        )
        .await
        .unwrap();

        assert_eq!(approval.request.status, RegistrationStatus::Approved);
        assert_eq!(approval.request.email, "a@b.com");
        assert!(approval.temporary_password.is_none());
        assert!(backend.repos.users.find_by_email("a@b.com").await.unwrap().is_some());
        assert!(backend.identity.sign_in("a@b.com", "lozinka123").await.is_ok());
    }

    #[tokio::test]
    async fn test_temporary_password_replaces_submitted_one() {
        let backend = memory_backend();
        let submitted = RegistrationService::submit(&backend, submission("a@b.com"))
            .await
            .unwrap();

        let approval = RegistrationService::approve(
            &backend,
            &admin("admin@skola.hr"),
            &submitted.id,
            ApproveRegistrationRequest {
                issue_temporary_password: true,
                admin_note: Some("javiti se u tajništvo".to_string()),
            },
        )
        .await
        .unwrap();

        let temporary = approval.temporary_password.unwrap();
        assert!(approval.request.temporary_password_issued);
        assert_eq!(
            approval.request.admin_note.as_deref(),
            Some("javiti se u tajništvo")
        );
        assert!(backend.identity.sign_in("a@b.com", &temporary).await.is_ok());
        assert!(backend.identity.sign_in("a@b.com", "lozinka123").await.is_err());
    }

    #[tokio::test]
    async fn test_non_admin_cannot_approve_and_nothing_changes() {
        let backend = memory_backend();
        let submitted = RegistrationService::submit(&backend, submission("a@b.com"))
            .await
            .unwrap();

        let err = RegistrationService::approve(
            &backend,
            &user("x@y.com"),
            &submitted.id,
            ApproveRegistrationRequest::default(),
        )
        .await
        .unwrap_err();

        assert!(err.is_authorization());
        let stored = backend
            .repos
            .registrations
            .find_by_id(&submitted.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, RegistrationStatus::Pending);
        assert!(backend.identity.find_by_email("a@b.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_decided_request_cannot_be_decided_again() {
        let backend = memory_backend();
        let admin = admin("admin@skola.hr");
        let submitted = RegistrationService::submit(&backend, submission("a@b.com"))
            .await
            .unwrap();
        RegistrationService::reject(
            &backend,
            &admin,
            &submitted.id,
            RejectRegistrationRequest {
                reason: Some("nije učenik škole".to_string()),
                admin_note: None,
            },
        )
        .await
        .unwrap();

        let err = RegistrationService::approve(
            &backend,
            &admin,
            &submitted.id,
            ApproveRegistrationRequest::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));

        let stored = RegistrationService::get(&backend, &admin, &submitted.id)
            .await
            .unwrap();
        assert_eq!(stored.status, RegistrationStatus::Rejected);
        assert_eq!(stored.rejection_reason.as_deref(), Some("nije učenik škole"));
    }

    #[tokio::test]
    async fn test_duplicate_submissions_are_refused() {
        let backend = memory_backend();
        RegistrationService::submit(&backend, submission("a@b.com"))
            .await
            .unwrap();
        assert!(matches!(
            RegistrationService::submit(&backend, submission("a@b.com")).await,
            Err(AppError::AlreadyExists(_))
        ));

        backend
            .identity
            .create_credential("c@d.com", Secret::Password("lozinka123".into()))
            .await
            .unwrap();
        assert!(matches!(
            RegistrationService::submit(&backend, submission("c@d.com")).await,
            Err(AppError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_existing_credential_fails_approval_and_keeps_request_pending() {
        let mut identity = MockIdentityProvider::new();
        identity.expect_find_by_email().returning(|_| Ok(None));
        identity
            .expect_create_credential()
            .returning(|_, _| Err(AppError::AlreadyExists("taken".to_string())));
        let backend = Backend {
            identity: Arc::new(identity),
            ..memory_backend()
        };
        let submitted = RegistrationService::submit(&backend, submission("a@b.com"))
            .await
            .unwrap();

        let err = RegistrationService::approve(
            &backend,
            &admin("admin@skola.hr"),
            &submitted.id,
            ApproveRegistrationRequest::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::AlreadyExists(_)));
        let stored = backend
            .repos
            .registrations
            .find_by_id(&submitted.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, RegistrationStatus::Pending);
    }

    #[tokio::test]
    async fn test_approval_racing_with_reject_creates_no_account() {
        let registrations = Arc::new(RejectedAfterRead::default());
        let backend = Backend {
            repos: Repositories {
                registrations: registrations.clone(),
                ..Repositories::memory()
            },
            ..memory_backend()
        };
        let submitted = RegistrationService::submit(&backend, submission("a@b.com"))
            .await
            .unwrap();
        registrations.armed.store(true, Ordering::SeqCst);

        let err = RegistrationService::approve(
            &backend,
            &admin("admin@skola.hr"),
            &submitted.id,
            ApproveRegistrationRequest::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert!(backend.identity.find_by_email("a@b.com").await.unwrap().is_none());
        assert!(backend.repos.users.find_by_email("a@b.com").await.unwrap().is_none());
        let stored = backend
            .repos
            .registrations
            .find_by_id(&submitted.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, RegistrationStatus::Rejected);
    }

    #[tokio::test]
    async fn test_unavailable_identity_is_reported() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_find_by_email()
            .returning(|_| Err(AppError::Unavailable("auth down".to_string())));
        let backend = Backend {
            identity: Arc::new(identity),
            ..memory_backend()
        };

        let err = RegistrationService::submit(&backend, submission("a@b.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unavailable(_)));
        assert!(backend.repos.registrations.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_any_status_and_feed_event() {
        let backend = memory_backend();
        let admin = admin("admin@skola.hr");
        let mut feed = backend.feed.subscribe();
        let submitted = RegistrationService::submit(&backend, submission("a@b.com"))
            .await
            .unwrap();
        RegistrationService::approve(
            &backend,
            &admin,
            &submitted.id,
            ApproveRegistrationRequest::default(),
        )
        .await
        .unwrap();

        assert!(RegistrationService::delete(&backend, &user("x@y.com"), &submitted.id)
            .await
            .is_err());
        RegistrationService::delete(&backend, &admin, &submitted.id)
            .await
            .unwrap();
        assert!(matches!(
            RegistrationService::get(&backend, &admin, &submitted.id).await,
            Err(AppError::NotFound(_))
        ));

        let first = feed.recv().await.unwrap();
        assert_eq!(first.collection, Collection::RegistrationRequests);
        assert_eq!(first.kind, ChangeKind::Created);
    }

    #[tokio::test]
    async fn test_listing_is_admin_only() {
        let backend = memory_backend();
        RegistrationService::submit(&backend, submission("a@b.com"))
            .await
            .unwrap();

        assert!(RegistrationService::list(&backend, &user("x@y.com"), None)
            .await
            .is_err());
        let pending = RegistrationService::list(
            &backend,
            &admin("admin@skola.hr"),
            Some(RegistrationStatus::Pending),
        )
        .await
        .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].reason.as_deref(), Some("Mentorica"));
    }
}
