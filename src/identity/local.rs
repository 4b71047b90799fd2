//! Identity provider backed by a credential store

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{
    token, CredentialStore, Identity, IdentityEvent, IdentityProvider, Secret, Session,
};
use crate::{
    config::JwtConfig,
    constants::CHANGE_FEED_CAPACITY,
    error::{AppError, AppResult},
    utils::crypto::{hash_password, is_password_hash, verify_password},
};

pub struct LocalIdentityProvider {
    store: Arc<dyn CredentialStore>,
    jwt: JwtConfig,
    events: broadcast::Sender<IdentityEvent>,
}

impl LocalIdentityProvider {
    pub fn new(store: Arc<dyn CredentialStore>, jwt: JwtConfig) -> Self {
        let (events, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self { store, jwt, events }
    }

    fn emit(&self, event: IdentityEvent) {
        // nobody listening is fine
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session> {
        let credential = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &credential.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        let (token, expires_in) = token::issue(
            &credential.uid,
            &credential.email,
            credential.session_epoch,
            &self.jwt.secret,
            self.jwt.expiry_hours,
        )?;

        self.emit(IdentityEvent::SignedIn {
            uid: credential.uid,
            email: credential.email.clone(),
        });

        Ok(Session {
            token,
            expires_in,
            identity: Identity {
                uid: credential.uid,
                email: credential.email,
            },
        })
    }

    async fn create_credential(&self, email: &str, secret: Secret) -> AppResult<Identity> {
        let password_hash = match secret {
            Secret::Password(password) => hash_password(&password)?,
            Secret::Hash(hash) => {
                if !is_password_hash(&hash) {
                    return Err(AppError::Internal(anyhow::anyhow!(
                        "Stored password is not a valid hash"
                    )));
                }
                hash
            }
        };

        let credential = self.store.insert(email, &password_hash).await?;

        self.emit(IdentityEvent::CredentialCreated {
            uid: credential.uid,
            email: credential.email.clone(),
        });

        Ok(Identity {
            uid: credential.uid,
            email: credential.email,
        })
    }

    async fn sign_out(&self, uid: &Uuid) -> AppResult<()> {
        self.store.bump_epoch(uid).await?;
        self.emit(IdentityEvent::SignedOut { uid: *uid });
        Ok(())
    }

    async fn verify(&self, token: &str) -> AppResult<Identity> {
        let claims = token::decode_claims(token, &self.jwt.secret)?;
        let uid = claims.uid()?;

        let credential = self
            .store
            .find_by_uid(&uid)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if credential.session_epoch != claims.epoch {
            return Err(AppError::InvalidToken);
        }

        Ok(Identity {
            uid,
            email: credential.email,
        })
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Identity>> {
        Ok(self
            .store
            .find_by_email(email)
            .await?
            .map(|c| Identity {
                uid: c.uid,
                email: c.email,
            }))
    }

    fn subscribe(&self) -> broadcast::Receiver<IdentityEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::MemoryCredentialStore;

    fn provider() -> LocalIdentityProvider {
        LocalIdentityProvider::new(
            Arc::new(MemoryCredentialStore::default()),
            JwtConfig {
                secret: "test-secret".to_string(),
                expiry_hours: 1,
            },
        )
    }

    #[tokio::test]
    async fn test_sign_in_and_verify() {
        let provider = provider();
        let created = provider
            .create_credential("a@b.com", Secret::Password("tajna123".into()))
            .await
            .unwrap();

        let session = provider.sign_in("a@b.com", "tajna123").await.unwrap();
        assert_eq!(session.identity, created);
        assert_eq!(provider.verify(&session.token).await.unwrap(), created);

        assert!(matches!(
            provider.sign_in("a@b.com", "kriva").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            provider.sign_in("nobody@b.com", "tajna123").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_sign_out_revokes_earlier_tokens() {
        let provider = provider();
        let created = provider
            .create_credential("a@b.com", Secret::Password("tajna123".into()))
            .await
            .unwrap();
        let old = provider.sign_in("a@b.com", "tajna123").await.unwrap();

        provider.sign_out(&created.uid).await.unwrap();
        assert!(matches!(
            provider.verify(&old.token).await,
            Err(AppError::InvalidToken)
        ));

        let fresh = provider.sign_in("a@b.com", "tajna123").await.unwrap();
        assert!(provider.verify(&fresh.token).await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let provider = provider();
        provider
            .create_credential("a@b.com", Secret::Password("tajna123".into()))
            .await
            .unwrap();
        assert!(matches!(
            provider
                .create_credential("a@b.com", Secret::Password("druga123".into()))
                .await,
            Err(AppError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_stored_hash_is_taken_over() {
        let provider = provider();
        let hash = hash_password("izzahtjeva").unwrap();
        provider
            .create_credential("a@b.com", Secret::Hash(hash))
            .await
            .unwrap();
        assert!(provider.sign_in("a@b.com", "izzahtjeva").await.is_ok());

        assert!(provider
            .create_credential("c@d.com", Secret::Hash("plaintext".into()))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_events_are_broadcast() {
        let provider = provider();
        let mut events = provider.subscribe();
        let created = provider
            .create_credential("a@b.com", Secret::Password("tajna123".into()))
            .await
            .unwrap();
        provider.sign_out(&created.uid).await.unwrap();

        assert_eq!(
            events.recv().await.unwrap(),
            IdentityEvent::CredentialCreated {
                uid: created.uid,
                email: "a@b.com".into()
            }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            IdentityEvent::SignedOut { uid: created.uid }
        );
    }
}
