//! Identity provider
//!
//! The portal talks to authentication through [`IdentityProvider`]: sign a
//! credential in, create a credential for someone else (registration
//! approval), sign out, verify a session token and subscribe to identity
//! changes. [`LocalIdentityProvider`] implements it over a credential store
//! with Argon2 hashes and HS256 tokens.

pub mod credentials;
pub mod local;
pub mod token;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::AppResult;

pub use credentials::{Credential, CredentialStore, MemoryCredentialStore, PgCredentialStore};
pub use local::LocalIdentityProvider;

/// A verified identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub uid: Uuid,
    pub email: String,
}

/// Result of a successful sign-in
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub expires_in: i64,
    pub identity: Identity,
}

/// Secret for a new credential
#[derive(Clone)]
pub enum Secret {
    /// Plain password, hashed by the provider
    Password(String),
    /// Argon2 hash taken over as is
    Hash(String),
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Password(_) => f.write_str("Password(<redacted>)"),
            Self::Hash(_) => f.write_str("Hash(<redacted>)"),
        }
    }
}

/// Identity changes broadcast to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum IdentityEvent {
    SignedIn { uid: Uuid, email: String },
    SignedOut { uid: Uuid },
    CredentialCreated { uid: Uuid, email: String },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Check a password and issue a session token
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session>;

    /// Create a credential for `email`; fails with `AlreadyExists` when one exists
    async fn create_credential(&self, email: &str, secret: Secret) -> AppResult<Identity>;

    /// Invalidate every token issued to `uid` so far
    async fn sign_out(&self, uid: &Uuid) -> AppResult<()>;

    /// Resolve a session token to its identity
    async fn verify(&self, token: &str) -> AppResult<Identity>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Identity>>;

    fn subscribe(&self) -> broadcast::Receiver<IdentityEvent>;
}
