//! Credential storage

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// A sign-in credential
#[derive(Debug, Clone, FromRow)]
pub struct Credential {
    pub uid: Uuid,
    pub email: String,
    pub password_hash: String,
    /// Tokens issued in an older epoch are no longer accepted
    pub session_epoch: i64,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fails with `AlreadyExists` when the email is taken
    async fn insert(&self, email: &str, password_hash: &str) -> AppResult<Credential>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Credential>>;

    async fn find_by_uid(&self, uid: &Uuid) -> AppResult<Option<Credential>>;

    /// Start a new session epoch, returning it
    async fn bump_epoch(&self, uid: &Uuid) -> AppResult<i64>;
}

fn duplicate(email: &str) -> AppError {
    AppError::AlreadyExists(format!("An account for {email} already exists"))
}

/// Postgres credential store
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn insert(&self, email: &str, password_hash: &str) -> AppResult<Credential> {
        sqlx::query_as::<_, Credential>(
            r#"
            INSERT INTO credentials (email, password_hash)
            VALUES ($1, $2)
            RETURNING uid, email, password_hash, session_epoch, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::AlreadyExists(_) => duplicate(email),
            other => other,
        })
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Credential>> {
        let credential = sqlx::query_as::<_, Credential>(
            r#"
            SELECT uid, email, password_hash, session_epoch, created_at
            FROM credentials WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credential)
    }

    async fn find_by_uid(&self, uid: &Uuid) -> AppResult<Option<Credential>> {
        let credential = sqlx::query_as::<_, Credential>(
            r#"
            SELECT uid, email, password_hash, session_epoch, created_at
            FROM credentials WHERE uid = $1
            "#,
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credential)
    }

    async fn bump_epoch(&self, uid: &Uuid) -> AppResult<i64> {
        let epoch: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE credentials
            SET session_epoch = session_epoch + 1, updated_at = NOW()
            WHERE uid = $1
            RETURNING session_epoch
            "#,
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;

        epoch.ok_or_else(|| AppError::NotFound("Credential not found".to_string()))
    }
}

/// In-memory credential store
#[derive(Default)]
pub struct MemoryCredentialStore {
    rows: RwLock<HashMap<Uuid, Credential>>,
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn insert(&self, email: &str, password_hash: &str) -> AppResult<Credential> {
        let mut rows = self.rows.write().await;
        if rows.values().any(|c| c.email == email) {
            return Err(duplicate(email));
        }

        let credential = Credential {
            uid: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            session_epoch: 0,
            created_at: Utc::now(),
        };
        rows.insert(credential.uid, credential.clone());
        Ok(credential)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Credential>> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|c| c.email == email)
            .cloned())
    }

    async fn find_by_uid(&self, uid: &Uuid) -> AppResult<Option<Credential>> {
        Ok(self.rows.read().await.get(uid).cloned())
    }

    async fn bump_epoch(&self, uid: &Uuid) -> AppResult<i64> {
        let mut rows = self.rows.write().await;
        let credential = rows
            .get_mut(uid)
            .ok_or_else(|| AppError::NotFound("Credential not found".to_string()))?;
        credential.session_epoch += 1;
        Ok(credential.session_epoch)
    }
}
