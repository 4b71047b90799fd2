//! User profile repository

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::UserRepository;
use crate::{error::AppResult, models::User};

/// Postgres storage for user profiles
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn ensure(
        &self,
        uid: &Uuid,
        email: &str,
        display_name: Option<&str>,
    ) -> AppResult<(User, bool)> {
        let inserted = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (uid, email, display_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (uid) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(uid)
        .bind(email)
        .bind(display_name)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(user) = inserted {
            return Ok((user, true));
        }

        let user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE uid = $1"#)
            .bind(uid)
            .fetch_one(&self.pool)
            .await?;

        Ok((user, false))
    }

    async fn find_by_uid(&self, uid: &Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE uid = $1"#)
            .bind(uid)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE email = $1"#)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(r#"SELECT * FROM users ORDER BY created_at"#)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }
}
