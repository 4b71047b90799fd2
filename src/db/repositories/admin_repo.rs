//! Admin registry repository

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::AdminRepository;
use crate::{
    error::{AppError, AppResult},
    models::AdminGrant,
};

/// Postgres storage for admin grants
pub struct PgAdminRepository {
    pool: PgPool,
}

impl PgAdminRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminRepository for PgAdminRepository {
    async fn find(&self, uid: &Uuid) -> AppResult<Option<AdminGrant>> {
        let grant = sqlx::query_as::<_, AdminGrant>(r#"SELECT * FROM admin_grants WHERE uid = $1"#)
            .bind(uid)
            .fetch_optional(&self.pool)
            .await?;

        Ok(grant)
    }

    async fn is_admin(&self, uid: &Uuid) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar(r#"SELECT EXISTS(SELECT 1 FROM admin_grants WHERE uid = $1)"#)
                .bind(uid)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn list(&self) -> AppResult<Vec<AdminGrant>> {
        let grants =
            sqlx::query_as::<_, AdminGrant>(r#"SELECT * FROM admin_grants ORDER BY granted_at"#)
                .fetch_all(&self.pool)
                .await?;

        Ok(grants)
    }

    async fn grant(&self, grant: AdminGrant) -> AppResult<AdminGrant> {
        sqlx::query_as::<_, AdminGrant>(
            r#"
            INSERT INTO admin_grants (uid, role, granted_by, granted_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (uid) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(grant.uid)
        .bind(&grant.role)
        .bind(&grant.granted_by)
        .bind(grant.granted_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::AlreadyExists("User is already an admin".to_string()))
    }

    async fn revoke(&self, uid: &Uuid) -> AppResult<bool> {
        let result = sqlx::query(r#"DELETE FROM admin_grants WHERE uid = $1"#)
            .bind(uid)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
