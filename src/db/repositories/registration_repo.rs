//! Registration request repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{corrupt, stale_or_missing, RegistrationRepository};
use crate::{
    error::{AppError, AppResult},
    models::{NewRegistrationRequest, RegistrationRequest, RegistrationStatus, Stamp},
};

#[derive(Debug, FromRow)]
struct RegistrationRow {
    id: Uuid,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    class_grade: String,
    reason: Option<String>,
    status: String,
    admin_note: Option<String>,
    rejection_reason: Option<String>,
    processed_by: Option<String>,
    processed_at: Option<DateTime<Utc>>,
    temporary_password_issued: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<RegistrationRow> for RegistrationRequest {
    type Error = AppError;

    fn try_from(row: RegistrationRow) -> Result<Self, Self::Error> {
        let status =
            RegistrationStatus::parse(&row.status).ok_or_else(|| corrupt("status", &row.status))?;

        Ok(Self {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            class_grade: row.class_grade,
            reason: row.reason,
            status,
            admin_note: row.admin_note,
            rejection_reason: row.rejection_reason,
            processed: Stamp::from_columns(row.processed_by, row.processed_at),
            temporary_password_issued: row.temporary_password_issued,
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: row.version,
        })
    }
}

fn convert(rows: Vec<RegistrationRow>) -> AppResult<Vec<RegistrationRequest>> {
    rows.into_iter().map(RegistrationRequest::try_from).collect()
}

/// Postgres storage for registration requests
pub struct PgRegistrationRepository {
    pool: PgPool,
}

impl PgRegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RegistrationRepository for PgRegistrationRepository {
    async fn create(&self, new: NewRegistrationRequest) -> AppResult<RegistrationRequest> {
        let row = sqlx::query_as::<_, RegistrationRow>(
            r#"
            INSERT INTO registration_requests (
                email, password_hash, first_name, last_name, class_grade, reason
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.class_grade)
        .bind(&new.reason)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find_by_id(&self, id: &Uuid) -> AppResult<Option<RegistrationRequest>> {
        sqlx::query_as::<_, RegistrationRow>(r#"SELECT * FROM registration_requests WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(RegistrationRequest::try_from)
            .transpose()
    }

    async fn find_pending_by_email(&self, email: &str) -> AppResult<Option<RegistrationRequest>> {
        sqlx::query_as::<_, RegistrationRow>(
            r#"SELECT * FROM registration_requests WHERE email = $1 AND status = 'pending'"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .map(RegistrationRequest::try_from)
        .transpose()
    }

    async fn list(&self, status: Option<RegistrationStatus>) -> AppResult<Vec<RegistrationRequest>> {
        let rows = sqlx::query_as::<_, RegistrationRow>(
            r#"
            SELECT * FROM registration_requests
            WHERE ($1::TEXT IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        convert(rows)
    }

    async fn update(&self, request: &RegistrationRequest) -> AppResult<RegistrationRequest> {
        let row = sqlx::query_as::<_, RegistrationRow>(
            r#"
            UPDATE registration_requests
            SET
                status = $3,
                admin_note = $4,
                rejection_reason = $5,
                processed_by = $6,
                processed_at = $7,
                temporary_password_issued = $8,
                updated_at = $9,
                version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(request.id)
        .bind(request.version)
        .bind(request.status.as_str())
        .bind(&request.admin_note)
        .bind(&request.rejection_reason)
        .bind(request.processed.as_ref().map(|s| s.by.as_str()))
        .bind(request.processed.as_ref().map(|s| s.at))
        .bind(request.temporary_password_issued)
        .bind(request.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.try_into(),
            None => {
                let exists = self.find_by_id(&request.id).await?.is_some();
                Err(stale_or_missing(exists, "Registration request"))
            }
        }
    }

    async fn delete(&self, id: &Uuid) -> AppResult<bool> {
        let result = sqlx::query(r#"DELETE FROM registration_requests WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
