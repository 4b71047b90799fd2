//! Application repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use super::{closed_for_applications, corrupt, stale_or_missing, ApplicationRepository};
use crate::{
    error::{AppError, AppResult},
    models::{Applicant, Application, ApplicationStatus, NewApplication, Stamp},
};

#[derive(Debug, FromRow)]
struct ApplicationRow {
    id: Uuid,
    competition_id: Uuid,
    applicant: Json<Applicant>,
    status: String,
    rejection_reason: Option<String>,
    reviewed_by: Option<String>,
    reviewed_at: Option<DateTime<Utc>>,
    submitted_at: DateTime<Utc>,
    user_id: Option<Uuid>,
    version: i64,
}

impl TryFrom<ApplicationRow> for Application {
    type Error = AppError;

    fn try_from(row: ApplicationRow) -> Result<Self, Self::Error> {
        let status =
            ApplicationStatus::parse(&row.status).ok_or_else(|| corrupt("status", &row.status))?;

        Ok(Self {
            id: row.id,
            competition_id: row.competition_id,
            applicant: row.applicant.0,
            status,
            rejection_reason: row.rejection_reason,
            reviewed: Stamp::from_columns(row.reviewed_by, row.reviewed_at),
            submitted_at: row.submitted_at,
            user_id: row.user_id,
            version: row.version,
        })
    }
}

/// Postgres storage for applications
pub struct PgApplicationRepository {
    pool: PgPool,
}

impl PgApplicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApplicationRepository for PgApplicationRepository {
    async fn create(&self, new: NewApplication) -> AppResult<Application> {
        // the share lock orders this insert against a concurrent phase change
        let row = sqlx::query_as::<_, ApplicationRow>(
            r#"
            INSERT INTO applications (competition_id, applicant, user_id)
            SELECT c.id, $2, $3
            FROM competitions c
            WHERE c.id = $1
              AND c.status = 'published'
              AND c.phase = 'prijave'
              AND c.registration_mode = 'portal'
            FOR SHARE OF c
            RETURNING *
            "#,
        )
        .bind(new.competition_id)
        .bind(Json(&new.applicant))
        .bind(new.user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.try_into(),
            None => {
                let exists: bool =
                    sqlx::query_scalar(r#"SELECT EXISTS (SELECT 1 FROM competitions WHERE id = $1)"#)
                        .bind(new.competition_id)
                        .fetch_one(&self.pool)
                        .await?;
                if exists {
                    Err(closed_for_applications())
                } else {
                    Err(AppError::NotFound("Competition not found".to_string()))
                }
            }
        }
    }

    async fn find_by_id(&self, id: &Uuid) -> AppResult<Option<Application>> {
        sqlx::query_as::<_, ApplicationRow>(r#"SELECT * FROM applications WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Application::try_from)
            .transpose()
    }

    async fn list_by_competition(
        &self,
        competition_id: &Uuid,
        status: Option<ApplicationStatus>,
    ) -> AppResult<Vec<Application>> {
        let rows = sqlx::query_as::<_, ApplicationRow>(
            r#"
            SELECT * FROM applications
            WHERE competition_id = $1 AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY submitted_at
            "#,
        )
        .bind(competition_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Application::try_from).collect()
    }

    async fn update(&self, application: &Application) -> AppResult<Application> {
        let row = sqlx::query_as::<_, ApplicationRow>(
            r#"
            UPDATE applications
            SET
                status = $3,
                rejection_reason = $4,
                reviewed_by = $5,
                reviewed_at = $6,
                version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(application.id)
        .bind(application.version)
        .bind(application.status.as_str())
        .bind(&application.rejection_reason)
        .bind(application.reviewed.as_ref().map(|s| s.by.as_str()))
        .bind(application.reviewed.as_ref().map(|s| s.at))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.try_into(),
            None => {
                let exists = self.find_by_id(&application.id).await?.is_some();
                Err(stale_or_missing(exists, "Application"))
            }
        }
    }

    async fn delete(&self, id: &Uuid) -> AppResult<bool> {
        let result = sqlx::query(r#"DELETE FROM applications WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_competition(&self, competition_id: &Uuid) -> AppResult<u64> {
        let result = sqlx::query(r#"DELETE FROM applications WHERE competition_id = $1"#)
            .bind(competition_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
