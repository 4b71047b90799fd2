//! Competition repository

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use super::{corrupt, stale_or_missing, CompetitionRepository};
use crate::{
    error::{AppError, AppResult},
    models::{
        content::{from_stored, to_stored},
        Category, Competition, Creator, NewCompetition, ParticipationMode, Phase,
        PublicationStatus, RegistrationMode, Stamp, StoredBlock, TeamBounds,
    },
};

#[derive(Debug, FromRow)]
struct CompetitionRow {
    id: Uuid,
    name: String,
    date: NaiveDate,
    category: String,
    description: String,
    registration_mode: String,
    external_link: Option<String>,
    participation: String,
    team_min_members: Option<i32>,
    team_max_members: Option<i32>,
    status: String,
    phase: String,
    creator_uid: Uuid,
    creator_email: String,
    sent_by: Option<String>,
    sent_at: Option<DateTime<Utc>>,
    approved_by: Option<String>,
    approved_at: Option<DateTime<Utc>>,
    rejected_by: Option<String>,
    rejected_at: Option<DateTime<Utc>>,
    rejection_reason: Option<String>,
    started_by: Option<String>,
    started_at: Option<DateTime<Utc>>,
    ended_by: Option<String>,
    ended_at: Option<DateTime<Utc>>,
    content: Json<Vec<StoredBlock>>,
    applicants_visible: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

fn team_size(value: Option<i32>) -> Option<u32> {
    value.and_then(|v| u32::try_from(v).ok())
}

impl TryFrom<CompetitionRow> for Competition {
    type Error = AppError;

    fn try_from(row: CompetitionRow) -> Result<Self, Self::Error> {
        let registration = match (row.registration_mode.as_str(), row.external_link) {
            ("portal", _) => RegistrationMode::Portal,
            ("external", Some(link)) => RegistrationMode::External { link },
            (other, _) => return Err(corrupt("registration_mode", other)),
        };
        let participation = match row.participation.as_str() {
            "individual" => ParticipationMode::Individual,
            "team" => ParticipationMode::Team(TeamBounds {
                min_members: team_size(row.team_min_members),
                max_members: team_size(row.team_max_members),
            }),
            other => return Err(corrupt("participation", other)),
        };
        let status =
            PublicationStatus::parse(&row.status).ok_or_else(|| corrupt("status", &row.status))?;
        let phase = Phase::parse(&row.phase).ok_or_else(|| corrupt("phase", &row.phase))?;

        Ok(Self {
            id: row.id,
            name: row.name,
            date: row.date,
            category: Category::from(row.category),
            description: row.description,
            registration,
            participation,
            status,
            phase,
            creator: Creator {
                uid: row.creator_uid,
                email: row.creator_email,
            },
            sent: Stamp::from_columns(row.sent_by, row.sent_at),
            approved: Stamp::from_columns(row.approved_by, row.approved_at),
            rejected: Stamp::from_columns(row.rejected_by, row.rejected_at),
            rejection_reason: row.rejection_reason,
            started: Stamp::from_columns(row.started_by, row.started_at),
            ended: Stamp::from_columns(row.ended_by, row.ended_at),
            content: from_stored(row.content.0),
            applicants_visible: row.applicants_visible,
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: row.version,
        })
    }
}

fn convert(rows: Vec<CompetitionRow>) -> AppResult<Vec<Competition>> {
    rows.into_iter().map(Competition::try_from).collect()
}

fn bounds(participation: &ParticipationMode) -> AppResult<(Option<i32>, Option<i32>)> {
    let column = |size: Option<u32>| {
        size.map(i32::try_from)
            .transpose()
            .map_err(|_| AppError::Validation("team size is too large".to_string()))
    };
    match participation {
        ParticipationMode::Individual => Ok((None, None)),
        ParticipationMode::Team(b) => Ok((column(b.min_members)?, column(b.max_members)?)),
    }
}

fn stamp_by(stamp: &Option<Stamp>) -> Option<&str> {
    stamp.as_ref().map(|s| s.by.as_str())
}

fn stamp_at(stamp: &Option<Stamp>) -> Option<DateTime<Utc>> {
    stamp.as_ref().map(|s| s.at)
}

/// Postgres storage for competitions
pub struct PgCompetitionRepository {
    pool: PgPool,
}

impl PgCompetitionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CompetitionRepository for PgCompetitionRepository {
    async fn create(&self, new: NewCompetition) -> AppResult<Competition> {
        let (team_min, team_max) = bounds(&new.participation)?;

        let row = sqlx::query_as::<_, CompetitionRow>(
            r#"
            INSERT INTO competitions (
                name, date, category, description, registration_mode, external_link,
                participation, team_min_members, team_max_members, status,
                creator_uid, creator_email, sent_by, sent_at, content
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(&new.name)
        .bind(new.date)
        .bind(new.category.as_str())
        .bind(&new.description)
        .bind(new.registration.as_str())
        .bind(new.registration.external_link())
        .bind(new.participation.as_str())
        .bind(team_min)
        .bind(team_max)
        .bind(new.status.as_str())
        .bind(new.creator.uid)
        .bind(&new.creator.email)
        .bind(stamp_by(&new.sent))
        .bind(stamp_at(&new.sent))
        .bind(Json(to_stored(&new.content)))
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find_by_id(&self, id: &Uuid) -> AppResult<Option<Competition>> {
        sqlx::query_as::<_, CompetitionRow>(r#"SELECT * FROM competitions WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Competition::try_from)
            .transpose()
    }

    async fn list_by_status(&self, status: PublicationStatus) -> AppResult<Vec<Competition>> {
        let rows = sqlx::query_as::<_, CompetitionRow>(
            r#"SELECT * FROM competitions WHERE status = $1 ORDER BY date, created_at"#,
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        convert(rows)
    }

    async fn list_by_creator_email(&self, email: &str) -> AppResult<Vec<Competition>> {
        let rows = sqlx::query_as::<_, CompetitionRow>(
            r#"SELECT * FROM competitions WHERE creator_email = $1 ORDER BY created_at DESC"#,
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        convert(rows)
    }

    async fn update(&self, competition: &Competition) -> AppResult<Competition> {
        let (team_min, team_max) = bounds(&competition.participation)?;

        let row = sqlx::query_as::<_, CompetitionRow>(
            r#"
            UPDATE competitions
            SET
                name = $3,
                date = $4,
                category = $5,
                description = $6,
                registration_mode = $7,
                external_link = $8,
                participation = $9,
                team_min_members = $10,
                team_max_members = $11,
                status = $12,
                phase = $13,
                sent_by = $14,
                sent_at = $15,
                approved_by = $16,
                approved_at = $17,
                rejected_by = $18,
                rejected_at = $19,
                rejection_reason = $20,
                started_by = $21,
                started_at = $22,
                ended_by = $23,
                ended_at = $24,
                content = $25,
                applicants_visible = $26,
                updated_at = $27,
                version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(competition.id)
        .bind(competition.version)
        .bind(&competition.name)
        .bind(competition.date)
        .bind(competition.category.as_str())
        .bind(&competition.description)
        .bind(competition.registration.as_str())
        .bind(competition.registration.external_link())
        .bind(competition.participation.as_str())
        .bind(team_min)
        .bind(team_max)
        .bind(competition.status.as_str())
        .bind(competition.phase.as_str())
        .bind(stamp_by(&competition.sent))
        .bind(stamp_at(&competition.sent))
        .bind(stamp_by(&competition.approved))
        .bind(stamp_at(&competition.approved))
        .bind(stamp_by(&competition.rejected))
        .bind(stamp_at(&competition.rejected))
        .bind(&competition.rejection_reason)
        .bind(stamp_by(&competition.started))
        .bind(stamp_at(&competition.started))
        .bind(stamp_by(&competition.ended))
        .bind(stamp_at(&competition.ended))
        .bind(Json(to_stored(&competition.content)))
        .bind(competition.applicants_visible)
        .bind(competition.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.try_into(),
            None => {
                let exists = self.find_by_id(&competition.id).await?.is_some();
                Err(stale_or_missing(exists, "Competition"))
            }
        }
    }

    async fn delete(&self, id: &Uuid) -> AppResult<bool> {
        let result = sqlx::query(r#"DELETE FROM competitions WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
