use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, types::Json};

use crate::{
    lifecycle::EventStatus,
    models::{
        event::{Event, NewEvent, SubjectSlot},
        response::{EventResponse, NewEventResponse, SubjectScore},
    },
    store::{EventStore, StoreError},
};

const EVENT_COLUMNS: &str = "\
    id, title, questions_per_subject, status, subjects, total_questions, version, \
    created_by, created_at, updated_at, completed_at, published_at";

const RESPONSE_COLUMNS: &str = "\
    id, event_id, student_id, student_name, score, total, subject_scores, submitted_at";

/// Raw 'events' row; `subjects` holds the slot document.
#[derive(Debug, FromRow)]
struct EventRow {
    id: i64,
    title: String,
    questions_per_subject: i32,
    status: String,
    subjects: Json<Vec<SubjectSlot>>,
    total_questions: i32,
    version: i64,
    created_by: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    published_at: Option<DateTime<Utc>>,
}

impl TryFrom<EventRow> for Event {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let event_id = row.id;
        let corrupt = |reason: String| StoreError::Corrupt { event_id, reason };
        let status = row.status.parse::<EventStatus>().map_err(corrupt)?;
        let questions_per_subject = u32::try_from(row.questions_per_subject)
            .map_err(|_| corrupt(format!("negative quota {}", row.questions_per_subject)))?;
        let total_questions = u32::try_from(row.total_questions)
            .map_err(|_| corrupt(format!("negative total {}", row.total_questions)))?;

        Ok(Event {
            id: row.id,
            title: row.title,
            questions_per_subject,
            status,
            subjects: row.subjects.0,
            total_questions,
            version: row.version,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
            completed_at: row.completed_at,
            published_at: row.published_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ResponseRow {
    id: i64,
    event_id: i64,
    student_id: i64,
    student_name: String,
    score: i32,
    total: i32,
    subject_scores: Json<Vec<SubjectScore>>,
    submitted_at: DateTime<Utc>,
}

impl From<ResponseRow> for EventResponse {
    fn from(row: ResponseRow) -> Self {
        Self {
            id: row.id,
            event_id: row.event_id,
            student_id: row.student_id,
            student_name: row.student_name,
            score: row.score.max(0) as u32,
            total: row.total.max(0) as u32,
            subject_scores: row.subject_scores.0,
            submitted_at: row.submitted_at,
        }
    }
}

fn to_i32(n: u32) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

/// [`EventStore`] backed by the 'events' and 'event_responses' tables.
#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn create(&self, new_event: NewEvent) -> Result<Event, StoreError> {
        let slots: Vec<SubjectSlot> = new_event.subjects.into_iter().map(SubjectSlot::empty).collect();

        let row = sqlx::query_as::<_, EventRow>(&format!(
            "INSERT INTO events (title, questions_per_subject, status, subjects, created_by) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(&new_event.title)
        .bind(to_i32(new_event.questions_per_subject))
        .bind(EventStatus::Active.as_str())
        .bind(Json(&slots))
        .bind(new_event.created_by)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn load(&self, event_id: i64) -> Result<Event, StoreError> {
        sqlx::query_as::<_, EventRow>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound(event_id))?
            .try_into()
    }

    async fn list(&self, status: Option<EventStatus>) -> Result<Vec<Event>, StoreError> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events \
             WHERE ($1::TEXT IS NULL OR status = $1) \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(status.map(EventStatus::as_str))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Event::try_from).collect()
    }

    async fn store(&self, event: &Event) -> Result<Event, StoreError> {
        let new_version: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE events SET
                title = $2,
                status = $3,
                subjects = $4,
                total_questions = $5,
                updated_at = $6,
                completed_at = $7,
                published_at = $8,
                version = version + 1
            WHERE id = $1 AND version = $9
            RETURNING version
            "#,
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(event.status.as_str())
        .bind(Json(&event.subjects))
        .bind(to_i32(event.total_questions))
        .bind(event.updated_at)
        .bind(event.completed_at)
        .bind(event.published_at)
        .bind(event.version)
        .fetch_optional(&self.pool)
        .await?;

        match new_version {
            Some(version) => Ok(Event {
                version,
                ..event.clone()
            }),
            None => {
                let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM events WHERE id = $1")
                    .bind(event.id)
                    .fetch_optional(&self.pool)
                    .await?;
                match exists {
                    Some(_) => Err(StoreError::Conflict {
                        event_id: event.id,
                        expected: event.version,
                    }),
                    None => Err(StoreError::NotFound(event.id)),
                }
            }
        }
    }

    async fn delete(&self, event_id: i64) -> Result<Event, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM event_responses WHERE event_id = $1")
            .bind(event_id)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, EventRow>(&format!(
            "DELETE FROM events WHERE id = $1 RETURNING {EVENT_COLUMNS}"
        ))
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound(event_id))?;

        tx.commit().await?;
        row.try_into()
    }

    async fn insert_response(
        &self,
        response: NewEventResponse,
    ) -> Result<EventResponse, StoreError> {
        let row = sqlx::query_as::<_, ResponseRow>(&format!(
            "INSERT INTO event_responses \
             (event_id, student_id, student_name, score, total, subject_scores) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {RESPONSE_COLUMNS}"
        ))
        .bind(response.event_id)
        .bind(response.student_id)
        .bind(&response.student_name)
        .bind(to_i32(response.score))
        .bind(to_i32(response.total))
        .bind(Json(&response.subject_scores))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return StoreError::DuplicateResponse {
                        event_id: response.event_id,
                        student_id: response.student_id,
                    };
                }
                if db.is_foreign_key_violation() {
                    return StoreError::NotFound(response.event_id);
                }
            }
            StoreError::Database(e)
        })?;

        Ok(row.into())
    }

    async fn list_responses(&self, event_id: i64) -> Result<Vec<EventResponse>, StoreError> {
        let rows = sqlx::query_as::<_, ResponseRow>(&format!(
            "SELECT {RESPONSE_COLUMNS} FROM event_responses \
             WHERE event_id = $1 ORDER BY submitted_at ASC, id ASC"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(EventResponse::from).collect())
    }
}
