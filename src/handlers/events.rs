// src/handlers/events.rs

use std::{collections::HashSet, sync::Arc};

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    config::{DEFAULT_SUBJECTS, MAX_TITLE_LEN},
    error::{AppError, ErrorBody},
    extractors::AppJson,
    lifecycle,
    models::{
        event::{
            CreateEventRequest, EventDetail, EventListParams, EventSummary, NewEvent, subject_key,
        },
        response::{EventResponse, EventResults, SubjectAverage},
    },
    store::EventStore,
    utils::{
        html::clean_html,
        jwt::Claims,
        media::{ImageHost, release_all},
    },
};

/// Trims subject names and rejects blanks and duplicates.
fn normalize_subjects(subjects: Option<Vec<String>>) -> Result<Vec<String>, AppError> {
    let Some(subjects) = subjects else {
        return Ok(DEFAULT_SUBJECTS.iter().map(|s| s.to_string()).collect());
    };

    let mut seen = HashSet::new();
    let mut normalized = Vec::with_capacity(subjects.len());
    for raw in subjects {
        let name = raw.trim();
        if name.is_empty() || name.chars().count() > 100 {
            return Err(AppError::BadRequest(
                "Subject names must be 1-100 characters".to_string(),
            ));
        }
        if !seen.insert(subject_key(name)) {
            return Err(AppError::BadRequest(format!("Duplicate subject '{}'", name)));
        }
        normalized.push(name.to_string());
    }
    Ok(normalized)
}

/// Sanitized title, measured after cleaning since escaping can lengthen it.
fn clean_title(raw: &str) -> Result<String, AppError> {
    let title = clean_html(raw.trim());
    if title.is_empty() {
        return Err(AppError::BadRequest("Title must not be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::BadRequest(format!(
            "Title must be at most {MAX_TITLE_LEN} characters once HTML is escaped"
        )));
    }
    Ok(title)
}

/// Creates a new event with every subject slot empty.
/// Host only.
#[utoipa::path(
    post,
    path = "/api/host/events",
    tag = "Host",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventDetail),
        (status = 400, description = "Validation error", body = ErrorBody),
    ),
    security(("jwt" = []))
)]
pub async fn create_event(
    State(store): State<Arc<dyn EventStore>>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<CreateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let title = clean_title(&payload.title)?;

    let event = store
        .create(NewEvent {
            title,
            questions_per_subject: payload.questions_per_subject,
            subjects: normalize_subjects(payload.subjects)?,
            created_by: claims.user_id()?,
        })
        .await?;

    tracing::info!(event_id = event.id, subjects = event.subjects.len(), "event created");
    Ok((StatusCode::CREATED, Json(EventDetail::from(&event))))
}

/// Lists events, newest first, optionally filtered by status.
/// Host only.
#[utoipa::path(
    get,
    path = "/api/host/events",
    tag = "Host",
    params(EventListParams),
    responses((status = 200, description = "Event summaries", body = Vec<EventSummary>)),
    security(("jwt" = []))
)]
pub async fn list_events(
    State(store): State<Arc<dyn EventStore>>,
    Query(params): Query<EventListParams>,
) -> Result<impl IntoResponse, AppError> {
    let events = store.list(params.status).await?;
    Ok(Json(
        events.iter().map(EventSummary::from).collect::<Vec<_>>(),
    ))
}

/// Full event including every question and contribution ledger.
/// Host only.
#[utoipa::path(
    get,
    path = "/api/host/events/{id}",
    tag = "Host",
    params(("id" = i64, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event detail", body = EventDetail),
        (status = 404, description = "No such event", body = ErrorBody),
    ),
    security(("jwt" = []))
)]
pub async fn get_event(
    State(store): State<Arc<dyn EventStore>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let event = store.load(id).await?;
    Ok(Json(EventDetail::from(&event)))
}

/// Publishes a complete event to students.
/// Host only. Fails with the list of short subjects when incomplete.
#[utoipa::path(
    post,
    path = "/api/host/events/{id}/publish",
    tag = "Host",
    params(("id" = i64, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event published", body = EventSummary),
        (status = 404, description = "No such event", body = ErrorBody),
        (status = 409, description = "Concurrent modification", body = ErrorBody),
        (status = 422, description = "Incomplete or already published", body = ErrorBody),
    ),
    security(("jwt" = []))
)]
pub async fn publish_event(
    State(store): State<Arc<dyn EventStore>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut event = store.load(id).await?;

    if let Err(e) = lifecycle::publish(&mut event, Utc::now()) {
        tracing::warn!(event_id = id, "publish rejected: {}", e);
        return Err(e.into());
    }

    let saved = store.store(&event).await?;
    Ok(Json(EventSummary::from(&saved)))
}

/// Deletes an event, its responses, and every image its questions reference.
/// Host only.
#[utoipa::path(
    delete,
    path = "/api/host/events/{id}",
    tag = "Host",
    params(("id" = i64, Path, description = "Event id")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 404, description = "No such event", body = ErrorBody),
    ),
    security(("jwt" = []))
)]
pub async fn delete_event(
    State(store): State<Arc<dyn EventStore>>,
    State(images): State<Arc<dyn ImageHost>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let removed = store.delete(id).await?;

    let public_ids = removed.image_public_ids();
    let released = release_all(images.as_ref(), &public_ids).await;
    tracing::info!(
        event_id = id,
        images = public_ids.len(),
        released,
        "event deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}

fn percentage(score: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    f64::from(score) / f64::from(total) * 100.0
}

/// Aggregates responses into per-event and per-subject figures.
fn summarize(event_id: i64, title: String, subjects: &[String], responses: Vec<EventResponse>) -> EventResults {
    let attempts = responses.len();
    let average_percentage = if attempts == 0 {
        0.0
    } else {
        responses
            .iter()
            .map(|r| percentage(r.score, r.total))
            .sum::<f64>()
            / attempts as f64
    };

    let subject_averages = subjects
        .iter()
        .map(|subject| {
            let scores: Vec<f64> = responses
                .iter()
                .filter_map(|r| r.subject_scores.iter().find(|s| &s.subject == subject))
                .map(|s| percentage(s.correct, s.total))
                .collect();
            let average_percentage = if scores.is_empty() {
                0.0
            } else {
                scores.iter().sum::<f64>() / scores.len() as f64
            };
            SubjectAverage {
                subject: subject.clone(),
                average_percentage,
            }
        })
        .collect();

    EventResults {
        event_id,
        title,
        attempts,
        average_percentage,
        best_score: responses.iter().map(|r| r.score).max(),
        subject_averages,
        responses,
    }
}

/// Aggregated student results of an event.
/// Host only.
#[utoipa::path(
    get,
    path = "/api/host/events/{id}/results",
    tag = "Host",
    params(("id" = i64, Path, description = "Event id")),
    responses(
        (status = 200, description = "Results", body = EventResults),
        (status = 404, description = "No such event", body = ErrorBody),
    ),
    security(("jwt" = []))
)]
pub async fn event_results(
    State(store): State<Arc<dyn EventStore>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let event = store.load(id).await?;
    let responses = store.list_responses(id).await?;
    let subjects: Vec<String> = event.subjects.iter().map(|s| s.subject.clone()).collect();

    Ok(Json(summarize(event.id, event.title, &subjects, responses)))
}
