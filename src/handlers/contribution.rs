use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;

use crate::{
    error::{AppError, ErrorBody},
    extractors::AppJson,
    lifecycle::{self, ContributionResult},
    models::{
        event::{ContributeRequest, EventSummary, TeacherEventView},
        question::QuestionView,
    },
    store::EventStore,
    utils::jwt::Claims,
};

/// Events that include the teacher's subject.
/// Teacher only.
#[utoipa::path(
    get,
    path = "/api/teacher/events",
    tag = "Teacher",
    responses((status = 200, description = "Events for the teacher's subject", body = Vec<EventSummary>)),
    security(("jwt" = []))
)]
pub async fn list_teacher_events(
    State(store): State<Arc<dyn EventStore>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let contributor = claims.contributor()?;

    let events = store.list(None).await?;
    let mine: Vec<EventSummary> = events
        .iter()
        .filter(|e| e.slot(&contributor.subject).is_some())
        .map(EventSummary::from)
        .collect();

    Ok(Json(mine))
}

/// Event overview plus the questions this teacher currently has in it.
/// Teacher only.
#[utoipa::path(
    get,
    path = "/api/teacher/events/{id}",
    tag = "Teacher",
    params(("id" = i64, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event and own questions", body = TeacherEventView),
        (status = 400, description = "Subject not part of event", body = ErrorBody),
        (status = 404, description = "No such event", body = ErrorBody),
    ),
    security(("jwt" = []))
)]
pub async fn get_teacher_event(
    State(store): State<Arc<dyn EventStore>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let contributor = claims.contributor()?;
    let event = store.load(id).await?;

    let slot = event
        .slot(&contributor.subject)
        .ok_or_else(|| lifecycle::LifecycleError::UnknownSubject(contributor.subject.clone()))?;

    let existing_questions: Vec<QuestionView> = slot
        .questions_by(contributor.teacher_id)
        .map(QuestionView::from)
        .collect();

    Ok(Json(TeacherEventView {
        event: EventSummary::from(&event),
        subject: slot.subject.clone(),
        accepting_contributions: event.status.accepts_contributions(),
        existing_questions,
    }))
}

/// Replaces this teacher's questions in their subject slot.
/// Teacher only.
///
/// The whole batch lands or nothing does; the event moves to `completed`
/// in the same write when this makes every subject meet its quota.
#[utoipa::path(
    put,
    path = "/api/teacher/events/{id}/questions",
    tag = "Teacher",
    params(("id" = i64, Path, description = "Event id")),
    request_body = ContributeRequest,
    responses(
        (status = 200, description = "Contribution accepted", body = ContributionResult),
        (status = 400, description = "Invalid batch or subject", body = ErrorBody),
        (status = 404, description = "No such event", body = ErrorBody),
        (status = 409, description = "Concurrent modification", body = ErrorBody),
        (status = 422, description = "Event not accepting contributions", body = ErrorBody),
    ),
    security(("jwt" = []))
)]
pub async fn contribute(
    State(store): State<Arc<dyn EventStore>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<ContributeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let contributor = claims.contributor()?;
    let mut event = store.load(id).await?;

    let result = lifecycle::contribute(&mut event, &contributor, &payload.questions, Utc::now())
        .inspect_err(|e| {
            tracing::warn!(
                event_id = id,
                teacher_id = contributor.teacher_id,
                "contribution rejected: {}",
                e
            )
        })?;

    store.store(&event).await?;

    tracing::info!(
        event_id = id,
        teacher_id = contributor.teacher_id,
        subject = %contributor.subject,
        accepted = result.accepted_count,
        status = %result.event_status_after,
        "contribution stored"
    );
    Ok(Json(result))
}
