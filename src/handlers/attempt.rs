use std::{collections::HashMap, sync::Arc};

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::{AppError, ErrorBody},
    extractors::AppJson,
    lifecycle::EventStatus,
    models::{
        event::{Event, EventPaper, EventSummary, subject_key},
        response::{AttemptResult, NewEventResponse, SubjectScore, SubmitAttemptRequest},
    },
    store::EventStore,
    utils::jwt::Claims,
};

/// The answers submitted for `subject`, matched by [`subject_key`].
fn answers_for<'a>(
    answers: &'a HashMap<String, Vec<Option<u8>>>,
    subject: &str,
) -> Option<&'a Vec<Option<u8>>> {
    let key = subject_key(subject);
    answers
        .iter()
        .find(|(name, _)| subject_key(name) == key)
        .map(|(_, given)| given)
}

/// Whether at least one question of the event received an answer.
/// Answers under subjects the event does not have are ignored.
fn answers_any_question(event: &Event, answers: &HashMap<String, Vec<Option<u8>>>) -> bool {
    event.subjects.iter().any(|slot| {
        answers_for(answers, &slot.subject).is_some_and(|given| {
            given
                .iter()
                .take(slot.questions.len())
                .any(Option::is_some)
        })
    })
}

/// Compares submitted answers against the stored answer keys.
/// Returns (correct, total, per-subject breakdown). Unanswered and unknown
/// entries simply don't score.
fn tally_answers(
    event: &Event,
    answers: &HashMap<String, Vec<Option<u8>>>,
) -> (u32, u32, Vec<SubjectScore>) {
    let subject_scores: Vec<SubjectScore> = event
        .subjects
        .iter()
        .map(|slot| {
            let given = answers_for(answers, &slot.subject);
            let correct = slot
                .questions
                .iter()
                .enumerate()
                .filter(|(i, q)| {
                    given
                        .and_then(|g| g.get(*i).copied().flatten())
                        .is_some_and(|choice| choice == q.correct_answer)
                })
                .count() as u32;
            SubjectScore {
                subject: slot.subject.clone(),
                correct,
                total: slot.questions.len() as u32,
            }
        })
        .collect();

    let correct = subject_scores.iter().map(|s| s.correct).sum();
    let total = subject_scores.iter().map(|s| s.total).sum();
    (correct, total, subject_scores)
}

async fn load_published(store: &dyn EventStore, id: i64) -> Result<Event, AppError> {
    let event = store.load(id).await?;
    // Unpublished events are invisible to students.
    if !event.status.visible_to_students() {
        return Err(AppError::NotFound("Event not found".to_string()));
    }
    Ok(event)
}

/// Published events open for attempts.
/// Student only.
#[utoipa::path(
    get,
    path = "/api/student/events",
    tag = "Student",
    responses((status = 200, description = "Published events", body = Vec<EventSummary>)),
    security(("jwt" = []))
)]
pub async fn list_published_events(
    State(store): State<Arc<dyn EventStore>>,
) -> Result<impl IntoResponse, AppError> {
    let events = store.list(Some(EventStatus::Published)).await?;
    Ok(Json(
        events.iter().map(EventSummary::from).collect::<Vec<_>>(),
    ))
}

/// The exam paper, without answer keys.
/// Student only.
#[utoipa::path(
    get,
    path = "/api/student/events/{id}",
    tag = "Student",
    params(("id" = i64, Path, description = "Event id")),
    responses(
        (status = 200, description = "Exam paper", body = EventPaper),
        (status = 404, description = "No such published event", body = ErrorBody),
    ),
    security(("jwt" = []))
)]
pub async fn get_paper(
    State(store): State<Arc<dyn EventStore>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let event = load_published(store.as_ref(), id).await?;
    Ok(Json(EventPaper::from(&event)))
}

/// Scores and records a student's single attempt.
/// Student only.
#[utoipa::path(
    post,
    path = "/api/student/events/{id}/submit",
    tag = "Student",
    params(("id" = i64, Path, description = "Event id")),
    request_body = SubmitAttemptRequest,
    responses(
        (status = 201, description = "Attempt scored", body = AttemptResult),
        (status = 400, description = "No answers", body = ErrorBody),
        (status = 404, description = "No such published event", body = ErrorBody),
        (status = 409, description = "Already submitted", body = ErrorBody),
    ),
    security(("jwt" = []))
)]
pub async fn submit_attempt(
    State(store): State<Arc<dyn EventStore>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    AppJson(req): AppJson<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let event = load_published(store.as_ref(), id).await?;
    if !answers_any_question(&event, &req.answers) {
        return Err(AppError::BadRequest("No answers submitted".to_string()));
    }
    let (score, total, subject_scores) = tally_answers(&event, &req.answers);

    let saved = store
        .insert_response(NewEventResponse {
            event_id: event.id,
            student_id: claims.user_id()?,
            student_name: claims.name.clone(),
            score,
            total,
            subject_scores,
        })
        .await?;

    tracing::info!(event_id = id, response_id = saved.id, score, total, "attempt recorded");

    let percentage = if total == 0 {
        0.0
    } else {
        f64::from(score) / f64::from(total) * 100.0
    };

    Ok((
        StatusCode::CREATED,
        Json(AttemptResult {
            response_id: saved.id,
            score,
            total,
            percentage,
            subject_scores: saved.subject_scores,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{
        Contributor, contribute,
        test_support::{batch, event, now},
    };

    fn answered_event() -> Event {
        let mut ev = event(2, &["Mathematics", "English"]);
        for (id, subject) in [(1, "Mathematics"), (2, "English")] {
            let t = Contributor {
                teacher_id: id,
                display_name: "T".into(),
                subject: subject.into(),
            };
            // Every generated question has correct_answer = 1.
            contribute(&mut ev, &t, &batch(subject, 2), now()).unwrap();
        }
        ev
    }

    #[test]
    fn tally_perfect() {
        let ev = answered_event();
        let answers = HashMap::from([
            ("Mathematics".to_string(), vec![Some(1), Some(1)]),
            ("English".to_string(), vec![Some(1), Some(1)]),
        ]);

        let (correct, total, by_subject) = tally_answers(&ev, &answers);

        assert_eq!((correct, total), (4, 4));
        assert!(by_subject.iter().all(|s| s.correct == 2));
    }

    #[test]
    fn tally_partial_with_skips() {
        let ev = answered_event();
        let answers = HashMap::from([
            ("Mathematics".to_string(), vec![Some(1), None]),
            ("English".to_string(), vec![Some(0)]),
        ]);

        let (correct, total, by_subject) = tally_answers(&ev, &answers);

        assert_eq!((correct, total), (1, 4));
        assert_eq!(by_subject[0].correct, 1);
        assert_eq!(by_subject[1].correct, 0);
    }

    #[test]
    fn answers_outside_the_event_do_not_count_as_an_attempt() {
        let ev = answered_event();

        let foreign = HashMap::from([("History".to_string(), vec![Some(1)])]);
        assert!(!answers_any_question(&ev, &foreign));

        let past_the_end = HashMap::from([("English".to_string(), vec![None, None, Some(1)])]);
        assert!(!answers_any_question(&ev, &past_the_end));

        let one = HashMap::from([("english".to_string(), vec![None, Some(0)])]);
        assert!(answers_any_question(&ev, &one));
    }

    #[test]
    fn tally_matches_subjects_case_insensitively() {
        let ev = answered_event();
        let answers = HashMap::from([("mathematics".to_string(), vec![Some(1), Some(1)])]);

        let (correct, total, by_subject) = tally_answers(&ev, &answers);

        assert_eq!((correct, total), (2, 4));
        assert_eq!(by_subject[0].subject, "Mathematics");
    }

    #[test]
    fn tally_ignores_unknown_subjects_and_extra_answers() {
        let ev = answered_event();
        let answers = HashMap::from([
            ("History".to_string(), vec![Some(1)]),
            ("Mathematics".to_string(), vec![Some(1), Some(1), Some(1), Some(1)]),
        ]);

        let (correct, total, _) = tally_answers(&ev, &answers);

        assert_eq!((correct, total), (2, 4));
    }
}
