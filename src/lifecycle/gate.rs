use chrono::{DateTime, Utc};

use crate::{
    lifecycle::{EventStatus, LifecycleError, Shortfall, Transition, advance, recount},
    models::event::Event,
};

/// Every subject slot that is still below the event quota, in slot order.
pub fn shortfalls(event: &Event) -> Vec<Shortfall> {
    event
        .subjects
        .iter()
        .filter(|slot| slot.question_count < event.questions_per_subject)
        .map(|slot| Shortfall {
            subject: slot.subject.clone(),
            have: slot.question_count,
            need: event.questions_per_subject,
        })
        .collect()
}

pub fn is_complete(event: &Event) -> bool {
    event
        .subjects
        .iter()
        .all(|slot| slot.question_count >= event.questions_per_subject)
}

/// Independent of the current status: an active event that already meets
/// every quota may be published directly.
pub fn can_publish(event: &Event) -> bool {
    is_complete(event)
}

/// Moves a complete event to `published`, passing through `completed` when
/// it is still `active`.
pub fn publish(event: &mut Event, now: DateTime<Utc>) -> Result<EventStatus, LifecycleError> {
    if event.status.is_terminal() {
        return Err(LifecycleError::AlreadyPublished);
    }

    recount(event);
    if !can_publish(event) {
        return Err(LifecycleError::Incomplete(shortfalls(event)));
    }

    advance(event, Transition::QuotaMet, now);
    advance(event, Transition::Publish, now);
    Ok(event.status)
}
