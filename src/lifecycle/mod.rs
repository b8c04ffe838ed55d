//! Contribution and publication lifecycle of a mock exam event.
//!
//! Everything here is a pure function over an [`Event`] snapshot: handlers
//! load the event, run one operation, and persist the mutated snapshot as a
//! single write. Status changes go through [`EventStatus::next`] only.

pub mod contribution;
pub mod gate;
pub mod status;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::event::Event;

pub use contribution::{ContributionResult, Contributor, contribute};
pub use gate::{can_publish, is_complete, publish, shortfalls};
pub use status::{EventStatus, Transition};

/// A subject slot that has not reached the event quota.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Shortfall {
    pub subject: String,
    pub have: u32,
    pub need: u32,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LifecycleError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("question {position}: {reason}")]
    InvalidQuestion { position: usize, reason: String },

    #[error("subject '{0}' is not part of this event")]
    UnknownSubject(String),

    #[error("event is not accepting contributions (status: {0})")]
    NotAccepting(EventStatus),

    #[error("event cannot be published: {} subject(s) below quota", .0.len())]
    Incomplete(Vec<Shortfall>),

    #[error("event is already published")]
    AlreadyPublished,
}

/// Applies `transition` to the event, stamping the matching timestamp.
/// Returns whether the status changed.
pub(crate) fn advance(event: &mut Event, transition: Transition, now: DateTime<Utc>) -> bool {
    let Some(next) = event.status.next(transition) else {
        return false;
    };

    tracing::info!(event_id = event.id, from = %event.status, to = %next, "event status changed");
    event.status = next;
    match next {
        EventStatus::Completed => event.completed_at = Some(now),
        EventStatus::Published => event.published_at = Some(now),
        EventStatus::Active => {}
    }
    event.updated_at = now;
    true
}

/// Recomputes the derived per-slot and per-event question counts.
pub(crate) fn recount(event: &mut Event) {
    for slot in &mut event.subjects {
        slot.question_count = slot.questions.len() as u32;
    }
    event.total_questions = event.subjects.iter().map(|s| s.question_count).sum();
}
