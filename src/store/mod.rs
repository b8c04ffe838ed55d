//! Event storage collaborator.
//!
//! An event, its subject slots and their questions are one document and are
//! always written as a unit. Writes are guarded by the event `version`: a
//! snapshot can only be stored over the version it was loaded from.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    lifecycle::EventStatus,
    models::{
        event::{Event, NewEvent},
        response::{EventResponse, NewEventResponse},
    },
};

pub use memory::MemoryEventStore;
pub use postgres::PgEventStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("event {0} not found")]
    NotFound(i64),

    /// The stored event moved on since the snapshot was loaded.
    #[error("event {event_id} was modified concurrently (expected version {expected})")]
    Conflict { event_id: i64, expected: i64 },

    #[error("student {student_id} already submitted a response to event {event_id}")]
    DuplicateResponse { event_id: i64, student_id: i64 },

    #[error("stored event {event_id} is corrupt: {reason}")]
    Corrupt { event_id: i64, reason: String },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Inserts a new `active` event with one empty slot per subject.
    async fn create(&self, new_event: NewEvent) -> Result<Event, StoreError>;

    async fn load(&self, event_id: i64) -> Result<Event, StoreError>;

    /// Newest first, optionally restricted to one status.
    async fn list(&self, status: Option<EventStatus>) -> Result<Vec<Event>, StoreError>;

    /// Persists the snapshot if the stored version still equals
    /// `event.version`. Returns the snapshot with its new version.
    async fn store(&self, event: &Event) -> Result<Event, StoreError>;

    /// Removes the event together with every response recorded against it.
    /// Returns the removed event.
    async fn delete(&self, event_id: i64) -> Result<Event, StoreError>;

    async fn insert_response(&self, response: NewEventResponse)
    -> Result<EventResponse, StoreError>;

    /// Oldest first.
    async fn list_responses(&self, event_id: i64) -> Result<Vec<EventResponse>, StoreError>;
}
