use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    lifecycle::EventStatus,
    models::{
        event::{Event, NewEvent, SubjectSlot},
        response::{EventResponse, NewEventResponse},
    },
    store::{EventStore, StoreError},
};

#[derive(Default)]
struct Inner {
    next_event_id: i64,
    next_response_id: i64,
    events: BTreeMap<i64, Event>,
    responses: Vec<EventResponse>,
}

/// Process-local [`EventStore`] with the same versioning rules as the
/// PostgreSQL store. Used by the integration tests.
#[derive(Default)]
pub struct MemoryEventStore {
    inner: RwLock<Inner>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn create(&self, new_event: NewEvent) -> Result<Event, StoreError> {
        let mut inner = self.inner.write().await;
        inner.next_event_id += 1;
        let now = Utc::now();
        let event = Event {
            id: inner.next_event_id,
            title: new_event.title,
            questions_per_subject: new_event.questions_per_subject,
            status: EventStatus::Active,
            subjects: new_event.subjects.into_iter().map(SubjectSlot::empty).collect(),
            total_questions: 0,
            version: 0,
            created_by: new_event.created_by,
            created_at: now,
            updated_at: now,
            completed_at: None,
            published_at: None,
        };
        inner.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn load(&self, event_id: i64) -> Result<Event, StoreError> {
        self.inner
            .read()
            .await
            .events
            .get(&event_id)
            .cloned()
            .ok_or(StoreError::NotFound(event_id))
    }

    async fn list(&self, status: Option<EventStatus>) -> Result<Vec<Event>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .events
            .values()
            .rev()
            .filter(|e| status.is_none_or(|s| e.status == s))
            .cloned()
            .collect())
    }

    async fn store(&self, event: &Event) -> Result<Event, StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .events
            .get_mut(&event.id)
            .ok_or(StoreError::NotFound(event.id))?;

        if stored.version != event.version {
            return Err(StoreError::Conflict {
                event_id: event.id,
                expected: event.version,
            });
        }

        let mut next = event.clone();
        next.version += 1;
        *stored = next.clone();
        Ok(next)
    }

    async fn delete(&self, event_id: i64) -> Result<Event, StoreError> {
        let mut inner = self.inner.write().await;
        let removed = inner
            .events
            .remove(&event_id)
            .ok_or(StoreError::NotFound(event_id))?;
        inner.responses.retain(|r| r.event_id != event_id);
        Ok(removed)
    }

    async fn insert_response(
        &self,
        response: NewEventResponse,
    ) -> Result<EventResponse, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.events.contains_key(&response.event_id) {
            return Err(StoreError::NotFound(response.event_id));
        }
        if inner
            .responses
            .iter()
            .any(|r| r.event_id == response.event_id && r.student_id == response.student_id)
        {
            return Err(StoreError::DuplicateResponse {
                event_id: response.event_id,
                student_id: response.student_id,
            });
        }

        inner.next_response_id += 1;
        let saved = EventResponse {
            id: inner.next_response_id,
            event_id: response.event_id,
            student_id: response.student_id,
            student_name: response.student_name,
            score: response.score,
            total: response.total,
            subject_scores: response.subject_scores,
            submitted_at: Utc::now(),
        };
        inner.responses.push(saved.clone());
        Ok(saved)
    }

    async fn list_responses(&self, event_id: i64) -> Result<Vec<EventResponse>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .responses
            .iter()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect())
    }
}
