// src/models/event.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    config::MAX_QUESTIONS_PER_SUBJECT,
    lifecycle::EventStatus,
    models::question::{PublicQuestion, Question, QuestionInput, QuestionView},
};

/// Per-subject question collection and contribution ledger inside an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectSlot {
    pub subject: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    /// Cached `questions.len()`.
    #[serde(default)]
    pub question_count: u32,
    /// Teacher id -> number of questions that teacher last contributed here.
    #[serde(default)]
    pub teacher_contributions: BTreeMap<i64, u32>,
}

impl SubjectSlot {
    pub fn empty(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            questions: Vec::new(),
            question_count: 0,
            teacher_contributions: BTreeMap::new(),
        }
    }

    pub fn questions_by(&self, teacher_id: i64) -> impl Iterator<Item = &Question> {
        self.questions
            .iter()
            .filter(move |q| q.is_attributed_to(teacher_id))
    }
}

/// A host-created mock exam spanning several subjects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub questions_per_subject: u32,
    pub status: EventStatus,
    pub subjects: Vec<SubjectSlot>,
    /// Cached sum of every slot's `question_count`.
    pub total_questions: u32,
    /// Optimistic concurrency token, bumped by the store on every write.
    pub version: i64,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Subject names compare trimmed and case-insensitively everywhere:
/// duplicate detection at creation, slot lookup, answer sheets.
pub fn subject_key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl Event {
    pub fn slot(&self, subject: &str) -> Option<&SubjectSlot> {
        let key = subject_key(subject);
        self.subjects.iter().find(|s| subject_key(&s.subject) == key)
    }

    pub fn slot_mut(&mut self, subject: &str) -> Option<&mut SubjectSlot> {
        let key = subject_key(subject);
        self.subjects.iter_mut().find(|s| subject_key(&s.subject) == key)
    }

    /// Every hosted image public id referenced by any question.
    pub fn image_public_ids(&self) -> Vec<String> {
        self.subjects
            .iter()
            .flat_map(|slot| slot.questions.iter())
            .flat_map(|q| q.image_public_ids.iter().cloned())
            .collect()
    }
}

/// Data needed to insert a fresh event; slots start empty.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub questions_per_subject: u32,
    pub subjects: Vec<String>,
    pub created_by: i64,
}

/// DTO for a host creating an event.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters."))]
    pub title: String,
    #[validate(range(min = 1, max = MAX_QUESTIONS_PER_SUBJECT))]
    pub questions_per_subject: u32,
    /// Defaults to the configured subject list when omitted.
    #[validate(length(min = 1, max = 20))]
    pub subjects: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct EventListParams {
    pub status: Option<EventStatus>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubjectProgress {
    pub subject: String,
    pub question_count: u32,
    pub questions_per_subject: u32,
}

/// Compact event listing row.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventSummary {
    pub id: i64,
    pub title: String,
    pub status: EventStatus,
    pub questions_per_subject: u32,
    pub total_questions: u32,
    pub subjects: Vec<SubjectProgress>,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<&Event> for EventSummary {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id,
            title: event.title.clone(),
            status: event.status,
            questions_per_subject: event.questions_per_subject,
            total_questions: event.total_questions,
            subjects: event
                .subjects
                .iter()
                .map(|slot| SubjectProgress {
                    subject: slot.subject.clone(),
                    question_count: slot.question_count,
                    questions_per_subject: event.questions_per_subject,
                })
                .collect(),
            created_at: event.created_at,
            published_at: event.published_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ContributionEntry {
    pub teacher_id: i64,
    pub count: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubjectSlotView {
    pub subject: String,
    pub question_count: u32,
    pub teacher_contributions: Vec<ContributionEntry>,
    pub questions: Vec<QuestionView>,
}

/// Full event as seen by the host.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventDetail {
    pub id: i64,
    pub title: String,
    pub status: EventStatus,
    pub questions_per_subject: u32,
    pub total_questions: u32,
    pub subjects: Vec<SubjectSlotView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<&Event> for EventDetail {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id,
            title: event.title.clone(),
            status: event.status,
            questions_per_subject: event.questions_per_subject,
            total_questions: event.total_questions,
            subjects: event
                .subjects
                .iter()
                .map(|slot| SubjectSlotView {
                    subject: slot.subject.clone(),
                    question_count: slot.question_count,
                    teacher_contributions: slot
                        .teacher_contributions
                        .iter()
                        .map(|(&teacher_id, &count)| ContributionEntry { teacher_id, count })
                        .collect(),
                    questions: slot.questions.iter().map(QuestionView::from).collect(),
                })
                .collect(),
            created_at: event.created_at,
            updated_at: event.updated_at,
            completed_at: event.completed_at,
            published_at: event.published_at,
        }
    }
}

/// What a teacher sees when opening an event: progress plus their own questions.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeacherEventView {
    pub event: EventSummary,
    pub subject: String,
    pub accepting_contributions: bool,
    pub existing_questions: Vec<QuestionView>,
}

/// DTO for a teacher's contribution: the full replacement batch.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ContributeRequest {
    pub questions: Vec<QuestionInput>,
}

/// One subject of a published paper, answer keys stripped.
#[derive(Debug, Serialize, ToSchema)]
pub struct PaperSection {
    pub subject: String,
    pub questions: Vec<PublicQuestion>,
}

/// A published event as delivered to students.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventPaper {
    pub id: i64,
    pub title: String,
    pub total_questions: u32,
    pub sections: Vec<PaperSection>,
}

impl From<&Event> for EventPaper {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id,
            title: event.title.clone(),
            total_questions: event.total_questions,
            sections: event
                .subjects
                .iter()
                .map(|slot| PaperSection {
                    subject: slot.subject.clone(),
                    questions: slot
                        .questions
                        .iter()
                        .enumerate()
                        .map(|(index, q)| PublicQuestion {
                            index,
                            question: q.question.clone(),
                            options: q.options.to_vec(),
                            image_urls: q.image_urls.clone(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}
