// src/models/response.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Correct answers within a single subject of an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SubjectScore {
    pub subject: String,
    pub correct: u32,
    pub total: u32,
}

/// A student's recorded attempt at a published event.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventResponse {
    pub id: i64,
    pub event_id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub score: u32,
    pub total: u32,
    pub subject_scores: Vec<SubjectScore>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEventResponse {
    pub event_id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub score: u32,
    pub total: u32,
    pub subject_scores: Vec<SubjectScore>,
}

/// DTO for submitting an attempt.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitAttemptRequest {
    /// Subject name -> chosen option index per question, in paper order.
    /// `null` marks an unanswered question.
    pub answers: HashMap<String, Vec<Option<u8>>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttemptResult {
    pub response_id: i64,
    pub score: u32,
    pub total: u32,
    pub percentage: f64,
    pub subject_scores: Vec<SubjectScore>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubjectAverage {
    pub subject: String,
    pub average_percentage: f64,
}

/// Aggregated results of an event for the host.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventResults {
    pub event_id: i64,
    pub title: String,
    pub attempts: usize,
    pub average_percentage: f64,
    pub best_score: Option<u32>,
    pub subject_averages: Vec<SubjectAverage>,
    pub responses: Vec<EventResponse>,
}
