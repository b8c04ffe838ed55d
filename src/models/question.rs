// src/models/question.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::OPTIONS_PER_QUESTION;

/// A multiple-choice question stored inside a subject slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub options: [String; OPTIONS_PER_QUESTION],
    /// Index into `options`, always in `0..4`.
    pub correct_answer: u8,

    /// `image_urls[i]` and `image_public_ids[i]` describe the same hosted image.
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub image_public_ids: Vec<String>,

    /// Attribution, set when the question arrives through a contribution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_name: Option<String>,
}

impl Question {
    pub fn is_attributed_to(&self, teacher_id: i64) -> bool {
        self.teacher_id == Some(teacher_id)
    }
}

/// One question as submitted by a teacher, before validation.
///
/// Option count and answer range are checked during validation, where the
/// error can name the question's position in the batch.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct QuestionInput {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: i64,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub image_public_ids: Vec<String>,
}

/// Full question as shown to the host and to its author.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionView {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: u8,
    pub image_urls: Vec<String>,
    pub image_public_ids: Vec<String>,
    pub teacher_id: Option<i64>,
    pub teacher_name: Option<String>,
}

impl From<&Question> for QuestionView {
    fn from(q: &Question) -> Self {
        Self {
            question: q.question.clone(),
            options: q.options.to_vec(),
            correct_answer: q.correct_answer,
            image_urls: q.image_urls.clone(),
            image_public_ids: q.image_public_ids.clone(),
            teacher_id: q.teacher_id,
            teacher_name: q.teacher_name.clone(),
        }
    }
}

/// DTO for sending a question to students (excludes answer and attribution).
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicQuestion {
    pub index: usize,
    pub question: String,
    pub options: Vec<String>,
    pub image_urls: Vec<String>,
}
