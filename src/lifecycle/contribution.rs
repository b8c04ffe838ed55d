use std::{collections::HashSet, sync::LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use url::Url;
use utoipa::ToSchema;

use crate::{
    config::{MAX_BATCH_SIZE, MAX_IMAGES_PER_QUESTION, OPTIONS_PER_QUESTION},
    lifecycle::{EventStatus, LifecycleError, Transition, advance, gate, recount},
    models::{event::Event, question::Question, question::QuestionInput},
};

const MAX_QUESTION_LEN: usize = 2000;
const MAX_OPTION_LEN: usize = 500;

static PUBLIC_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_./-]{1,255}$").expect("valid public id pattern"));

/// The authenticated teacher behind a contribution.
#[derive(Debug, Clone)]
pub struct Contributor {
    pub teacher_id: i64,
    pub display_name: String,
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ContributionResult {
    pub accepted_count: u32,
    pub subject_total_after: u32,
    pub event_status_after: EventStatus,
}

/// A question that passed validation, text already trimmed.
#[derive(Debug, Clone)]
struct ValidQuestion {
    question: String,
    options: [String; OPTIONS_PER_QUESTION],
    correct_answer: u8,
    image_urls: Vec<String>,
    image_public_ids: Vec<String>,
}

/// A batch in which every question passed validation.
/// Only [`ContributionBatch::parse`] can build one.
#[derive(Debug, Clone)]
struct ContributionBatch(Vec<ValidQuestion>);

impl ContributionBatch {
    fn parse(inputs: &[QuestionInput]) -> Result<Self, LifecycleError> {
        inputs
            .iter()
            .enumerate()
            .map(|(i, input)| {
                validate_question(input).map_err(|reason| LifecycleError::InvalidQuestion {
                    position: i + 1,
                    reason,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(ContributionBatch)
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

fn validate_question(input: &QuestionInput) -> Result<ValidQuestion, String> {
    let question = input.question.trim();
    if question.is_empty() {
        return Err("question text must not be empty".to_string());
    }
    if question.chars().count() > MAX_QUESTION_LEN {
        return Err(format!("question text exceeds {MAX_QUESTION_LEN} characters"));
    }

    if input.options.len() != OPTIONS_PER_QUESTION {
        return Err(format!(
            "expected exactly {OPTIONS_PER_QUESTION} options, got {}",
            input.options.len()
        ));
    }

    let trimmed: Vec<String> = input.options.iter().map(|o| o.trim().to_string()).collect();
    if let Some(i) = trimmed.iter().position(String::is_empty) {
        return Err(format!("option {} must not be empty", i + 1));
    }
    if let Some(i) = trimmed.iter().position(|o| o.chars().count() > MAX_OPTION_LEN) {
        return Err(format!("option {} exceeds {MAX_OPTION_LEN} characters", i + 1));
    }
    let distinct: HashSet<&str> = trimmed.iter().map(String::as_str).collect();
    if distinct.len() != trimmed.len() {
        return Err("options must be distinct".to_string());
    }

    let correct_answer = u8::try_from(input.correct_answer)
        .ok()
        .filter(|&idx| usize::from(idx) < OPTIONS_PER_QUESTION)
        .ok_or_else(|| {
            format!(
                "correct answer must be between 0 and {}, got {}",
                OPTIONS_PER_QUESTION - 1,
                input.correct_answer
            )
        })?;

    validate_images(&input.image_urls, &input.image_public_ids)?;

    let options: [String; OPTIONS_PER_QUESTION] = trimmed
        .try_into()
        .map_err(|_| "expected exactly 4 options".to_string())?;

    Ok(ValidQuestion {
        question: question.to_string(),
        options,
        correct_answer,
        image_urls: input.image_urls.iter().map(|u| u.trim().to_string()).collect(),
        image_public_ids: input
            .image_public_ids
            .iter()
            .map(|p| p.trim().to_string())
            .collect(),
    })
}

fn validate_images(urls: &[String], public_ids: &[String]) -> Result<(), String> {
    if urls.len() != public_ids.len() {
        return Err("image_urls and image_public_ids must have the same length".to_string());
    }
    if urls.len() > MAX_IMAGES_PER_QUESTION {
        return Err(format!("at most {MAX_IMAGES_PER_QUESTION} images are allowed"));
    }
    for (i, raw) in urls.iter().enumerate() {
        let parsed = Url::parse(raw.trim()).map_err(|_| format!("image {} has an invalid URL", i + 1))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(format!("image {} must use http or https", i + 1));
        }
    }
    if let Some(i) = public_ids.iter().position(|p| !PUBLIC_ID_RE.is_match(p.trim())) {
        return Err(format!("image {} has an invalid public id", i + 1));
    }
    Ok(())
}

/// Replaces every question `contributor` previously placed in their subject
/// slot with `inputs`, then advances the event to `completed` if this made
/// every slot meet the quota.
///
/// Validation runs to completion before the snapshot is touched, so on error
/// the event is unchanged.
pub fn contribute(
    event: &mut Event,
    contributor: &Contributor,
    inputs: &[QuestionInput],
    now: DateTime<Utc>,
) -> Result<ContributionResult, LifecycleError> {
    if inputs.is_empty() {
        return Err(LifecycleError::InvalidInput(
            "at least one question is required".to_string(),
        ));
    }
    if inputs.len() > MAX_BATCH_SIZE {
        return Err(LifecycleError::InvalidInput(format!(
            "a contribution may contain at most {MAX_BATCH_SIZE} questions"
        )));
    }
    if !event.status.accepts_contributions() {
        return Err(LifecycleError::NotAccepting(event.status));
    }
    if event.slot(&contributor.subject).is_none() {
        return Err(LifecycleError::UnknownSubject(contributor.subject.clone()));
    }

    let batch = ContributionBatch::parse(inputs)?;
    Ok(apply(event, contributor, batch, now))
}

fn apply(
    event: &mut Event,
    contributor: &Contributor,
    batch: ContributionBatch,
    now: DateTime<Utc>,
) -> ContributionResult {
    let accepted_count = batch.len() as u32;

    if let Some(slot) = event.slot_mut(&contributor.subject) {
        slot.questions
            .retain(|q| !q.is_attributed_to(contributor.teacher_id));
        slot.questions.extend(batch.0.into_iter().map(|q| Question {
            question: q.question,
            options: q.options,
            correct_answer: q.correct_answer,
            image_urls: q.image_urls,
            image_public_ids: q.image_public_ids,
            teacher_id: Some(contributor.teacher_id),
            teacher_name: Some(contributor.display_name.clone()),
        }));
        slot.teacher_contributions
            .insert(contributor.teacher_id, accepted_count);
    }

    recount(event);
    event.updated_at = now;

    if gate::is_complete(event) {
        advance(event, Transition::QuotaMet, now);
    }

    ContributionResult {
        accepted_count,
        subject_total_after: event
            .slot(&contributor.subject)
            .map(|s| s.question_count)
            .unwrap_or_default(),
        event_status_after: event.status,
    }
}
