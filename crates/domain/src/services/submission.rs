//! Validation of public survey submissions.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::models::response::{NewAnswer, SubmitSurveyRequest};
use crate::models::survey::Question;
use shared::validation::{RATING_MAX, RATING_MIN};

/// Reasons a submission is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("Survey not found")]
    SurveyNotFound,

    #[error("One or more questions do not belong to the specified survey")]
    ForeignQuestion,

    #[error("Each question may only be answered once")]
    DuplicateAnswer,

    #[error("Ratings must be between 1 and 5")]
    RatingOutOfRange,

    #[error("A rating is required for required scale questions")]
    MissingRating,

    #[error("A choice is required for required selection questions")]
    MissingChoice,

    #[error("An answer is required for required text questions")]
    MissingComment,

    #[error("Answer exceeds the maximum length of {0} characters")]
    TooLong(i32),
}

/// Checks a submission against the survey's questions and returns the
/// answers to store.
///
/// `questions` must be every question of the submitted survey. Only answered
/// questions are checked; a required question is satisfied by the answer
/// field matching its type.
pub fn validate_submission(
    request: &SubmitSurveyRequest,
    questions: &[Question],
) -> Result<Vec<NewAnswer>, SubmissionError> {
    let by_id: HashMap<i64, &Question> = questions
        .iter()
        .filter(|q| q.survey_id == request.survey)
        .map(|q| (q.id, q))
        .collect();

    if request.answers.iter().any(|a| !by_id.contains_key(&a.question)) {
        return Err(SubmissionError::ForeignQuestion);
    }

    let mut seen = HashSet::with_capacity(request.answers.len());
    let mut answers = Vec::with_capacity(request.answers.len());

    for input in &request.answers {
        if !seen.insert(input.question) {
            return Err(SubmissionError::DuplicateAnswer);
        }
        let question = by_id[&input.question];

        if let Some(rating) = input.rating {
            if !(RATING_MIN..=RATING_MAX).contains(&rating) {
                return Err(SubmissionError::RatingOutOfRange);
            }
        }

        let comment = input.comment.as_deref().unwrap_or("");
        let choice = input.choice.as_deref().unwrap_or("");

        if question.required {
            let qtype = question.question_type;
            if qtype.expects_rating() && input.rating.is_none() {
                return Err(SubmissionError::MissingRating);
            }
            if qtype.expects_choice() && choice.trim().is_empty() {
                return Err(SubmissionError::MissingChoice);
            }
            if qtype.expects_comment() && comment.trim().is_empty() {
                return Err(SubmissionError::MissingComment);
            }
        }

        if let Some(max_chars) = question.max_chars {
            if comment.chars().count() > max_chars.max(0) as usize {
                return Err(SubmissionError::TooLong(max_chars));
            }
        }

        answers.push(NewAnswer::from(input));
    }

    Ok(answers)
}
