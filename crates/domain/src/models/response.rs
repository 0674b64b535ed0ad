//! Submission, answer and response-browsing models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::survey::QuestionType;

/// One stored submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub id: i64,
    pub survey_id: i64,
    pub submitted_at: DateTime<Utc>,
    pub employee_identifier: Option<String>,
}

/// One answer within a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub response_id: i64,
    pub question_id: i64,
    pub rating: Option<i32>,
    pub comment: String,
    pub choice: String,
}

// ============================================================================
// Request DTOs
// ============================================================================

/// A single answer in a submission payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AnswerInput {
    pub question: i64,

    #[validate(custom(function = "shared::validation::validate_rating"))]
    pub rating: Option<i32>,

    pub comment: Option<String>,

    #[validate(length(max = 300, message = "Choice must be at most 300 characters"))]
    pub choice: Option<String>,
}

/// Public submission payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitSurveyRequest {
    pub survey: i64,

    #[validate(nested)]
    pub answers: Vec<AnswerInput>,
}

/// Answer ready to insert, with blanks normalized to empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAnswer {
    pub question_id: i64,
    pub rating: Option<i32>,
    pub comment: String,
    pub choice: String,
}

impl From<&AnswerInput> for NewAnswer {
    fn from(input: &AnswerInput) -> Self {
        Self {
            question_id: input.question,
            rating: input.rating,
            comment: input.comment.clone().unwrap_or_default(),
            choice: input.choice.clone().unwrap_or_default(),
        }
    }
}

// ============================================================================
// Browsing and export
// ============================================================================

/// Filters shared by the response list and the exports.
///
/// Unparseable query values are dropped before this is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseFilter {
    pub survey_id: Option<i64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub question_id: Option<i64>,
    pub rating_min: Option<i32>,
    pub rating_max: Option<i32>,
}

impl ResponseFilter {
    /// True when any answer-level condition is set.
    pub fn has_answer_conditions(&self) -> bool {
        self.question_id.is_some() || self.rating_min.is_some() || self.rating_max.is_some()
    }
}

/// Raw query string for response listing and export.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseQuery {
    pub survey: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub question: Option<String>,
    pub rating_min: Option<String>,
    pub rating_max: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl ResponseQuery {
    /// Resolves the query into typed filters, ignoring malformed values.
    pub fn filter(&self) -> ResponseFilter {
        use shared::validation::{parse_date_param, parse_int_param};

        ResponseFilter {
            survey_id: parse_int_param(self.survey.as_deref()),
            from: parse_date_param(self.from.as_deref()),
            to: parse_date_param(self.to.as_deref()),
            question_id: parse_int_param(self.question.as_deref()),
            rating_min: parse_int_param(self.rating_min.as_deref()).map(clamp_i32),
            rating_max: parse_int_param(self.rating_max.as_deref()).map(clamp_i32),
        }
    }
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Survey reference embedded in listed responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyRef {
    pub id: i64,
    pub title: String,
}

/// Answer as listed to admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerView {
    pub question_id: i64,
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub rating: Option<i32>,
    pub comment: String,
    pub choice: String,
}

/// One row of the response list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseListItem {
    pub id: i64,
    pub submitted_at: DateTime<Utc>,
    pub survey: SurveyRef,
    pub answers: Vec<AnswerView>,
}

/// Paginated response list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseListPage {
    pub count: i64,
    pub page: i64,
    pub page_size: i64,
    pub results: Vec<ResponseListItem>,
}

/// One flattened answer for spreadsheet and PDF export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub response_id: i64,
    pub submitted_at: DateTime<Utc>,
    pub survey_id: i64,
    pub survey_title: String,
    pub question_id: i64,
    pub question: String,
    pub question_type: QuestionType,
    pub rating: Option<i32>,
    pub choice: String,
    pub comment: String,
}

/// Column headings shared by both export formats.
pub const EXPORT_HEADERS: [&str; 10] = [
    "Response ID",
    "Submitted At",
    "Survey ID",
    "Survey Title",
    "Question ID",
    "Question",
    "Type",
    "Rating",
    "Choice",
    "Comment",
];

impl ExportRow {
    /// Cell values in [`EXPORT_HEADERS`] order.
    pub fn cells(&self) -> [String; 10] {
        [
            self.response_id.to_string(),
            self.submitted_at.to_rfc3339(),
            self.survey_id.to_string(),
            crate::services::text::strip_tags(&self.survey_title),
            self.question_id.to_string(),
            self.question.clone(),
            self.question_type.as_str().to_string(),
            self.rating.map(|r| r.to_string()).unwrap_or_default(),
            self.choice.clone(),
            self.comment.clone(),
        ]
    }
}
