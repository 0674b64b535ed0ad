//! Response and answer entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::response::{Answer, AnswerView, ExportRow, Response};
use domain::models::survey::QuestionType;
use sqlx::FromRow;

/// Database row mapping for the responses table.
#[derive(Debug, Clone, FromRow)]
pub struct ResponseEntity {
    pub id: i64,
    pub survey_id: i64,
    pub submitted_at: DateTime<Utc>,
    pub employee_identifier: Option<String>,
}

impl From<ResponseEntity> for Response {
    fn from(entity: ResponseEntity) -> Self {
        Self {
            id: entity.id,
            survey_id: entity.survey_id,
            submitted_at: entity.submitted_at,
            employee_identifier: entity.employee_identifier,
        }
    }
}

/// Database row mapping for the answers table.
#[derive(Debug, Clone, FromRow)]
pub struct AnswerEntity {
    pub id: i64,
    pub response_id: i64,
    pub question_id: i64,
    pub rating: Option<i32>,
    pub comment: String,
    pub choice: String,
}

impl From<AnswerEntity> for Answer {
    fn from(entity: AnswerEntity) -> Self {
        Self {
            id: entity.id,
            response_id: entity.response_id,
            question_id: entity.question_id,
            rating: entity.rating,
            comment: entity.comment,
            choice: entity.choice,
        }
    }
}

/// A response joined with its survey title, used by the list page.
#[derive(Debug, Clone, FromRow)]
pub struct ResponseSummaryEntity {
    pub id: i64,
    pub submitted_at: DateTime<Utc>,
    pub survey_id: i64,
    pub survey_title: String,
}

/// An answer joined with its question.
#[derive(Debug, Clone, FromRow)]
pub struct AnswerDetailEntity {
    pub response_id: i64,
    pub question_id: i64,
    pub question_text: String,
    pub question_type: String,
    pub rating: Option<i32>,
    pub comment: String,
    pub choice: String,
}

impl From<AnswerDetailEntity> for AnswerView {
    fn from(entity: AnswerDetailEntity) -> Self {
        Self {
            question_id: entity.question_id,
            question: entity.question_text,
            question_type: parse_question_type(&entity.question_type),
            rating: entity.rating,
            comment: entity.comment,
            choice: entity.choice,
        }
    }
}

/// One flattened answer row for export.
#[derive(Debug, Clone, FromRow)]
pub struct ExportRowEntity {
    pub response_id: i64,
    pub submitted_at: DateTime<Utc>,
    pub survey_id: i64,
    pub survey_title: String,
    pub question_id: i64,
    pub question_text: String,
    pub question_type: String,
    pub rating: Option<i32>,
    pub choice: String,
    pub comment: String,
}

impl From<ExportRowEntity> for ExportRow {
    fn from(entity: ExportRowEntity) -> Self {
        Self {
            response_id: entity.response_id,
            submitted_at: entity.submitted_at,
            survey_id: entity.survey_id,
            survey_title: entity.survey_title,
            question_id: entity.question_id,
            question: entity.question_text,
            question_type: parse_question_type(&entity.question_type),
            rating: entity.rating,
            choice: entity.choice,
            comment: entity.comment,
        }
    }
}

fn parse_question_type(value: &str) -> QuestionType {
    value.parse().unwrap_or(QuestionType::Text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_detail_conversion() {
        let view = AnswerView::from(AnswerDetailEntity {
            response_id: 10,
            question_id: 4,
            question_text: "Region".to_string(),
            question_type: "regions".to_string(),
            rating: None,
            comment: String::new(),
            choice: "Amhara".to_string(),
        });
        assert_eq!(view.question_type, QuestionType::Regions);
        assert_eq!(view.choice, "Amhara");
    }
}
