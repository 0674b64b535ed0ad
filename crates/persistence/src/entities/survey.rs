//! Survey, section and question entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::survey::{Question, QuestionType, Section, Survey};
use sqlx::FromRow;

/// Database row mapping for the surveys table.
#[derive(Debug, Clone, FromRow)]
pub struct SurveyEntity {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub header_title: String,
    pub header_subtitle: String,
    pub language: String,
    pub is_active: bool,
    pub budget_year: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<SurveyEntity> for Survey {
    fn from(entity: SurveyEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            description: entity.description,
            header_title: entity.header_title,
            header_subtitle: entity.header_subtitle,
            // The column is constrained to known codes.
            language: entity.language.parse().unwrap_or_default(),
            is_active: entity.is_active,
            budget_year: entity.budget_year,
            created_at: entity.created_at,
        }
    }
}

/// Database row mapping for the sections table.
#[derive(Debug, Clone, FromRow)]
pub struct SectionEntity {
    pub id: i64,
    pub survey_id: i64,
    pub title: String,
    pub description: String,
    pub sort_order: i32,
}

impl From<SectionEntity> for Section {
    fn from(entity: SectionEntity) -> Self {
        Self {
            id: entity.id,
            survey_id: entity.survey_id,
            title: entity.title,
            description: entity.description,
            order: entity.sort_order,
        }
    }
}

/// Database row mapping for the questions table.
#[derive(Debug, Clone, FromRow)]
pub struct QuestionEntity {
    pub id: i64,
    pub survey_id: i64,
    pub section_id: Option<i64>,
    pub text: String,
    pub question_type: String,
    pub sort_order: i32,
    pub required: bool,
    pub options: String,
    pub scale_min_label: String,
    pub scale_max_label: String,
    pub linear_scale_labels: Option<serde_json::Value>,
    pub rating_display_style: String,
    pub max_chars: Option<i32>,
}

impl From<QuestionEntity> for Question {
    fn from(entity: QuestionEntity) -> Self {
        Self {
            id: entity.id,
            survey_id: entity.survey_id,
            section_id: entity.section_id,
            text: entity.text,
            question_type: entity
                .question_type
                .parse()
                .unwrap_or(QuestionType::Text),
            order: entity.sort_order,
            required: entity.required,
            options: entity.options,
            scale_min_label: entity.scale_min_label,
            scale_max_label: entity.scale_max_label,
            linear_scale_labels: entity.linear_scale_labels,
            rating_display_style: entity.rating_display_style,
            max_chars: entity.max_chars,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::survey::Language;

    fn question_entity(question_type: &str) -> QuestionEntity {
        QuestionEntity {
            id: 3,
            survey_id: 1,
            section_id: Some(2),
            text: "How satisfied are you?".to_string(),
            question_type: question_type.to_string(),
            sort_order: 4,
            required: true,
            options: String::new(),
            scale_min_label: String::new(),
            scale_max_label: String::new(),
            linear_scale_labels: None,
            rating_display_style: "stars".to_string(),
            max_chars: None,
        }
    }

    #[test]
    fn test_question_entity_conversion() {
        let question = Question::from(question_entity("linear_scale"));
        assert_eq!(question.question_type, QuestionType::LinearScale);
        assert_eq!(question.order, 4);
        assert_eq!(question.section_id, Some(2));
    }

    #[test]
    fn test_survey_language_parsing() {
        let entity = SurveyEntity {
            id: 1,
            title: "Annual".to_string(),
            description: String::new(),
            header_title: String::new(),
            header_subtitle: String::new(),
            language: "am".to_string(),
            is_active: true,
            budget_year: Some(2017),
            created_at: Utc::now(),
        };
        let survey = Survey::from(entity);
        assert_eq!(survey.language, Language::Am);
        assert_eq!(survey.budget_year, Some(2017));
    }
}
