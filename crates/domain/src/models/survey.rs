//! Survey, section and question domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Title given to sections created without one.
pub const UNTITLED_SECTION: &str = "Untitled Section";

/// Point labels used for linear scale questions that were saved without any.
pub fn default_scale_labels() -> serde_json::Value {
    serde_json::json!({
        "1": "Very Dissatisfied",
        "2": "Dissatisfied",
        "3": "Neutral",
        "4": "Satisfied",
        "5": "Very Satisfied"
    })
}

/// Language a survey is presented in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Am,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Am => "am",
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Language::En),
            "am" => Ok(Language::Am),
            _ => Err(format!("Invalid language: {}", s)),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of input a question collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Rating,
    Text,
    Regions,
    Dropdown,
    MultipleChoice,
    LinearScale,
    Paragraph,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Rating => "rating",
            QuestionType::Text => "text",
            QuestionType::Regions => "regions",
            QuestionType::Dropdown => "dropdown",
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::LinearScale => "linear_scale",
            QuestionType::Paragraph => "paragraph",
        }
    }

    /// Scale questions are answered with a 1..=5 rating.
    pub fn expects_rating(&self) -> bool {
        matches!(self, QuestionType::Rating | QuestionType::LinearScale)
    }

    /// Selection questions are answered with one of their options.
    pub fn expects_choice(&self) -> bool {
        matches!(
            self,
            QuestionType::Dropdown | QuestionType::MultipleChoice | QuestionType::Regions
        )
    }

    /// Free-text questions are answered with a comment.
    pub fn expects_comment(&self) -> bool {
        !self.expects_rating() && !self.expects_choice()
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rating" => Ok(QuestionType::Rating),
            "text" => Ok(QuestionType::Text),
            "regions" => Ok(QuestionType::Regions),
            "dropdown" => Ok(QuestionType::Dropdown),
            "multiple_choice" => Ok(QuestionType::MultipleChoice),
            "linear_scale" => Ok(QuestionType::LinearScale),
            "paragraph" => Ok(QuestionType::Paragraph),
            _ => Err(format!("Invalid question type: {}", s)),
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a rating question renders its five points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayStyle {
    Stars,
    Emojis,
    Numbers,
}

impl DisplayStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayStyle::Stars => "stars",
            DisplayStyle::Emojis => "emojis",
            DisplayStyle::Numbers => "numbers",
        }
    }
}

/// A survey row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Survey {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub header_title: String,
    pub header_subtitle: String,
    pub language: Language,
    pub is_active: bool,
    pub budget_year: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// An ordered group of questions within a survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Section {
    pub id: i64,
    pub survey_id: i64,
    pub title: String,
    pub description: String,
    pub order: i32,
}

/// A question row.
///
/// `rating_display_style` is empty for anything but rating questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Question {
    pub id: i64,
    pub survey_id: i64,
    pub section_id: Option<i64>,
    pub text: String,
    pub question_type: QuestionType,
    pub order: i32,
    pub required: bool,
    pub options: String,
    pub scale_min_label: String,
    pub scale_max_label: String,
    pub linear_scale_labels: Option<serde_json::Value>,
    pub rating_display_style: String,
    pub max_chars: Option<i32>,
}

impl Question {
    /// Options of a selection question, one per non-empty line.
    pub fn option_list(&self) -> Vec<&str> {
        self.options
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    }
}

// ============================================================================
// Response DTOs
// ============================================================================

/// Question as rendered to admins and respondents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionView {
    pub id: i64,
    pub text: String,
    pub question_type: QuestionType,
    pub order: i32,
    pub required: bool,
    pub options: String,
    pub scale_min_label: String,
    pub scale_max_label: String,
    pub labels: Option<serde_json::Value>,
    #[serde(rename = "displayStyle")]
    pub display_style: String,
    #[serde(rename = "maxChars")]
    pub max_chars: Option<i32>,
}

impl From<&Question> for QuestionView {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            text: q.text.clone(),
            question_type: q.question_type,
            order: q.order,
            required: q.required,
            options: q.options.clone(),
            scale_min_label: q.scale_min_label.clone(),
            scale_max_label: q.scale_max_label.clone(),
            labels: q.linear_scale_labels.clone(),
            display_style: q.rating_display_style.clone(),
            max_chars: q.max_chars,
        }
    }
}

/// Section with its questions. `id` is null for the virtual section shown
/// when a survey has no sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionView {
    pub id: Option<i64>,
    pub title: String,
    pub description: String,
    pub order: i32,
    pub questions: Vec<QuestionView>,
}

/// Full survey document with nested sections and the flat question list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyDetail {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub header_title: String,
    pub header_subtitle: String,
    pub language: Language,
    pub budget_year: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub sections: Vec<SectionView>,
    pub questions: Vec<QuestionView>,
}

impl SurveyDetail {
    /// Builds the document from rows in any order.
    pub fn assemble(survey: Survey, mut sections: Vec<Section>, mut questions: Vec<Question>) -> Self {
        sections.sort_by_key(|s| (s.order, s.id));
        questions.sort_by_key(|q| (q.order, q.id));

        let section_views = if sections.is_empty() {
            vec![SectionView {
                id: None,
                title: UNTITLED_SECTION.to_string(),
                description: String::new(),
                order: 0,
                questions: questions.iter().map(QuestionView::from).collect(),
            }]
        } else {
            sections
                .iter()
                .map(|s| SectionView {
                    id: Some(s.id),
                    title: s.title.clone(),
                    description: s.description.clone(),
                    order: s.order,
                    questions: questions
                        .iter()
                        .filter(|q| q.section_id == Some(s.id))
                        .map(QuestionView::from)
                        .collect(),
                })
                .collect()
        };

        Self {
            id: survey.id,
            title: survey.title,
            description: survey.description,
            header_title: survey.header_title,
            header_subtitle: survey.header_subtitle,
            language: survey.language,
            budget_year: survey.budget_year,
            is_active: survey.is_active,
            created_at: survey.created_at,
            sections: section_views,
            questions: questions.iter().map(QuestionView::from).collect(),
        }
    }
}

/// Active survey as served to respondents.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveSurveyResponse {
    #[serde(flatten)]
    pub survey: SurveyDetail,
    pub has_responded: bool,
    pub client_ip: Option<String>,
}

// ============================================================================
// Request DTOs
// ============================================================================

/// Question payload used by survey create and update.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuestionInput {
    pub id: Option<i64>,

    #[validate(length(max = 300, message = "Question text must be at most 300 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub text: String,

    pub question_type: QuestionType,

    pub order: Option<i32>,

    pub required: Option<bool>,

    pub options: Option<String>,

    #[validate(length(max = 100, message = "Scale labels must be at most 100 characters"))]
    pub scale_min_label: Option<String>,

    #[validate(length(max = 100, message = "Scale labels must be at most 100 characters"))]
    pub scale_max_label: Option<String>,

    pub labels: Option<serde_json::Value>,

    #[serde(rename = "displayStyle")]
    pub display_style: Option<DisplayStyle>,

    #[serde(rename = "maxChars")]
    #[validate(custom(function = "shared::validation::validate_max_chars"))]
    pub max_chars: Option<i32>,
}

/// Section payload used by survey create and update.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SectionInput {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub order: Option<i32>,
    #[validate(nested)]
    pub questions: Option<Vec<QuestionInput>>,
}

/// Request payload for creating a survey.
///
/// `questions` is the legacy flat form, used only when `sections` is absent.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSurveyRequest {
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub header_title: String,

    #[serde(default)]
    pub header_subtitle: String,

    #[serde(default)]
    pub language: Language,

    pub budget_year: Option<i32>,

    #[serde(default)]
    pub is_active: bool,

    #[validate(nested)]
    pub sections: Option<Vec<SectionInput>>,

    #[validate(nested)]
    pub questions: Option<Vec<QuestionInput>>,
}

/// Request payload for partially updating a survey.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateSurveyRequest {
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub title: Option<String>,

    pub description: Option<String>,

    pub header_title: Option<String>,

    pub header_subtitle: Option<String>,

    pub language: Option<Language>,

    pub budget_year: Option<i32>,

    pub is_active: Option<bool>,

    #[validate(nested)]
    pub sections: Option<Vec<SectionInput>>,

    #[validate(nested)]
    pub questions: Option<Vec<QuestionInput>>,
}

/// Scalar survey fields after defaults are applied, ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSurvey {
    pub title: String,
    pub description: String,
    pub header_title: String,
    pub header_subtitle: String,
    pub language: Language,
    pub budget_year: i32,
    pub is_active: bool,
}

impl CreateSurveyRequest {
    /// Scalar fields to insert; a missing budget year becomes `current_year`.
    pub fn new_survey(&self, current_year: i32) -> NewSurvey {
        NewSurvey {
            title: self.title.trim().to_string(),
            description: self.description.clone(),
            header_title: self.header_title.clone(),
            header_subtitle: self.header_subtitle.clone(),
            language: self.language,
            budget_year: self.budget_year.unwrap_or(current_year),
            is_active: self.is_active,
        }
    }
}

/// Scalar survey fields to overwrite on update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurveyChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub header_title: Option<String>,
    pub header_subtitle: Option<String>,
    pub language: Option<Language>,
    pub budget_year: Option<i32>,
    pub is_active: Option<bool>,
}

impl From<&UpdateSurveyRequest> for SurveyChanges {
    fn from(req: &UpdateSurveyRequest) -> Self {
        Self {
            title: req.title.clone(),
            description: req.description.clone(),
            header_title: req.header_title.clone(),
            header_subtitle: req.header_subtitle.clone(),
            language: req.language,
            budget_year: req.budget_year,
            is_active: req.is_active,
        }
    }
}
