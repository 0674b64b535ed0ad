//! Survey structure reconciliation.
//!
//! Survey editors submit the whole section/question tree. Creating a survey
//! normalizes that tree into drafts; updating one compares it with the stored
//! rows and produces a [`SyncPlan`] listing the rows to create, update and
//! delete. The plan is applied by the persistence layer in one transaction.

use std::collections::{HashMap, HashSet};

use crate::models::survey::{
    default_scale_labels, Question, QuestionInput, QuestionType, Section, SectionInput,
    UpdateSurveyRequest, UNTITLED_SECTION,
};

/// Question columns as they will be written.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionDraft {
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

impl From<&Question> for QuestionDraft {
    fn from(q: &Question) -> Self {
        Self {
            text: q.text.clone(),
            question_type: q.question_type,
            order: q.order,
            required: q.required,
            options: q.options.clone(),
            scale_min_label: q.scale_min_label.clone(),
            scale_max_label: q.scale_max_label.clone(),
            linear_scale_labels: q.linear_scale_labels.clone(),
            rating_display_style: q.rating_display_style.clone(),
            max_chars: q.max_chars,
        }
    }
}

/// Section columns as they will be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionFields {
    pub title: String,
    pub description: String,
    pub order: i32,
}

/// A section to insert together with its questions (create path).
#[derive(Debug, Clone, PartialEq)]
pub struct SectionDraft {
    pub fields: SectionFields,
    pub questions: Vec<QuestionDraft>,
}

/// Where a planned question lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionTarget {
    /// A section already stored under this id.
    Existing(i64),
    /// The n-th entry of [`SyncPlan::create_sections`].
    New(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionUpdate {
    pub id: i64,
    pub fields: SectionFields,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionUpdate {
    pub id: i64,
    pub section: SectionTarget,
    pub fields: QuestionDraft,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionCreate {
    pub section: SectionTarget,
    pub fields: QuestionDraft,
}

/// Row changes needed to make a stored survey match an edited tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncPlan {
    pub create_sections: Vec<SectionFields>,
    pub update_sections: Vec<SectionUpdate>,
    pub update_questions: Vec<QuestionUpdate>,
    pub create_questions: Vec<QuestionCreate>,
    pub delete_questions: Vec<i64>,
    pub delete_sections: Vec<i64>,
}

impl SyncPlan {
    /// True when applying the plan would not touch any row.
    pub fn is_noop(&self) -> bool {
        self.create_sections.is_empty()
            && self.update_sections.is_empty()
            && self.update_questions.is_empty()
            && self.create_questions.is_empty()
            && self.delete_questions.is_empty()
            && self.delete_sections.is_empty()
    }
}

fn section_fields(input: &SectionInput, position: usize) -> SectionFields {
    let title = input
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(UNTITLED_SECTION);
    SectionFields {
        title: title.to_string(),
        description: input.description.as_deref().unwrap_or("").trim().to_string(),
        order: input.order.unwrap_or(position as i32),
    }
}

/// Picks `labels[key]` when it is a non-empty string.
fn label_override(labels: Option<&serde_json::Value>, key: &str) -> Option<String> {
    labels
        .and_then(|l| l.as_object())
        .and_then(|map| map.get(key))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Point labels stored for a question.
///
/// Explicit objects are kept as sent; scale questions without them get the
/// default five labels, with the end labels as points 1 and 5 for linear scales.
fn resolve_point_labels(
    question_type: QuestionType,
    labels: Option<&serde_json::Value>,
    min_label: &str,
    max_label: &str,
) -> Option<serde_json::Value> {
    match labels {
        Some(value) if value.is_object() => Some(value.clone()),
        _ => match question_type {
            QuestionType::Rating => Some(default_scale_labels()),
            QuestionType::LinearScale => {
                let mut defaults = default_scale_labels();
                if let Some(map) = defaults.as_object_mut() {
                    if !min_label.is_empty() {
                        map.insert("1".to_string(), min_label.into());
                    }
                    if !max_label.is_empty() {
                        map.insert("5".to_string(), max_label.into());
                    }
                }
                Some(defaults)
            }
            _ => None,
        },
    }
}

/// Builds the draft for a question that does not exist yet.
pub fn question_draft(input: &QuestionInput, position: usize) -> QuestionDraft {
    let labels = input.labels.as_ref();
    let scale_min_label = label_override(labels, "1")
        .unwrap_or_else(|| input.scale_min_label.clone().unwrap_or_default());
    let scale_max_label = label_override(labels, "5")
        .unwrap_or_else(|| input.scale_max_label.clone().unwrap_or_default());
    let rating_display_style = if input.question_type == QuestionType::Rating {
        input
            .display_style
            .map(|s| s.as_str())
            .unwrap_or("stars")
            .to_string()
    } else {
        String::new()
    };

    QuestionDraft {
        text: input.text.trim().to_string(),
        question_type: input.question_type,
        order: input.order.unwrap_or(position as i32),
        required: input.required.unwrap_or(true),
        options: input.options.clone().unwrap_or_default(),
        linear_scale_labels: resolve_point_labels(
            input.question_type,
            labels,
            &scale_min_label,
            &scale_max_label,
        ),
        scale_min_label,
        scale_max_label,
        rating_display_style,
        max_chars: input.max_chars,
    }
}

/// Builds the draft for an edit of a stored question.
///
/// Blank text keeps the stored text; rating questions without a display
/// style keep their stored style, falling back to stars.
fn merged_question_draft(existing: &Question, input: &QuestionInput, position: usize) -> QuestionDraft {
    let mut draft = question_draft(input, position);
    if draft.text.is_empty() {
        draft.text = existing.text.clone();
    }
    if draft.question_type == QuestionType::Rating && input.display_style.is_none() {
        draft.rating_display_style = if existing.rating_display_style.is_empty() {
            "stars".to_string()
        } else {
            existing.rating_display_style.clone()
        };
    }
    draft
}

/// Normalizes the tree of a new survey into section drafts.
///
/// Without `sections`, the legacy flat `questions` list becomes a single
/// untitled section.
pub fn normalize_new_survey(
    sections: Option<&[SectionInput]>,
    questions: Option<&[QuestionInput]>,
) -> Vec<SectionDraft> {
    match sections {
        Some(sections) => sections
            .iter()
            .enumerate()
            .map(|(pos, s)| SectionDraft {
                fields: section_fields(s, pos),
                questions: s
                    .questions
                    .as_deref()
                    .unwrap_or(&[])
                    .iter()
                    .enumerate()
                    .map(|(idx, q)| question_draft(q, idx))
                    .collect(),
            })
            .collect(),
        None => vec![SectionDraft {
            fields: SectionFields {
                title: UNTITLED_SECTION.to_string(),
                description: String::new(),
                order: 0,
            },
            questions: questions
                .unwrap_or(&[])
                .iter()
                .enumerate()
                .map(|(idx, q)| question_draft(q, idx))
                .collect(),
        }],
    }
}

/// Wraps a legacy flat question list into the first stored section, or into
/// a new untitled section when the survey has none.
pub fn legacy_sections(first_section: Option<&Section>, questions: Vec<QuestionInput>) -> Vec<SectionInput> {
    let section = match first_section {
        Some(s) => SectionInput {
            id: Some(s.id),
            title: Some(s.title.clone()),
            description: Some(s.description.clone()),
            order: Some(s.order),
            questions: Some(questions),
        },
        None => SectionInput {
            id: None,
            title: Some(UNTITLED_SECTION.to_string()),
            description: Some(String::new()),
            order: Some(0),
            questions: Some(questions),
        },
    };
    vec![section]
}

/// Structural part of a survey edit.
#[derive(Debug, Clone)]
pub enum TreeEdit {
    /// Full section tree.
    Sections(Vec<SectionInput>),
    /// Legacy flat question list for the first section.
    LegacyQuestions(Vec<QuestionInput>),
}

impl TreeEdit {
    /// `sections` wins over `questions`; `None` for a fields-only edit.
    pub fn from_request(request: &UpdateSurveyRequest) -> Option<Self> {
        match (&request.sections, &request.questions) {
            (Some(sections), _) => Some(TreeEdit::Sections(sections.clone())),
            (None, Some(questions)) => Some(TreeEdit::LegacyQuestions(questions.clone())),
            (None, None) => None,
        }
    }

    /// Plans the edit against the stored tree. Legacy questions go to the
    /// section with the lowest `(order, id)`.
    pub fn plan(&self, existing_sections: &[Section], existing_questions: &[Question]) -> SyncPlan {
        match self {
            TreeEdit::Sections(payload) => plan_update(existing_sections, existing_questions, payload),
            TreeEdit::LegacyQuestions(questions) => {
                let first = existing_sections.iter().min_by_key(|s| (s.order, s.id));
                let payload = legacy_sections(first, questions.clone());
                plan_update(existing_sections, existing_questions, &payload)
            }
        }
    }
}

/// Plans the changes that turn the stored tree into `payload`.
///
/// Sections and questions are matched by id among the survey's own rows; an
/// id is matched at most once, later repeats are created as new rows. Stored
/// rows the payload no longer mentions are deleted.
pub fn plan_update(
    existing_sections: &[Section],
    existing_questions: &[Question],
    payload: &[SectionInput],
) -> SyncPlan {
    let sections_by_id: HashMap<i64, &Section> =
        existing_sections.iter().map(|s| (s.id, s)).collect();
    let questions_by_id: HashMap<i64, &Question> =
        existing_questions.iter().map(|q| (q.id, q)).collect();

    let mut plan = SyncPlan::default();
    let mut kept_sections: HashSet<i64> = HashSet::new();
    let mut kept_questions: HashSet<i64> = HashSet::new();

    for (s_pos, input) in payload.iter().enumerate() {
        let fields = section_fields(input, s_pos);
        let matched = input
            .id
            .and_then(|id| sections_by_id.get(&id).copied())
            .filter(|s| !kept_sections.contains(&s.id));

        let target = match matched {
            Some(stored) => {
                kept_sections.insert(stored.id);
                let unchanged = stored.title == fields.title
                    && stored.description == fields.description
                    && stored.order == fields.order;
                if !unchanged {
                    plan.update_sections.push(SectionUpdate {
                        id: stored.id,
                        fields,
                    });
                }
                SectionTarget::Existing(stored.id)
            }
            None => {
                plan.create_sections.push(fields);
                SectionTarget::New(plan.create_sections.len() - 1)
            }
        };

        for (q_pos, q) in input.questions.as_deref().unwrap_or(&[]).iter().enumerate() {
            let matched = q
                .id
                .and_then(|id| questions_by_id.get(&id).copied())
                .filter(|stored| !kept_questions.contains(&stored.id));

            match matched {
                Some(stored) => {
                    kept_questions.insert(stored.id);
                    let draft = merged_question_draft(stored, q, q_pos);
                    let moved = match target {
                        SectionTarget::Existing(id) => stored.section_id != Some(id),
                        SectionTarget::New(_) => true,
                    };
                    if moved || draft != QuestionDraft::from(stored) {
                        plan.update_questions.push(QuestionUpdate {
                            id: stored.id,
                            section: target,
                            fields: draft,
                        });
                    }
                }
                None => plan.create_questions.push(QuestionCreate {
                    section: target,
                    fields: question_draft(q, q_pos),
                }),
            }
        }
    }

    plan.delete_questions = existing_questions
        .iter()
        .map(|q| q.id)
        .filter(|id| !kept_questions.contains(id))
        .collect();
    plan.delete_sections = existing_sections
        .iter()
        .map(|s| s.id)
        .filter(|id| !kept_sections.contains(id))
        .collect();

    plan
}
