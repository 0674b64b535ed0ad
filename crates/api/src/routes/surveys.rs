//! Survey authoring handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{Datelike, Utc};
use domain::models::survey::{CreateSurveyRequest, SurveyChanges, UpdateSurveyRequest};
use domain::models::{Question, Section, Survey, SurveyDetail};
use domain::services::{normalize_new_survey, TreeEdit};
use persistence::entities::SurveyEntity;
use persistence::repositories::SurveyRepository;
use serde::Serialize;
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminAuth;

/// `{"ok": true}` acknowledgement.
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

fn survey_not_found() -> ApiError {
    ApiError::NotFound("Survey not found".to_string())
}

/// Sections and questions of a survey as domain rows.
pub(crate) async fn load_tree(
    repo: &SurveyRepository,
    survey_id: i64,
) -> Result<(Vec<Section>, Vec<Question>), ApiError> {
    let (sections, questions) = tokio::try_join!(
        repo.find_sections(survey_id),
        repo.find_questions(survey_id)
    )?;
    Ok((
        sections.into_iter().map(Into::into).collect(),
        questions.into_iter().map(Into::into).collect(),
    ))
}

/// Full detail document of a stored survey.
pub(crate) async fn load_detail(
    repo: &SurveyRepository,
    entity: SurveyEntity,
) -> Result<SurveyDetail, ApiError> {
    let survey: Survey = entity.into();
    let (sections, questions) = load_tree(repo, survey.id).await?;
    Ok(SurveyDetail::assemble(survey, sections, questions))
}

/// GET /api/admin/surveys/
pub async fn list_surveys(
    State(state): State<AppState>,
    _auth: AdminAuth,
) -> Result<Json<Vec<SurveyDetail>>, ApiError> {
    let repo = SurveyRepository::new(state.pool.clone());
    let surveys = repo.list().await?;

    let mut details = Vec::with_capacity(surveys.len());
    for entity in surveys {
        details.push(load_detail(&repo, entity).await?);
    }
    Ok(Json(details))
}

/// POST /api/admin/surveys/
pub async fn create_survey(
    State(state): State<AppState>,
    auth: AdminAuth,
    Json(request): Json<CreateSurveyRequest>,
) -> Result<(StatusCode, Json<SurveyDetail>), ApiError> {
    auth.require_editor()?;
    request.validate()?;

    let survey = request.new_survey(Utc::now().year());
    let drafts = normalize_new_survey(request.sections.as_deref(), request.questions.as_deref());

    let repo = SurveyRepository::new(state.pool.clone());
    let entity = repo.create(&survey, &drafts).await?;

    info!(
        survey_id = entity.id,
        admin_id = auth.user.id,
        active = entity.is_active,
        "Survey created"
    );
    Ok((StatusCode::CREATED, Json(load_detail(&repo, entity).await?)))
}

/// GET /api/admin/surveys/:id/
pub async fn get_survey(
    State(state): State<AppState>,
    auth: AdminAuth,
    Path(id): Path<i64>,
) -> Result<Json<SurveyDetail>, ApiError> {
    auth.require_editor()?;

    let repo = SurveyRepository::new(state.pool.clone());
    let entity = repo.find_by_id(id).await?.ok_or_else(survey_not_found)?;
    Ok(Json(load_detail(&repo, entity).await?))
}

/// PATCH /api/admin/surveys/:id/
///
/// `sections`, when present, replaces the stored structure. A legacy flat
/// `questions` list replaces the questions of the first section.
pub async fn update_survey(
    State(state): State<AppState>,
    auth: AdminAuth,
    Path(id): Path<i64>,
    Json(request): Json<UpdateSurveyRequest>,
) -> Result<Json<SurveyDetail>, ApiError> {
    auth.require_editor()?;
    request.validate()?;

    let repo = SurveyRepository::new(state.pool.clone());
    let edit = TreeEdit::from_request(&request);
    let changes = SurveyChanges::from(&request);
    let entity = repo
        .update(id, &changes, edit.as_ref())
        .await?
        .ok_or_else(survey_not_found)?;

    info!(survey_id = id, admin_id = auth.user.id, "Survey updated");
    Ok(Json(load_detail(&repo, entity).await?))
}

/// DELETE /api/admin/surveys/:id/
pub async fn delete_survey(
    State(state): State<AppState>,
    auth: AdminAuth,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    auth.require_editor()?;

    if !SurveyRepository::new(state.pool.clone()).delete(id).await? {
        return Err(survey_not_found());
    }

    info!(survey_id = id, admin_id = auth.user.id, "Survey deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/admin/surveys/:id/activate/
pub async fn activate_survey(
    State(state): State<AppState>,
    auth: AdminAuth,
    Path(id): Path<i64>,
) -> Result<Json<OkResponse>, ApiError> {
    auth.require_editor()?;

    if !SurveyRepository::new(state.pool.clone()).activate(id).await? {
        return Err(survey_not_found());
    }

    info!(survey_id = id, admin_id = auth.user.id, "Survey activated");
    Ok(Json(OkResponse::ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_response() {
        let json = serde_json::to_value(OkResponse::ok()).unwrap();
        assert_eq!(json, serde_json::json!({"ok": true}));
    }
}
