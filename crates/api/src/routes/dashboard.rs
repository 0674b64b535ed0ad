//! Admin dashboard handler.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Duration, Utc};
use domain::models::dashboard::{DashboardQuery, TIMESERIES_DAYS};
use domain::models::{DashboardResponse, Survey};
use domain::services::build_dashboard;
use domain::services::dashboard::DemographicQuestions;
use persistence::repositories::{DashboardRepository, DashboardScope, SurveyRepository};
use shared::validation::{parse_date_param, parse_int_param};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminAuth;
use crate::routes::surveys::load_tree;

/// GET /api/admin/dashboard/
///
/// Reports on the requested survey, or the latest active one when the id is
/// missing or unknown.
pub async fn dashboard(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let surveys = SurveyRepository::new(state.pool.clone());

    let requested = match parse_int_param(query.survey.as_deref()) {
        Some(id) => surveys.find_by_id(id).await?,
        None => None,
    };
    let entity = match requested {
        Some(entity) => Some(entity),
        None => surveys.find_active().await?,
    };
    let Some(entity) = entity else {
        return Ok(Json(DashboardResponse::empty()));
    };

    let survey: Survey = entity.into();
    let (sections, questions) = load_tree(&surveys, survey.id).await?;

    let today = Utc::now().date_naive();
    let since = today - Duration::days(TIMESERIES_DAYS - 1);
    let scope = DashboardScope {
        survey_id: survey.id,
        from: parse_date_param(query.from.as_deref()),
        to: parse_date_param(query.to.as_deref()),
        region: query.region().map(str::to_string),
    };
    let choice_questions = DemographicQuestions::locate(&questions).ids();

    let aggregates = DashboardRepository::new(state.pool.clone())
        .aggregates(&scope, since, &choice_questions)
        .await?;

    Ok(Json(build_dashboard(
        &survey,
        &sections,
        &questions,
        aggregates,
        query.echo(),
        today,
    )))
}
