//! Respondent-facing handlers: active survey, submission and attempt limits.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::attempt::{AttemptRequest, AttemptStatus};
use domain::models::response::SubmitSurveyRequest;
use domain::models::survey::ActiveSurveyResponse;
use domain::models::Question;
use domain::services::identity::username_part;
use domain::services::{validate_submission, SubmissionError};
use persistence::repositories::{
    AdminUserRepository, AttemptRepository, ResponseRepository, SurveyRepository,
};
use shared::crypto::attempt_fingerprint_hash;
use tracing::{debug, info};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ClientIp, EmployeeIdentity, OptionalAdminAuth};
use crate::middleware::metrics::{record_attempt_increment, record_submission};
use crate::routes::surveys::{load_detail, OkResponse};

const ALREADY_SUBMITTED: &str =
    "You have already submitted this survey. Only one response per employee is allowed.";

/// True when the one-response rule does not apply to this request: a valid
/// admin token, or an identifier naming an active admin account.
async fn admin_bypass(
    state: &AppState,
    identity: &EmployeeIdentity,
    admin: &OptionalAdminAuth,
) -> Result<bool, ApiError> {
    if admin.0.is_some() {
        return Ok(true);
    }
    match identity.0.as_deref() {
        Some(identifier) => Ok(AdminUserRepository::new(state.pool.clone())
            .exists_active_username(username_part(identifier))
            .await?),
        None => Ok(false),
    }
}

/// GET /api/survey/active/
pub async fn active_survey(
    State(state): State<AppState>,
    identity: EmployeeIdentity,
    admin: OptionalAdminAuth,
    client_ip: ClientIp,
) -> Result<Json<Option<ActiveSurveyResponse>>, ApiError> {
    let repo = SurveyRepository::new(state.pool.clone());
    let Some(entity) = repo.find_active().await? else {
        return Ok(Json(None));
    };
    let survey = load_detail(&repo, entity).await?;

    let has_responded = match identity.0.as_deref() {
        Some(identifier) if !admin_bypass(&state, &identity, &admin).await? => {
            ResponseRepository::new(state.pool.clone())
                .has_responded(survey.id, identifier)
                .await?
        }
        _ => false,
    };

    Ok(Json(Some(ActiveSurveyResponse {
        survey,
        has_responded,
        client_ip: client_ip.0.map(|ip| ip.to_string()),
    })))
}

/// POST /api/survey/submit/
pub async fn submit_survey(
    State(state): State<AppState>,
    identity: EmployeeIdentity,
    admin: OptionalAdminAuth,
    Json(request): Json<SubmitSurveyRequest>,
) -> Result<(StatusCode, Json<OkResponse>), ApiError> {
    request.validate()?;

    let surveys = SurveyRepository::new(state.pool.clone());
    surveys
        .find_by_id(request.survey)
        .await?
        .ok_or(SubmissionError::SurveyNotFound)?;

    let responses = ResponseRepository::new(state.pool.clone());
    let bypass = admin_bypass(&state, &identity, &admin).await?;

    if let (Some(identifier), false) = (identity.0.as_deref(), bypass) {
        if responses.has_responded(request.survey, identifier).await? {
            return Err(ApiError::Forbidden(ALREADY_SUBMITTED.to_string()));
        }
    }

    let questions: Vec<Question> = surveys
        .find_questions(request.survey)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let answers = validate_submission(&request, &questions)?;

    let stored_identifier = if bypass { None } else { identity.0.as_deref() };
    let response_id = responses
        .submit(request.survey, stored_identifier, &answers)
        .await?;

    record_submission(bypass);
    info!(
        response_id,
        survey_id = request.survey,
        answers = answers.len(),
        bypass,
        "Survey response submitted"
    );
    Ok((StatusCode::CREATED, Json(OkResponse::ok())))
}

fn fingerprint_hash(state: &AppState, request: &AttemptRequest, client_ip: &ClientIp) -> String {
    attempt_fingerprint_hash(
        &state.config.attempts.hash_secret,
        request.survey,
        &request.fingerprint,
        &client_ip.as_key(),
    )
}

/// POST /api/survey/attempts/check/
pub async fn check_attempts(
    State(state): State<AppState>,
    client_ip: ClientIp,
    Json(request): Json<AttemptRequest>,
) -> Result<Json<AttemptStatus>, ApiError> {
    request.validate()?;

    let hash = fingerprint_hash(&state, &request, &client_ip);
    let attempts = AttemptRepository::new(state.pool.clone())
        .attempts(&hash)
        .await?;

    debug!(survey_id = request.survey, attempts, "Attempt check");
    Ok(Json(AttemptStatus::new(
        attempts,
        state.config.attempts.max_attempts,
    )))
}

/// POST /api/survey/attempts/increment/
pub async fn increment_attempts(
    State(state): State<AppState>,
    client_ip: ClientIp,
    Json(request): Json<AttemptRequest>,
) -> Result<Json<AttemptStatus>, ApiError> {
    request.validate()?;

    let hash = fingerprint_hash(&state, &request, &client_ip);
    let row = AttemptRepository::new(state.pool.clone())
        .increment(&hash)
        .await?;

    let status = AttemptStatus::new(row.attempts, state.config.attempts.max_attempts);
    record_attempt_increment(status.allowed);
    debug!(
        survey_id = request.survey,
        attempts = status.attempts,
        allowed = status.allowed,
        "Attempt recorded"
    );
    Ok(Json(status))
}
