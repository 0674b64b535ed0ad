//! Response browsing and export handlers.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use domain::models::response::{
    AnswerView, ExportRow, ResponseListItem, ResponseListPage, ResponseQuery, SurveyRef,
};
use persistence::repositories::ResponseRepository;
use shared::pagination::PageRequest;
use std::collections::HashMap;
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminAuth;
use crate::middleware::metrics::record_export;
use crate::services::export::{export_pdf, export_xlsx, PDF_CONTENT_TYPE, XLSX_CONTENT_TYPE};

/// GET /api/admin/responses/
pub async fn list_responses(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Query(query): Query<ResponseQuery>,
) -> Result<Json<ResponseListPage>, ApiError> {
    let filter = query.filter();
    let page = PageRequest::from_query(query.page.as_deref(), query.page_size.as_deref());
    let repo = ResponseRepository::new(state.pool.clone());

    let (count, summaries) = tokio::try_join!(
        repo.count(&filter),
        repo.list(&filter, page.limit(), page.offset())
    )?;

    let ids: Vec<i64> = summaries.iter().map(|s| s.id).collect();
    let mut answers: HashMap<i64, Vec<AnswerView>> = HashMap::new();
    for row in repo.answers_for(&ids, filter.question_id).await? {
        answers.entry(row.response_id).or_default().push(row.into());
    }

    let results = summaries
        .into_iter()
        .map(|s| ResponseListItem {
            id: s.id,
            submitted_at: s.submitted_at,
            survey: SurveyRef {
                id: s.survey_id,
                title: s.survey_title,
            },
            answers: answers.remove(&s.id).unwrap_or_default(),
        })
        .collect();

    Ok(Json(ResponseListPage {
        count,
        page: page.page,
        page_size: page.page_size,
        results,
    }))
}

async fn export_rows(state: &AppState, query: &ResponseQuery) -> Result<Vec<ExportRow>, ApiError> {
    let rows = ResponseRepository::new(state.pool.clone())
        .export_rows(&query.filter())
        .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

fn attachment(content_type: &'static str, filename: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

/// GET /api/admin/responses/export.xlsx
pub async fn export_responses_xlsx(
    State(state): State<AppState>,
    auth: AdminAuth,
    Query(query): Query<ResponseQuery>,
) -> Result<Response, ApiError> {
    let rows = export_rows(&state, &query).await?;
    let count = rows.len();
    let bytes = export_xlsx(rows).await?;

    record_export("xlsx", count);
    info!(admin_id = auth.user.id, rows = count, "Responses exported as XLSX");
    Ok(attachment(XLSX_CONTENT_TYPE, "responses.xlsx", bytes))
}

/// GET /api/admin/responses/export.pdf
pub async fn export_responses_pdf(
    State(state): State<AppState>,
    auth: AdminAuth,
    Query(query): Query<ResponseQuery>,
) -> Result<Response, ApiError> {
    let rows = export_rows(&state, &query).await?;
    let count = rows.len();
    let bytes = export_pdf(rows, state.config.export.clone()).await?;

    record_export("pdf", count);
    info!(admin_id = auth.user.id, rows = count, "Responses exported as PDF");
    Ok(attachment(PDF_CONTENT_TYPE, "responses.pdf", bytes))
}
