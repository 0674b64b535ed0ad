//! Admin login, token refresh and password change handlers.

use axum::{extract::State, Json};
use domain::models::admin_user::{
    ChangePasswordRequest, DetailResponse, LoginRequest, LoginResponse, RefreshRequest,
    RefreshResponse,
};
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminAuth;

/// Returns the value when present and non-empty.
fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// POST /api/admin/login/
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (Some(username), Some(password)) = (required(&request.username), required(&request.password))
    else {
        return Err(ApiError::Validation(
            "Username and password are required".to_string(),
        ));
    };

    let response = state.auth_service()?.login(username, password).await?;
    Ok(Json(response))
}

/// POST /api/admin/token/refresh/
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let token = required(&request.refresh)
        .ok_or_else(|| ApiError::Validation("refresh is required".to_string()))?;

    let response = state.auth_service()?.refresh(token).await?;
    Ok(Json(response))
}

/// POST /api/admin/change-password/
pub async fn change_password(
    State(state): State<AppState>,
    auth: AdminAuth,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<DetailResponse>, ApiError> {
    let (Some(current), Some(new)) = (
        required(&request.current_password),
        required(&request.new_password),
    ) else {
        return Err(ApiError::Validation(
            "current_password and new_password are required".to_string(),
        ));
    };

    state
        .auth_service()?
        .change_password(&auth.user, current, new)
        .await?;

    info!(admin_id = auth.user.id, "Admin changed password");
    Ok(Json(DetailResponse::new("Password changed successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_blank() {
        assert_eq!(required(&None), None);
        assert_eq!(required(&Some(String::new())), None);
        assert_eq!(required(&Some("admin".into())), Some("admin"));
    }
}
