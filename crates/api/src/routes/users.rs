//! Admin account management handlers. Super admins only.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::admin_user::{
    AdminUserList, AdminUserView, CreateAdminUserRequest, DetailResponse, ResetPasswordRequest,
    UpdateAdminUserRequest,
};
use domain::models::{AdminRole, AdminUser};
use persistence::repositories::AdminUserRepository;
use shared::password::{check_password_policy, hash_password};
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminAuth;

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".to_string())
}

fn parse_role(role: &str) -> Result<AdminRole, ApiError> {
    role.parse()
        .map_err(|_| ApiError::Validation("Invalid role".to_string()))
}

fn view(user: AdminUser) -> AdminUserView {
    AdminUserView::from(&user)
}

/// GET /api/admin/users/
pub async fn list_users(
    State(state): State<AppState>,
    auth: AdminAuth,
) -> Result<Json<AdminUserList>, ApiError> {
    auth.require_super_admin()?;

    let users = AdminUserRepository::new(state.pool.clone()).list().await?;
    Ok(Json(AdminUserList {
        results: users.into_iter().map(|u| view(u.into())).collect(),
    }))
}

/// POST /api/admin/users/
pub async fn create_user(
    State(state): State<AppState>,
    auth: AdminAuth,
    Json(request): Json<CreateAdminUserRequest>,
) -> Result<(StatusCode, Json<AdminUserView>), ApiError> {
    auth.require_super_admin()?;
    request.validate()?;

    let username = request.username.as_deref().map(str::trim).unwrap_or("");
    let password = request.password.as_deref().unwrap_or("");
    if username.is_empty() || password.is_empty() {
        return Err(ApiError::Validation(
            "username and password are required".to_string(),
        ));
    }

    let role = match request.role.as_deref() {
        Some(role) => parse_role(role)?,
        None => AdminRole::default(),
    };

    let repo = AdminUserRepository::new(state.pool.clone());
    if repo.find_by_username(username).await?.is_some() {
        return Err(ApiError::Validation("Username already exists".to_string()));
    }

    check_password_policy(password)?;
    let password_hash =
        hash_password(password).map_err(|e| ApiError::Internal(e.to_string()))?;

    let full_name = request.full_name.as_deref().unwrap_or("").trim();
    let user: AdminUser = repo
        .create(username, &password_hash, full_name, role)
        .await?
        .into();

    info!(
        admin_id = user.id,
        created_by = auth.user.id,
        role = %user.role,
        "Admin user created"
    );
    Ok((StatusCode::CREATED, Json(view(user))))
}

/// GET /api/admin/users/:id/
pub async fn get_user(
    State(state): State<AppState>,
    auth: AdminAuth,
    Path(id): Path<i64>,
) -> Result<Json<AdminUserView>, ApiError> {
    auth.require_super_admin()?;

    let user = AdminUserRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(user_not_found)?;
    Ok(Json(view(user.into())))
}

/// PATCH /api/admin/users/:id/
pub async fn update_user(
    State(state): State<AppState>,
    auth: AdminAuth,
    Path(id): Path<i64>,
    Json(request): Json<UpdateAdminUserRequest>,
) -> Result<Json<AdminUserView>, ApiError> {
    auth.require_super_admin()?;
    request.validate()?;

    let repo = AdminUserRepository::new(state.pool.clone());
    repo.find_by_id(id).await?.ok_or_else(user_not_found)?;

    let username = request
        .username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty());
    if let Some(username) = username {
        if let Some(other) = repo.find_by_username(username).await? {
            if other.id != id {
                return Err(ApiError::Validation("Username already exists".to_string()));
            }
        }
    }

    let role = match request.role.as_deref().filter(|r| !r.is_empty()) {
        Some(role) => Some(parse_role(role)?),
        None => None,
    };

    let user: AdminUser = repo
        .update(
            id,
            username,
            request.full_name.as_deref().map(str::trim),
            role,
            request.is_active,
        )
        .await?
        .ok_or_else(user_not_found)?
        .into();

    info!(admin_id = user.id, updated_by = auth.user.id, "Admin user updated");
    Ok(Json(view(user)))
}

/// DELETE /api/admin/users/:id/
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AdminAuth,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    auth.require_super_admin()?;

    let repo = AdminUserRepository::new(state.pool.clone());
    repo.find_by_id(id).await?.ok_or_else(user_not_found)?;

    if id == auth.user.id {
        return Err(ApiError::Validation(
            "You cannot delete your own account.".to_string(),
        ));
    }

    if !repo.delete(id).await? {
        return Err(user_not_found());
    }

    info!(admin_id = id, deleted_by = auth.user.id, "Admin user deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/admin/users/:id/reset-password/
pub async fn reset_password(
    State(state): State<AppState>,
    auth: AdminAuth,
    Path(id): Path<i64>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<DetailResponse>, ApiError> {
    auth.require_super_admin()?;

    AdminUserRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(user_not_found)?;

    let new_password = request
        .new_password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::Validation("new_password is required".to_string()))?;

    state.auth_service()?.set_password(id, new_password).await?;

    info!(admin_id = id, reset_by = auth.user.id, "Admin password reset");
    Ok(Json(DetailResponse::new("Password reset successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("viewer").unwrap(), AdminRole::Viewer);
        match parse_role("owner") {
            Err(ApiError::Validation(msg)) => assert_eq!(msg, "Invalid role"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
