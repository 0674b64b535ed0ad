//! Admin JWT authentication extractors.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::models::AdminUser;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::auth::AuthError;

/// Authenticated, active admin account.
///
/// Validates the Bearer access token and reloads the account so that
/// deactivated or deleted admins are rejected immediately.
#[derive(Debug, Clone)]
pub struct AdminAuth {
    pub user: AdminUser,
}

impl AdminAuth {
    /// Allows super admins and survey designers.
    pub fn require_editor(&self) -> Result<(), ApiError> {
        if self.user.role.can_edit_surveys() {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "You do not have permission to modify surveys".to_string(),
            ))
        }
    }

    /// Allows super admins only.
    pub fn require_super_admin(&self) -> Result<(), ApiError> {
        if self.user.role.can_manage_users() {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "Only super admins can manage admin users".to_string(),
            ))
        }
    }
}

/// Extracts the token of an `Authorization: Bearer <token>` header.
pub(crate) fn bearer_token(parts: &Parts) -> Result<Option<&str>, ApiError> {
    match parts.headers.get("Authorization") {
        None => Ok(None),
        Some(value) => {
            let value = value.to_str().map_err(|_| {
                ApiError::Unauthorized("Invalid Authorization header format".to_string())
            })?;
            value
                .strip_prefix("Bearer ")
                .map(|token| Some(token.trim()))
                .ok_or_else(|| {
                    ApiError::Unauthorized("Invalid Authorization header format".to_string())
                })
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(auth) = parts.extensions.get::<AdminAuth>() {
            return Ok(auth.clone());
        }

        let token = bearer_token(parts)?
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

        let user = state.auth_service()?.authenticate(token).await?;
        let auth = AdminAuth { user };
        parts.extensions.insert(auth.clone());
        Ok(auth)
    }
}

/// Admin authentication for the public endpoints, where a signed-in admin
/// bypasses the one-response rule.
///
/// Missing or invalid credentials yield `None`; only a failed account
/// lookup rejects the request.
#[derive(Debug, Clone)]
pub struct OptionalAdminAuth(pub Option<AdminAuth>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalAdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = match bearer_token(parts) {
            Ok(Some(token)) => token.to_string(),
            _ => return Ok(OptionalAdminAuth(None)),
        };

        let Ok(service) = state.auth_service() else {
            return Ok(OptionalAdminAuth(None));
        };

        optional_admin(service.authenticate(&token).await).map(OptionalAdminAuth)
    }
}

fn optional_admin(result: Result<AdminUser, AuthError>) -> Result<Option<AdminAuth>, ApiError> {
    match result {
        Ok(user) => Ok(Some(AdminAuth { user })),
        Err(AuthError::Database(e)) => {
            tracing::warn!(error = %e, "Admin lookup failed on public endpoint");
            Err(AuthError::Database(e).into())
        }
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring invalid admin token on public endpoint");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use chrono::Utc;
    use domain::models::AdminRole;

    fn auth(role: AdminRole) -> AdminAuth {
        AdminAuth {
            user: AdminUser {
                id: 1,
                username: "admin".to_string(),
                full_name: String::new(),
                role,
                is_active: true,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                last_login_at: None,
            },
        }
    }

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header("Authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_role_guards() {
        assert!(auth(AdminRole::SuperAdmin).require_super_admin().is_ok());
        assert!(auth(AdminRole::SuperAdmin).require_editor().is_ok());
        assert!(auth(AdminRole::SurveyDesigner).require_editor().is_ok());
        assert!(matches!(
            auth(AdminRole::SurveyDesigner).require_super_admin(),
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            auth(AdminRole::Viewer).require_editor(),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn test_optional_admin_outcomes() {
        let user = auth(AdminRole::Viewer).user;
        assert!(matches!(optional_admin(Ok(user)), Ok(Some(_))));
        assert!(matches!(optional_admin(Err(AuthError::InvalidToken)), Ok(None)));
        assert!(matches!(optional_admin(Err(AuthError::InactiveUser)), Ok(None)));
        assert!(matches!(
            optional_admin(Err(AuthError::Database(sqlx::Error::PoolTimedOut))),
            Err(ApiError::Internal(_))
        ));
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts(None)).unwrap(), None);
        assert_eq!(
            bearer_token(&parts(Some("Bearer abc.def"))).unwrap(),
            Some("abc.def")
        );
        assert!(matches!(
            bearer_token(&parts(Some("Basic dXNlcg=="))),
            Err(ApiError::Unauthorized(_))
        ));
    }
}
