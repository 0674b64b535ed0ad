//! Admin authentication: login, token refresh, password changes.

use domain::models::admin_user::{AdminUserView, LoginResponse, RefreshResponse};
use domain::models::AdminUser;
use persistence::repositories::AdminUserRepository;
use shared::jwt::{extract_user_id, JwtConfig, JwtError};
use shared::password::{
    check_password_policy, hash_password, verify_password, PasswordError, PasswordPolicyError,
};
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;

use crate::config::JwtAuthConfig;
use crate::error::ApiError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("User not found or inactive")]
    InactiveUser,

    #[error("Current password is incorrect.")]
    WrongPassword,

    #[error("New password {0}")]
    WeakPassword(#[from] PasswordPolicyError),

    #[error("Token error: {0}")]
    Token(JwtError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::TokenExpired | JwtError::InvalidToken | JwtError::DecodingError(_) => {
                AuthError::InvalidToken
            }
            other => AuthError::Token(other),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::InvalidToken | AuthError::InactiveUser => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::WrongPassword | AuthError::WeakPassword(_) => {
                ApiError::Validation(err.to_string())
            }
            AuthError::Token(e) => ApiError::Internal(format!("Token error: {}", e)),
            AuthError::Password(e) => ApiError::Internal(format!("Password error: {}", e)),
            AuthError::Database(e) => e.into(),
        }
    }
}

/// Authentication service for admin accounts.
#[derive(Clone)]
pub struct AuthService {
    users: AdminUserRepository,
    jwt: Arc<JwtConfig>,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt: Arc<JwtConfig>) -> Self {
        Self {
            users: AdminUserRepository::new(pool),
            jwt,
        }
    }

    /// Builds the signing configuration from PEM keys that may carry
    /// escaped `\n` sequences or surrounding quotes from env files.
    pub fn jwt_config(config: &JwtAuthConfig) -> Result<JwtConfig, JwtError> {
        JwtConfig::with_leeway(
            &normalize_pem_key(&config.private_key),
            &normalize_pem_key(&config.public_key),
            config.access_token_expiry_secs,
            config.refresh_token_expiry_secs,
            config.leeway_secs,
        )
    }

    /// Verifies credentials and issues an access/refresh pair.
    ///
    /// Unknown users, wrong passwords and disabled accounts all report
    /// [`AuthError::InvalidCredentials`].
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let entity = self
            .users
            .find_by_username(username.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !entity.is_active || !verify_password(password, &entity.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        self.users.touch_last_login(entity.id).await?;

        let (access, _) = self.jwt.generate_access_token(entity.id)?;
        let (refresh, _) = self.jwt.generate_refresh_token(entity.id)?;
        let user = AdminUser::from(entity);

        tracing::info!(admin_id = user.id, username = %user.username, "Admin logged in");

        Ok(LoginResponse {
            access,
            refresh,
            user: AdminUserView::from(&user),
        })
    }

    /// Issues a new access token for a valid refresh token of an active user.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, AuthError> {
        let claims = self.jwt.validate_refresh_token(refresh_token)?;
        let user_id = extract_user_id(&claims)?;
        let user = self.active_user(user_id).await?;
        let (access, _) = self.jwt.generate_access_token(user.id)?;
        Ok(RefreshResponse { access })
    }

    /// Resolves the active admin behind an access token.
    pub async fn authenticate(&self, access_token: &str) -> Result<AdminUser, AuthError> {
        let claims = self.jwt.validate_access_token(access_token)?;
        let user_id = extract_user_id(&claims)?;
        self.active_user(user_id).await
    }

    async fn active_user(&self, user_id: i64) -> Result<AdminUser, AuthError> {
        match self.users.find_by_id(user_id).await? {
            Some(entity) if entity.is_active => Ok(entity.into()),
            _ => Err(AuthError::InactiveUser),
        }
    }

    /// Changes the password of `user` after checking the current one.
    pub async fn change_password(
        &self,
        user: &AdminUser,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let entity = self
            .users
            .find_by_id(user.id)
            .await?
            .ok_or(AuthError::InactiveUser)?;

        if !verify_password(current_password, &entity.password_hash)? {
            return Err(AuthError::WrongPassword);
        }

        self.set_password(user.id, new_password).await
    }

    /// Stores a new password for `user_id` after the policy check.
    pub async fn set_password(&self, user_id: i64, new_password: &str) -> Result<(), AuthError> {
        check_password_policy(new_password)?;
        let hash = hash_password(new_password)?;
        if !self.users.update_password(user_id, &hash).await? {
            return Err(AuthError::InactiveUser);
        }
        Ok(())
    }
}

/// Converts escaped newlines to real ones and strips wrapping quotes.
fn normalize_pem_key(key: &str) -> String {
    key.trim()
        .trim_matches('"')
        .trim_matches('\'')
        .replace("\\n", "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_pem_key() {
        assert_eq!(
            normalize_pem_key("\"-----BEGIN KEY-----\\nabc\\n-----END KEY-----\""),
            "-----BEGIN KEY-----\nabc\n-----END KEY-----"
        );
        assert_eq!(normalize_pem_key("line1\nline2"), "line1\nline2");
    }

    #[test]
    fn test_jwt_errors_become_invalid_token() {
        assert!(matches!(
            AuthError::from(JwtError::TokenExpired),
            AuthError::InvalidToken
        ));
        assert!(matches!(
            AuthError::from(JwtError::InvalidKey("x".into())),
            AuthError::Token(_)
        ));
    }

    #[test]
    fn test_api_error_mapping() {
        assert!(matches!(
            ApiError::from(AuthError::InvalidCredentials),
            ApiError::Unauthorized(_)
        ));
        match ApiError::from(AuthError::WeakPassword(PasswordPolicyError::MissingVariety)) {
            ApiError::Validation(msg) => {
                assert_eq!(msg, "New password must contain both letters and numbers.")
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            ApiError::from(AuthError::WrongPassword),
            ApiError::Validation(_)
        ));
    }

    #[test]
    fn test_invalid_pem_is_rejected() {
        let config = JwtAuthConfig {
            private_key: "not a key".into(),
            public_key: "not a key".into(),
            access_token_expiry_secs: 3600,
            refresh_token_expiry_secs: 7200,
            leeway_secs: 0,
        };
        assert!(AuthService::jwt_config(&config).is_err());
    }
}
