//! First super admin creation on startup.
//!
//! Runs after migrations. Does nothing once any admin account exists.

use domain::models::AdminRole;
use persistence::repositories::AdminUserRepository;
use shared::password::{check_password_policy, hash_password, PasswordError, PasswordPolicyError};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::config::AdminBootstrapConfig;

/// Error types for admin bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] PasswordError),

    #[error("Bootstrap password {0}")]
    WeakPassword(#[from] PasswordPolicyError),
}

/// Creates the configured super admin when the admin table is empty.
///
/// Returns true when an account was created.
pub async fn bootstrap_admin(
    pool: &PgPool,
    config: &AdminBootstrapConfig,
) -> Result<bool, BootstrapError> {
    let username = config.bootstrap_username.trim();
    if username.is_empty() {
        return Ok(false);
    }

    if config.bootstrap_password.is_empty() {
        warn!(
            "SURVEY__ADMIN__BOOTSTRAP_USERNAME is set but SURVEY__ADMIN__BOOTSTRAP_PASSWORD is empty - skipping bootstrap"
        );
        return Ok(false);
    }

    let repo = AdminUserRepository::new(pool.clone());
    if repo.count().await? > 0 {
        info!("Admin accounts already exist - skipping bootstrap");
        return Ok(false);
    }

    check_password_policy(&config.bootstrap_password)?;
    let password_hash = hash_password(&config.bootstrap_password)?;

    let user = repo
        .create(username, &password_hash, "", AdminRole::SuperAdmin)
        .await?;

    info!(admin_id = user.id, username = %user.username, "Bootstrapped super admin account");
    Ok(true)
}
