//! Admin account repository.

use domain::models::AdminRole;
use sqlx::PgPool;

use crate::entities::AdminUserEntity;
use crate::metrics::QueryTimer;

const ADMIN_COLUMNS: &str = "id, username, password_hash, full_name, role, is_active, \
     created_at, updated_at, last_login_at";

/// Repository for admin portal accounts.
#[derive(Clone)]
pub struct AdminUserRepository {
    pool: PgPool,
}

impl AdminUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<AdminUserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_admin_users");
        let result = sqlx::query_as::<_, AdminUserEntity>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admin_users ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<AdminUserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_admin_user_by_id");
        let result = sqlx::query_as::<_, AdminUserEntity>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admin_users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<AdminUserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_admin_user_by_username");
        let result = sqlx::query_as::<_, AdminUserEntity>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admin_users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// True when an active account has this username (case-insensitive).
    pub async fn exists_active_username(&self, username: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("exists_active_admin_username");
        let result = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM admin_users WHERE LOWER(username) = LOWER($1) AND is_active)",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_admin_users");
        let result = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admin_users")
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Inserts an account. A taken username surfaces as a unique violation.
    pub async fn create(
        &self,
        username: &str,
        password_hash: &str,
        full_name: &str,
        role: AdminRole,
    ) -> Result<AdminUserEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_admin_user");
        let result = sqlx::query_as::<_, AdminUserEntity>(&format!(
            "INSERT INTO admin_users (username, password_hash, full_name, role) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {ADMIN_COLUMNS}"
        ))
        .bind(username)
        .bind(password_hash)
        .bind(full_name)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Partial update; `None` keeps the stored value.
    pub async fn update(
        &self,
        id: i64,
        username: Option<&str>,
        full_name: Option<&str>,
        role: Option<AdminRole>,
        is_active: Option<bool>,
    ) -> Result<Option<AdminUserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_admin_user");
        let result = sqlx::query_as::<_, AdminUserEntity>(&format!(
            "UPDATE admin_users SET \
                 username = COALESCE($2, username), \
                 full_name = COALESCE($3, full_name), \
                 role = COALESCE($4, role), \
                 is_active = COALESCE($5, is_active), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {ADMIN_COLUMNS}"
        ))
        .bind(id)
        .bind(username)
        .bind(full_name)
        .bind(role.map(|r| r.as_str()))
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn update_password(&self, id: i64, password_hash: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("update_admin_password");
        let result = sqlx::query(
            "UPDATE admin_users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    pub async fn touch_last_login(&self, id: i64) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("touch_admin_last_login");
        let result = sqlx::query("UPDATE admin_users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        result.map(|_| ())
    }

    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_admin_user");
        let result = sqlx::query("DELETE FROM admin_users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }
}
