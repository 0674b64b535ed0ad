//! Attempt counter repository.

use sqlx::PgPool;

use crate::entities::SurveyAttemptEntity;
use crate::metrics::QueryTimer;

/// Repository for per-fingerprint attempt counters.
#[derive(Clone)]
pub struct AttemptRepository {
    pool: PgPool,
}

impl AttemptRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attempts recorded for a fingerprint hash, 0 when unseen.
    pub async fn attempts(&self, fingerprint_hash: &str) -> Result<i32, sqlx::Error> {
        let timer = QueryTimer::new("get_survey_attempts");
        let result = sqlx::query_scalar::<_, i32>(
            "SELECT attempts FROM survey_attempts WHERE fingerprint_hash = $1",
        )
        .bind(fingerprint_hash)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.unwrap_or(0))
    }

    /// Increments the counter under a row lock and returns the updated row.
    ///
    /// Concurrent increments for the same hash serialize on the lock.
    pub async fn increment(&self, fingerprint_hash: &str) -> Result<SurveyAttemptEntity, sqlx::Error> {
        let timer = QueryTimer::new("increment_survey_attempts");
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO survey_attempts (fingerprint_hash, attempts)
            VALUES ($1, 0)
            ON CONFLICT (fingerprint_hash) DO NOTHING
            "#,
        )
        .bind(fingerprint_hash)
        .execute(&mut *tx)
        .await?;

        let current: i32 = sqlx::query_scalar(
            "SELECT attempts FROM survey_attempts WHERE fingerprint_hash = $1 FOR UPDATE",
        )
        .bind(fingerprint_hash)
        .fetch_one(&mut *tx)
        .await?;

        let updated = sqlx::query_as::<_, SurveyAttemptEntity>(
            r#"
            UPDATE survey_attempts
            SET attempts = $2, last_submitted = NOW()
            WHERE fingerprint_hash = $1
            RETURNING fingerprint_hash, attempts, last_submitted
            "#,
        )
        .bind(fingerprint_hash)
        .bind(current.saturating_add(1))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(updated)
    }
}
