//! Dashboard aggregate queries.

use chrono::NaiveDate;
use domain::models::dashboard::{DashboardAggregates, RECENT_LIMIT};
use sqlx::PgPool;

use crate::entities::{ChoiceCountEntity, DailyCountEntity, RatingCountEntity, RecentResponseEntity};
use crate::metrics::QueryTimer;

/// Responses of one survey after the date and region filters.
///
/// Binds: $1 survey, $2 from, $3 to, $4 region.
const BASE_RESPONSES: &str = r#"
    WITH base AS (
        SELECT r.id, r.submitted_at
        FROM responses r
        WHERE r.survey_id = $1
          AND ($2::date IS NULL OR r.submitted_at::date >= $2)
          AND ($3::date IS NULL OR r.submitted_at::date <= $3)
          AND (
              $4::text IS NULL
              OR EXISTS (
                  SELECT 1
                  FROM answers ra
                  JOIN questions rq ON rq.id = ra.question_id
                  WHERE ra.response_id = r.id
                    AND rq.question_type = 'regions'
                    AND ra.choice = $4
              )
          )
    )
"#;

/// Filters applied to the dashboard response set.
#[derive(Debug, Clone, Default)]
pub struct DashboardScope {
    pub survey_id: i64,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub region: Option<String>,
}

/// Repository for dashboard aggregates.
#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads every aggregate the dashboard needs.
    ///
    /// `since` is the first day of the time series window; choice counts are
    /// only gathered for `choice_question_ids`.
    pub async fn aggregates(
        &self,
        scope: &DashboardScope,
        since: NaiveDate,
        choice_question_ids: &[i64],
    ) -> Result<DashboardAggregates, sqlx::Error> {
        let timer = QueryTimer::new("dashboard_aggregates");
        let (total_responses, recent, daily_counts, rating_counts, choice_counts) = tokio::try_join!(
            self.total(scope),
            self.recent(scope),
            self.daily_counts(scope, since),
            self.rating_counts(scope),
            self.choice_counts(scope, choice_question_ids),
        )?;
        timer.record();

        Ok(DashboardAggregates {
            total_responses,
            recent: recent.into_iter().map(Into::into).collect(),
            daily_counts: daily_counts.into_iter().map(Into::into).collect(),
            rating_counts: rating_counts.into_iter().map(Into::into).collect(),
            choice_counts: choice_counts.into_iter().map(Into::into).collect(),
        })
    }

    async fn total(&self, scope: &DashboardScope) -> Result<i64, sqlx::Error> {
        let sql = format!("{BASE_RESPONSES} SELECT COUNT(*) FROM base");
        sqlx::query_scalar::<_, i64>(&sql)
            .bind(scope.survey_id)
            .bind(scope.from)
            .bind(scope.to)
            .bind(scope.region.as_deref())
            .fetch_one(&self.pool)
            .await
    }

    async fn recent(&self, scope: &DashboardScope) -> Result<Vec<RecentResponseEntity>, sqlx::Error> {
        let sql = format!(
            "{BASE_RESPONSES} SELECT id, submitted_at FROM base \
             ORDER BY submitted_at DESC, id DESC LIMIT $5"
        );
        sqlx::query_as::<_, RecentResponseEntity>(&sql)
            .bind(scope.survey_id)
            .bind(scope.from)
            .bind(scope.to)
            .bind(scope.region.as_deref())
            .bind(RECENT_LIMIT)
            .fetch_all(&self.pool)
            .await
    }

    async fn daily_counts(
        &self,
        scope: &DashboardScope,
        since: NaiveDate,
    ) -> Result<Vec<DailyCountEntity>, sqlx::Error> {
        let sql = format!(
            "{BASE_RESPONSES} SELECT submitted_at::date AS day, COUNT(*) AS count FROM base \
             WHERE submitted_at::date >= $5 \
             GROUP BY 1 ORDER BY 1"
        );
        sqlx::query_as::<_, DailyCountEntity>(&sql)
            .bind(scope.survey_id)
            .bind(scope.from)
            .bind(scope.to)
            .bind(scope.region.as_deref())
            .bind(since)
            .fetch_all(&self.pool)
            .await
    }

    async fn rating_counts(&self, scope: &DashboardScope) -> Result<Vec<RatingCountEntity>, sqlx::Error> {
        let sql = format!(
            "{BASE_RESPONSES} SELECT a.question_id, a.rating, COUNT(*) AS count \
             FROM answers a \
             JOIN base b ON b.id = a.response_id \
             WHERE a.rating IS NOT NULL \
             GROUP BY a.question_id, a.rating"
        );
        sqlx::query_as::<_, RatingCountEntity>(&sql)
            .bind(scope.survey_id)
            .bind(scope.from)
            .bind(scope.to)
            .bind(scope.region.as_deref())
            .fetch_all(&self.pool)
            .await
    }

    async fn choice_counts(
        &self,
        scope: &DashboardScope,
        question_ids: &[i64],
    ) -> Result<Vec<ChoiceCountEntity>, sqlx::Error> {
        if question_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "{BASE_RESPONSES} SELECT a.question_id, a.choice, COUNT(*) AS count \
             FROM answers a \
             JOIN base b ON b.id = a.response_id \
             WHERE a.question_id = ANY($5) \
             GROUP BY a.question_id, a.choice"
        );
        sqlx::query_as::<_, ChoiceCountEntity>(&sql)
            .bind(scope.survey_id)
            .bind(scope.from)
            .bind(scope.to)
            .bind(scope.region.as_deref())
            .bind(question_ids)
            .fetch_all(&self.pool)
            .await
    }
}
