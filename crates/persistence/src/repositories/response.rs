//! Response repository: submissions, browsing and export rows.

use domain::models::response::{NewAnswer, ResponseFilter};
use sqlx::PgPool;

use crate::entities::{AnswerDetailEntity, ExportRowEntity, ResponseSummaryEntity};
use crate::metrics::QueryTimer;

/// Response-level conditions shared by listing, counting and export.
///
/// Binds: $1 survey, $2 from, $3 to, $4 question, $5 rating_min, $6 rating_max.
/// A response matches the answer conditions when one of its answers
/// satisfies all of them at once.
const RESPONSE_FILTER: &str = r#"
    ($1::bigint IS NULL OR r.survey_id = $1)
    AND ($2::date IS NULL OR r.submitted_at::date >= $2)
    AND ($3::date IS NULL OR r.submitted_at::date <= $3)
    AND (
        ($4::bigint IS NULL AND $5::int IS NULL AND $6::int IS NULL)
        OR EXISTS (
            SELECT 1 FROM answers fa
            WHERE fa.response_id = r.id
              AND ($4::bigint IS NULL OR fa.question_id = $4)
              AND ($5::int IS NULL OR fa.rating >= $5)
              AND ($6::int IS NULL OR fa.rating <= $6)
        )
    )
"#;

/// Repository for stored submissions.
#[derive(Clone)]
pub struct ResponseRepository {
    pool: PgPool,
}

impl ResponseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// True when `identifier` already submitted a response to the survey.
    pub async fn has_responded(&self, survey_id: i64, identifier: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("has_responded");
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM responses
                WHERE survey_id = $1 AND employee_identifier = $2
            )
            "#,
        )
        .bind(survey_id)
        .bind(identifier)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Stores one response and its answers atomically. Returns the response id.
    pub async fn submit(
        &self,
        survey_id: i64,
        employee_identifier: Option<&str>,
        answers: &[NewAnswer],
    ) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("submit_response");
        let mut tx = self.pool.begin().await?;

        let response_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO responses (survey_id, employee_identifier)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(survey_id)
        .bind(employee_identifier)
        .fetch_one(&mut *tx)
        .await?;

        if !answers.is_empty() {
            let question_ids: Vec<i64> = answers.iter().map(|a| a.question_id).collect();
            let ratings: Vec<Option<i32>> = answers.iter().map(|a| a.rating).collect();
            let comments: Vec<String> = answers.iter().map(|a| a.comment.clone()).collect();
            let choices: Vec<String> = answers.iter().map(|a| a.choice.clone()).collect();

            sqlx::query(
                r#"
                INSERT INTO answers (response_id, question_id, rating, comment, choice)
                SELECT $1, q, r, c, ch
                FROM UNNEST($2::bigint[], $3::int[], $4::text[], $5::text[]) AS t(q, r, c, ch)
                "#,
            )
            .bind(response_id)
            .bind(&question_ids)
            .bind(&ratings)
            .bind(&comments)
            .bind(&choices)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        timer.record();
        Ok(response_id)
    }

    /// Number of responses matching the filter.
    pub async fn count(&self, filter: &ResponseFilter) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_responses");
        let sql = format!("SELECT COUNT(*) FROM responses r WHERE {RESPONSE_FILTER}");
        let result = sqlx::query_scalar::<_, i64>(&sql)
            .bind(filter.survey_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.question_id)
            .bind(filter.rating_min)
            .bind(filter.rating_max)
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    /// One page of matching responses, newest first.
    pub async fn list(
        &self,
        filter: &ResponseFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ResponseSummaryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_responses");
        let sql = format!(
            "SELECT r.id, r.submitted_at, r.survey_id, s.title AS survey_title \
             FROM responses r \
             JOIN surveys s ON s.id = r.survey_id \
             WHERE {RESPONSE_FILTER} \
             ORDER BY r.submitted_at DESC, r.id DESC \
             LIMIT $7 OFFSET $8"
        );
        let result = sqlx::query_as::<_, ResponseSummaryEntity>(&sql)
            .bind(filter.survey_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.question_id)
            .bind(filter.rating_min)
            .bind(filter.rating_max)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Answers of the given responses joined with their questions, limited to
    /// one question when `question_id` is set.
    pub async fn answers_for(
        &self,
        response_ids: &[i64],
        question_id: Option<i64>,
    ) -> Result<Vec<AnswerDetailEntity>, sqlx::Error> {
        if response_ids.is_empty() {
            return Ok(Vec::new());
        }
        let timer = QueryTimer::new("list_response_answers");
        let result = sqlx::query_as::<_, AnswerDetailEntity>(
            r#"
            SELECT a.response_id, a.question_id, q.text AS question_text,
                   q.question_type, a.rating, a.comment, a.choice
            FROM answers a
            JOIN questions q ON q.id = a.question_id
            WHERE a.response_id = ANY($1)
              AND ($2::bigint IS NULL OR a.question_id = $2)
            ORDER BY a.response_id, q.sort_order, q.id
            "#,
        )
        .bind(response_ids)
        .bind(question_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Flattened answer rows for export.
    ///
    /// Each answer must satisfy the question and rating conditions itself, so
    /// a rating range drops answers without a rating.
    pub async fn export_rows(&self, filter: &ResponseFilter) -> Result<Vec<ExportRowEntity>, sqlx::Error> {
        let timer = QueryTimer::new("export_response_rows");
        let result = sqlx::query_as::<_, ExportRowEntity>(
            r#"
            SELECT r.id AS response_id, r.submitted_at, s.id AS survey_id, s.title AS survey_title,
                   q.id AS question_id, q.text AS question_text, q.question_type,
                   a.rating, a.choice, a.comment
            FROM answers a
            JOIN responses r ON r.id = a.response_id
            JOIN surveys s ON s.id = r.survey_id
            JOIN questions q ON q.id = a.question_id
            WHERE ($1::bigint IS NULL OR r.survey_id = $1)
              AND ($2::date IS NULL OR r.submitted_at::date >= $2)
              AND ($3::date IS NULL OR r.submitted_at::date <= $3)
              AND ($4::bigint IS NULL OR a.question_id = $4)
              AND ($5::int IS NULL OR a.rating >= $5)
              AND ($6::int IS NULL OR a.rating <= $6)
            ORDER BY r.submitted_at DESC, r.id DESC, q.sort_order, q.id
            "#,
        )
        .bind(filter.survey_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.question_id)
        .bind(filter.rating_min)
        .bind(filter.rating_max)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
