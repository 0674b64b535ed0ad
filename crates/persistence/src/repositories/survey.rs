//! Survey repository: surveys with their sections and questions.

use domain::models::survey::{NewSurvey, SurveyChanges};
use domain::models::{Question, Section};
use domain::services::survey_sync::{
    QuestionDraft, SectionDraft, SectionFields, SectionTarget, SyncPlan, TreeEdit,
};
use sqlx::{PgConnection, PgPool};

use crate::entities::{QuestionEntity, SectionEntity, SurveyEntity};
use crate::metrics::QueryTimer;

const SURVEY_COLUMNS: &str = "id, title, description, header_title, header_subtitle, language, \
     is_active, budget_year, created_at";

const SECTION_COLUMNS: &str = "id, survey_id, title, description, sort_order";

const QUESTION_COLUMNS: &str = "id, survey_id, section_id, text, question_type, sort_order, \
     required, options, scale_min_label, scale_max_label, linear_scale_labels, \
     rating_display_style, max_chars";

/// Repository for survey authoring and lookup.
#[derive(Clone)]
pub struct SurveyRepository {
    pool: PgPool,
}

impl SurveyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// All surveys, newest first.
    pub async fn list(&self) -> Result<Vec<SurveyEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_surveys");
        let result = sqlx::query_as::<_, SurveyEntity>(&format!(
            "SELECT {SURVEY_COLUMNS} FROM surveys ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<SurveyEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_survey_by_id");
        let result = sqlx::query_as::<_, SurveyEntity>(&format!(
            "SELECT {SURVEY_COLUMNS} FROM surveys WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// The most recently created active survey.
    pub async fn find_active(&self) -> Result<Option<SurveyEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_active_survey");
        let result = sqlx::query_as::<_, SurveyEntity>(&format!(
            "SELECT {SURVEY_COLUMNS} FROM surveys WHERE is_active \
             ORDER BY created_at DESC, id DESC LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Sections of a survey ordered by (order, id).
    pub async fn find_sections(&self, survey_id: i64) -> Result<Vec<SectionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_survey_sections");
        let result = sqlx::query_as::<_, SectionEntity>(&format!(
            "SELECT {SECTION_COLUMNS} FROM sections WHERE survey_id = $1 ORDER BY sort_order, id"
        ))
        .bind(survey_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Questions of a survey ordered by (order, id).
    pub async fn find_questions(&self, survey_id: i64) -> Result<Vec<QuestionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_survey_questions");
        let result = sqlx::query_as::<_, QuestionEntity>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE survey_id = $1 ORDER BY sort_order, id"
        ))
        .bind(survey_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Inserts a survey with its sections and questions in one transaction.
    ///
    /// An active survey deactivates every other survey first.
    pub async fn create(
        &self,
        survey: &NewSurvey,
        sections: &[SectionDraft],
    ) -> Result<SurveyEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_survey");
        let mut tx = self.pool.begin().await?;

        if survey.is_active {
            deactivate_all(&mut tx).await?;
        }

        let created = sqlx::query_as::<_, SurveyEntity>(&format!(
            "INSERT INTO surveys \
                 (title, description, header_title, header_subtitle, language, is_active, budget_year) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {SURVEY_COLUMNS}"
        ))
        .bind(&survey.title)
        .bind(&survey.description)
        .bind(&survey.header_title)
        .bind(&survey.header_subtitle)
        .bind(survey.language.as_str())
        .bind(survey.is_active)
        .bind(survey.budget_year)
        .fetch_one(&mut *tx)
        .await?;

        for section in sections {
            let section_id = insert_section(&mut tx, created.id, &section.fields).await?;
            for question in &section.questions {
                insert_question(&mut tx, created.id, section_id, question).await?;
            }
        }

        tx.commit().await?;
        timer.record();
        Ok(created)
    }

    /// Applies scalar changes and an optional tree edit in one transaction.
    ///
    /// The survey, section and question rows are locked before the edit is
    /// planned, so concurrent edits of one survey apply one after another.
    /// Returns `None` when the survey does not exist.
    pub async fn update(
        &self,
        id: i64,
        changes: &SurveyChanges,
        edit: Option<&TreeEdit>,
    ) -> Result<Option<SurveyEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_survey");
        let mut tx = self.pool.begin().await?;

        let locked: Option<i64> =
            sqlx::query_scalar("SELECT id FROM surveys WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(None);
        }

        if changes.is_active == Some(true) {
            deactivate_others(&mut tx, id).await?;
        }

        let updated = sqlx::query_as::<_, SurveyEntity>(&format!(
            "UPDATE surveys SET \
                 title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 header_title = COALESCE($4, header_title), \
                 header_subtitle = COALESCE($5, header_subtitle), \
                 language = COALESCE($6, language), \
                 budget_year = COALESCE($7, budget_year), \
                 is_active = COALESCE($8, is_active) \
             WHERE id = $1 \
             RETURNING {SURVEY_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.title.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.header_title.as_deref())
        .bind(changes.header_subtitle.as_deref())
        .bind(changes.language.map(|l| l.as_str()))
        .bind(changes.budget_year)
        .bind(changes.is_active)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(edit) = edit {
            let (sections, questions) = lock_tree(&mut tx, id).await?;
            let plan = edit.plan(&sections, &questions);
            apply_plan(&mut tx, id, &plan).await?;
        }

        tx.commit().await?;
        timer.record();
        Ok(Some(updated))
    }

    /// Makes `id` the only active survey. Returns false when it does not exist.
    pub async fn activate(&self, id: i64) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("activate_survey");
        let mut tx = self.pool.begin().await?;

        deactivate_others(&mut tx, id).await?;
        let result = sqlx::query("UPDATE surveys SET is_active = TRUE WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            // Dropping the transaction rolls back the deactivation.
            return Ok(false);
        }

        tx.commit().await?;
        timer.record();
        Ok(true)
    }

    /// Deletes a survey and, by cascade, its tree and responses.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_survey");
        let result = sqlx::query("DELETE FROM surveys WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }
}

async fn deactivate_all(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE surveys SET is_active = FALSE WHERE is_active")
        .execute(conn)
        .await?;
    Ok(())
}

async fn deactivate_others(conn: &mut PgConnection, keep: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE surveys SET is_active = FALSE WHERE is_active AND id <> $1")
        .bind(keep)
        .execute(conn)
        .await?;
    Ok(())
}

/// Reads and row-locks the stored tree of a survey.
async fn lock_tree(
    conn: &mut PgConnection,
    survey_id: i64,
) -> Result<(Vec<Section>, Vec<Question>), sqlx::Error> {
    let sections = sqlx::query_as::<_, SectionEntity>(&format!(
        "SELECT {SECTION_COLUMNS} FROM sections WHERE survey_id = $1 \
         ORDER BY sort_order, id FOR UPDATE"
    ))
    .bind(survey_id)
    .fetch_all(&mut *conn)
    .await?;
    let questions = sqlx::query_as::<_, QuestionEntity>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions WHERE survey_id = $1 \
         ORDER BY sort_order, id FOR UPDATE"
    ))
    .bind(survey_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok((
        sections.into_iter().map(Into::into).collect(),
        questions.into_iter().map(Into::into).collect(),
    ))
}

async fn insert_section(
    conn: &mut PgConnection,
    survey_id: i64,
    fields: &SectionFields,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        INSERT INTO sections (survey_id, title, description, sort_order)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(survey_id)
    .bind(&fields.title)
    .bind(&fields.description)
    .bind(fields.order)
    .fetch_one(conn)
    .await
}

async fn insert_question(
    conn: &mut PgConnection,
    survey_id: i64,
    section_id: i64,
    draft: &QuestionDraft,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO questions (
            survey_id, section_id, text, question_type, sort_order, required, options,
            scale_min_label, scale_max_label, linear_scale_labels, rating_display_style, max_chars
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(survey_id)
    .bind(section_id)
    .bind(&draft.text)
    .bind(draft.question_type.as_str())
    .bind(draft.order)
    .bind(draft.required)
    .bind(&draft.options)
    .bind(&draft.scale_min_label)
    .bind(&draft.scale_max_label)
    .bind(&draft.linear_scale_labels)
    .bind(&draft.rating_display_style)
    .bind(draft.max_chars)
    .execute(conn)
    .await?;
    Ok(())
}

/// Writes a reconciliation plan. Questions are moved before stale sections
/// are dropped so the section cascade only removes rows the plan deletes.
async fn apply_plan(conn: &mut PgConnection, survey_id: i64, plan: &SyncPlan) -> Result<(), sqlx::Error> {
    let mut new_section_ids = Vec::with_capacity(plan.create_sections.len());
    for fields in &plan.create_sections {
        new_section_ids.push(insert_section(conn, survey_id, fields).await?);
    }
    let resolve = |target: SectionTarget| -> Result<i64, sqlx::Error> {
        match target {
            SectionTarget::Existing(id) => Ok(id),
            SectionTarget::New(idx) => new_section_ids
                .get(idx)
                .copied()
                .ok_or_else(|| sqlx::Error::Protocol(format!("unknown planned section {idx}"))),
        }
    };

    for update in &plan.update_sections {
        sqlx::query(
            r#"
            UPDATE sections SET title = $3, description = $4, sort_order = $5
            WHERE id = $1 AND survey_id = $2
            "#,
        )
        .bind(update.id)
        .bind(survey_id)
        .bind(&update.fields.title)
        .bind(&update.fields.description)
        .bind(update.fields.order)
        .execute(&mut *conn)
        .await?;
    }

    for update in &plan.update_questions {
        let section_id = resolve(update.section)?;
        let draft = &update.fields;
        sqlx::query(
            r#"
            UPDATE questions SET
                section_id = $3, text = $4, question_type = $5, sort_order = $6, required = $7,
                options = $8, scale_min_label = $9, scale_max_label = $10,
                linear_scale_labels = $11, rating_display_style = $12, max_chars = $13
            WHERE id = $1 AND survey_id = $2
            "#,
        )
        .bind(update.id)
        .bind(survey_id)
        .bind(section_id)
        .bind(&draft.text)
        .bind(draft.question_type.as_str())
        .bind(draft.order)
        .bind(draft.required)
        .bind(&draft.options)
        .bind(&draft.scale_min_label)
        .bind(&draft.scale_max_label)
        .bind(&draft.linear_scale_labels)
        .bind(&draft.rating_display_style)
        .bind(draft.max_chars)
        .execute(&mut *conn)
        .await?;
    }

    for create in &plan.create_questions {
        let section_id = resolve(create.section)?;
        insert_question(conn, survey_id, section_id, &create.fields).await?;
    }

    if !plan.delete_questions.is_empty() {
        sqlx::query("DELETE FROM questions WHERE survey_id = $1 AND id = ANY($2)")
            .bind(survey_id)
            .bind(&plan.delete_questions)
            .execute(&mut *conn)
            .await?;
    }

    if !plan.delete_sections.is_empty() {
        sqlx::query("DELETE FROM sections WHERE survey_id = $1 AND id = ANY($2)")
            .bind(survey_id)
            .bind(&plan.delete_sections)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}
