//! Aggregate rows read by the dashboard queries.

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::dashboard::{ChoiceCountRow, DailyCount, RatingCountRow, RecentResponse};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct RecentResponseEntity {
    pub id: i64,
    pub submitted_at: DateTime<Utc>,
}

impl From<RecentResponseEntity> for RecentResponse {
    fn from(entity: RecentResponseEntity) -> Self {
        Self {
            id: entity.id,
            submitted_at: entity.submitted_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DailyCountEntity {
    pub day: NaiveDate,
    pub count: i64,
}

impl From<DailyCountEntity> for DailyCount {
    fn from(entity: DailyCountEntity) -> Self {
        Self {
            date: entity.day,
            count: entity.count,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct RatingCountEntity {
    pub question_id: i64,
    pub rating: i32,
    pub count: i64,
}

impl From<RatingCountEntity> for RatingCountRow {
    fn from(entity: RatingCountEntity) -> Self {
        Self {
            question_id: entity.question_id,
            rating: entity.rating,
            count: entity.count,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ChoiceCountEntity {
    pub question_id: i64,
    pub choice: String,
    pub count: i64,
}

impl From<ChoiceCountEntity> for ChoiceCountRow {
    fn from(entity: ChoiceCountEntity) -> Self {
        Self {
            question_id: entity.question_id,
            choice: entity.choice,
            count: entity.count,
        }
    }
}
