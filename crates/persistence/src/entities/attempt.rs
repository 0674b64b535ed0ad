//! Attempt counter entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::SurveyAttempt;
use sqlx::FromRow;

/// Database row mapping for the survey_attempts table.
#[derive(Debug, Clone, FromRow)]
pub struct SurveyAttemptEntity {
    pub fingerprint_hash: String,
    pub attempts: i32,
    pub last_submitted: Option<DateTime<Utc>>,
}

impl From<SurveyAttemptEntity> for SurveyAttempt {
    fn from(entity: SurveyAttemptEntity) -> Self {
        Self {
            fingerprint_hash: entity.fingerprint_hash,
            attempts: entity.attempts,
            last_submitted: entity.last_submitted,
        }
    }
}
