//! Anonymous attempt counting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Attempts allowed per fingerprint when not configured otherwise.
pub const DEFAULT_MAX_ATTEMPTS: i32 = 2;

/// A stored attempt counter keyed by the hashed fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyAttempt {
    pub fingerprint_hash: String,
    pub attempts: i32,
    pub last_submitted: Option<DateTime<Utc>>,
}

/// Payload for the attempt check and increment endpoints.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AttemptRequest {
    pub survey: i64,

    #[validate(length(min = 1, max = 512, message = "fingerprint must be 1-512 characters"))]
    pub fingerprint: String,
}

/// Attempt status reported to the respondent's browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptStatus {
    pub allowed: bool,
    pub attempts: i32,
    pub max_attempts: i32,
}

impl AttemptStatus {
    pub fn new(attempts: i32, max_attempts: i32) -> Self {
        Self {
            allowed: attempts < max_attempts,
            attempts,
            max_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_allows_until_limit() {
        assert!(AttemptStatus::new(0, 2).allowed);
        assert!(AttemptStatus::new(1, 2).allowed);
        assert!(!AttemptStatus::new(2, 2).allowed);
        assert!(!AttemptStatus::new(5, 2).allowed);
    }

    #[test]
    fn test_request_requires_fingerprint() {
        let req = AttemptRequest {
            survey: 1,
            fingerprint: String::new(),
        };
        assert!(req.validate().is_err());
    }
}
