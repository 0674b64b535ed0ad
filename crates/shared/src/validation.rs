//! Common validation utilities.

use chrono::NaiveDate;
use validator::ValidationError;

/// Lowest accepted rating value.
pub const RATING_MIN: i32 = 1;

/// Highest accepted rating value.
pub const RATING_MAX: i32 = 5;

/// Validates that a rating is within 1..=5.
pub fn validate_rating(rating: i32) -> Result<(), ValidationError> {
    if (RATING_MIN..=RATING_MAX).contains(&rating) {
        Ok(())
    } else {
        let mut err = ValidationError::new("rating_range");
        err.message = Some("Rating must be between 1 and 5".into());
        Err(err)
    }
}

/// Validates that a string has at least one non-whitespace character.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("This field may not be blank.".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Validates a `max_chars` limit for free-text questions.
pub fn validate_max_chars(max_chars: i32) -> Result<(), ValidationError> {
    if max_chars >= 1 {
        Ok(())
    } else {
        let mut err = ValidationError::new("max_chars_range");
        err.message = Some("maxChars must be a positive number".into());
        Err(err)
    }
}

/// Parses a `YYYY-MM-DD` query parameter; anything else yields `None`.
pub fn parse_date_param(value: Option<&str>) -> Option<NaiveDate> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
}

/// Parses an integer query parameter; anything else yields `None`.
pub fn parse_int_param(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.trim().parse::<i64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rating() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
        assert!(validate_rating(-1).is_err());
    }

    #[test]
    fn test_validate_rating_message() {
        let err = validate_rating(9).unwrap_err();
        assert_eq!(err.code, "rating_range");
        assert_eq!(
            err.message.as_deref(),
            Some("Rating must be between 1 and 5")
        );
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("Quarterly survey").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank("   \t").is_err());
    }

    #[test]
    fn test_validate_max_chars() {
        assert!(validate_max_chars(1).is_ok());
        assert!(validate_max_chars(0).is_err());
    }

    #[test]
    fn test_parse_date_param() {
        assert_eq!(
            parse_date_param(Some("2024-03-09")),
            NaiveDate::from_ymd_opt(2024, 3, 9)
        );
        assert_eq!(parse_date_param(Some("09/03/2024")), None);
        assert_eq!(parse_date_param(Some("2024-02-30")), None);
        assert_eq!(parse_date_param(Some("")), None);
        assert_eq!(parse_date_param(None), None);
    }

    #[test]
    fn test_parse_int_param() {
        assert_eq!(parse_int_param(Some("12")), Some(12));
        assert_eq!(parse_int_param(Some(" 7 ")), Some(7));
        assert_eq!(parse_int_param(Some("x")), None);
        assert_eq!(parse_int_param(None), None);
    }
}
