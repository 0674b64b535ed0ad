//! Dashboard payload and the raw aggregates it is built from.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::response::SurveyRef;

/// Order given to the synthetic section holding section-less rating questions.
pub const UNGROUPED_SECTION_ORDER: i64 = 1_000_000_000;

/// Number of days covered by the response time series.
pub const TIMESERIES_DAYS: i64 = 14;

/// Number of latest responses listed.
pub const RECENT_LIMIT: i64 = 10;

/// Raw dashboard query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    pub survey: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub region: Option<String>,
}

impl DashboardQuery {
    /// Region filter, ignoring blank values.
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref().filter(|r| !r.is_empty())
    }

    /// Echo of the filters as received.
    pub fn echo(&self) -> DashboardFilters {
        DashboardFilters {
            region: self.region.clone(),
            from: self.from.clone(),
            to: self.to.clone(),
            survey: self
                .survey
                .as_deref()
                .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
                .and_then(|s| s.parse().ok()),
        }
    }
}

/// Filters echoed back with the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardFilters {
    pub region: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub survey: Option<i64>,
}

/// One rating's share of a breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingShare {
    pub count: i64,
    pub total: i64,
    pub percent: f64,
}

/// Shares keyed "1".."5".
pub type RatingBreakdown = BTreeMap<String, RatingShare>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub responses: i64,
}

/// Average rating of one rating question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionAverage {
    pub question_id: i64,
    pub question: String,
    pub avg_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentResponse {
    pub id: i64,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: i64,
}

/// Rating shares of one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRatingOverview {
    pub section_id: Option<i64>,
    pub title: String,
    pub order: i64,
    pub ratings: RatingBreakdown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GenderCounts {
    pub male: i64,
    pub female: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GenderPercent {
    pub male: f64,
    pub female: f64,
}

/// Male/female split of the sex question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenderBreakdown {
    pub question_id: i64,
    pub question: String,
    pub counts: GenderCounts,
    pub total: i64,
    pub percent: GenderPercent,
}

/// Counts per answered choice label of a demographic question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceBreakdown {
    pub question_id: i64,
    pub question: String,
    pub counts: BTreeMap<String, i64>,
    pub total: i64,
    pub percent: BTreeMap<String, f64>,
}

/// Sections only present when a survey was resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardDetails {
    pub rating_overview: RatingBreakdown,
    pub rating_question_overview: BTreeMap<String, RatingBreakdown>,
    pub rating_section_overview: Vec<SectionRatingOverview>,
    pub gender: Option<GenderBreakdown>,
    pub age: Option<ChoiceBreakdown>,
    pub education: Option<ChoiceBreakdown>,
    pub filters: DashboardFilters,
}

/// Full dashboard payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub survey: Option<SurveyRef>,
    pub totals: Totals,
    pub averages: Vec<QuestionAverage>,
    pub recent: Vec<RecentResponse>,
    pub timeseries: Vec<DailyCount>,
    pub distributions: BTreeMap<String, BTreeMap<String, i64>>,
    #[serde(flatten)]
    pub details: Option<DashboardDetails>,
}

impl DashboardResponse {
    /// Payload returned when no survey could be resolved.
    pub fn empty() -> Self {
        Self {
            survey: None,
            totals: Totals::default(),
            averages: Vec::new(),
            recent: Vec::new(),
            timeseries: Vec::new(),
            distributions: BTreeMap::new(),
            details: None,
        }
    }
}

// ============================================================================
// Aggregates loaded from storage
// ============================================================================

/// Answer count for one (question, rating) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingCountRow {
    pub question_id: i64,
    pub rating: i32,
    pub count: i64,
}

/// Answer count for one (question, choice) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceCountRow {
    pub question_id: i64,
    pub choice: String,
    pub count: i64,
}

/// Everything the dashboard needs from the filtered response set.
#[derive(Debug, Clone, Default)]
pub struct DashboardAggregates {
    pub total_responses: i64,
    pub recent: Vec<RecentResponse>,
    pub daily_counts: Vec<DailyCount>,
    pub rating_counts: Vec<RatingCountRow>,
    pub choice_counts: Vec<ChoiceCountRow>,
}
