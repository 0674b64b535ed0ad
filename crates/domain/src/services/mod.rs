//! Domain services for the survey portal.
//!
//! Services contain business logic that operates on domain models and never
//! touch storage or HTTP.

pub mod dashboard;
pub mod identity;
pub mod percentages;
pub mod submission;
pub mod survey_sync;
pub mod text;

pub use dashboard::build_dashboard;
pub use percentages::rating_breakdown;
pub use submission::{validate_submission, SubmissionError};
pub use survey_sync::{normalize_new_survey, plan_update, SyncPlan, TreeEdit};
