//! Domain models for the survey portal.

pub mod admin_user;
pub mod attempt;
pub mod dashboard;
pub mod response;
pub mod survey;

pub use admin_user::{AdminRole, AdminUser};
pub use attempt::{AttemptStatus, SurveyAttempt};
pub use dashboard::DashboardResponse;
pub use response::{Answer, Response};
pub use survey::{Language, Question, QuestionType, Section, Survey, SurveyDetail};
