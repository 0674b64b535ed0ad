//! Repository implementations for database operations.

pub mod admin_user;
pub mod attempt;
pub mod dashboard;
pub mod response;
pub mod survey;

pub use admin_user::AdminUserRepository;
pub use attempt::AttemptRepository;
pub use dashboard::{DashboardRepository, DashboardScope};
pub use response::ResponseRepository;
pub use survey::SurveyRepository;
