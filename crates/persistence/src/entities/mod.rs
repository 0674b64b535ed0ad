//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod admin_user;
pub mod attempt;
pub mod dashboard;
pub mod response;
pub mod survey;

pub use admin_user::AdminUserEntity;
pub use attempt::SurveyAttemptEntity;
pub use dashboard::{ChoiceCountEntity, DailyCountEntity, RatingCountEntity, RecentResponseEntity};
pub use response::{
    AnswerDetailEntity, AnswerEntity, ExportRowEntity, ResponseEntity, ResponseSummaryEntity,
};
pub use survey::{QuestionEntity, SectionEntity, SurveyEntity};
