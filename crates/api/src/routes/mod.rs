//! HTTP route handlers.

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod public;
pub mod responses;
pub mod surveys;
pub mod users;
