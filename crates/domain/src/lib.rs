//! Domain layer for the survey portal backend.
//!
//! This crate contains:
//! - Domain models (surveys, responses, admin accounts, dashboard payloads)
//! - Business logic services (submission checks, survey reconciliation,
//!   percentage normalization, respondent identity)

pub mod models;
pub mod services;
