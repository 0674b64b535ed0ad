//! Shared utilities and common types for the survey portal backend.
//!
//! This crate provides functionality used across all other crates:
//! - Hashing helpers (SHA-256, keyed attempt fingerprints)
//! - JWT issuing and validation for admin sessions
//! - Password hashing with Argon2id and the admin password policy
//! - Page-number pagination
//! - Common validation logic

pub mod crypto;
pub mod jwt;
pub mod pagination;
pub mod password;
pub mod validation;
