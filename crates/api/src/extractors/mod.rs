//! Custom Axum extractors.

pub mod admin_auth;
pub mod client_ip;
pub mod identity;

pub use admin_auth::{AdminAuth, OptionalAdminAuth};
pub use client_ip::ClientIp;
pub use identity::EmployeeIdentity;
