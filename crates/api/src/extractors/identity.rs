//! Respondent identity extractor.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::services::identity::{identifier_from_env, identifier_from_headers};
use std::convert::Infallible;

use crate::app::AppState;

/// Employee identifier supplied by the authenticating proxy.
///
/// Falls back to the server's own session identity only when
/// `identity.allow_env_fallback` is enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeIdentity(pub Option<String>);

#[async_trait]
impl FromRequestParts<AppState> for EmployeeIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let from_headers = identifier_from_headers(|name| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        });

        let identifier = from_headers.or_else(|| {
            state
                .config
                .identity
                .allow_env_fallback
                .then(|| identifier_from_env(|name| std::env::var(name).ok()))
                .flatten()
        });

        Ok(EmployeeIdentity(identifier))
    }
}
