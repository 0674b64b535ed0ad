use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use shared::jwt::JwtConfig;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::error::ApiError;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, security_headers_middleware,
    trace_id, RateLimiterState,
};
use crate::routes::{auth, dashboard, health, public, responses, surveys, users};
use crate::services::AuthService;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    /// Token signing keys; `None` when the configured keys could not be parsed.
    pub jwt: Option<Arc<JwtConfig>>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool) -> Self {
        let jwt = match AuthService::jwt_config(&config.jwt) {
            Ok(jwt) => Some(Arc::new(jwt)),
            Err(e) => {
                tracing::error!(error = %e, "Invalid JWT keys, admin endpoints are unavailable");
                None
            }
        };
        let rate_limiter = RateLimiterState::new(config.security.rate_limit_per_minute).map(Arc::new);

        Self {
            pool,
            config: Arc::new(config),
            jwt,
            rate_limiter,
        }
    }

    /// Admin authentication service, 503 when no signing keys are loaded.
    pub fn auth_service(&self) -> Result<AuthService, ApiError> {
        let jwt = self.jwt.clone().ok_or_else(|| {
            ApiError::ServiceUnavailable("Admin authentication is not configured".to_string())
        })?;
        Ok(AuthService::new(self.pool.clone(), jwt))
    }
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    build_router(AppState::new(config, pool))
}

pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Anonymous endpoints that write, plus login: rate limited per client IP
    let limited_routes = Router::new()
        .route("/api/survey/submit/", post(public::submit_survey))
        .route("/api/survey/attempts/check/", post(public::check_attempts))
        .route(
            "/api/survey/attempts/increment/",
            post(public::increment_attempts),
        )
        .route("/api/admin/login/", post(auth::login))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    let public_routes = Router::new()
        .route("/api/survey/active/", get(public::active_survey))
        .route("/api/admin/token/refresh/", post(auth::refresh))
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    // Role checks happen in the handlers through the AdminAuth extractor
    let admin_routes = Router::new()
        .route("/api/admin/change-password/", post(auth::change_password))
        .route(
            "/api/admin/users/",
            get(users::list_users).post(users::create_user),
        )
        .route(
            "/api/admin/users/:id/",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/api/admin/users/:id/reset-password/",
            post(users::reset_password),
        )
        .route(
            "/api/admin/surveys/",
            get(surveys::list_surveys).post(surveys::create_survey),
        )
        .route(
            "/api/admin/survey/create/",
            get(surveys::list_surveys).post(surveys::create_survey),
        )
        .route(
            "/api/admin/surveys/:id/",
            get(surveys::get_survey)
                .patch(surveys::update_survey)
                .delete(surveys::delete_survey),
        )
        .route(
            "/api/admin/surveys/:id/activate/",
            post(surveys::activate_survey),
        )
        .route("/api/admin/dashboard/", get(dashboard::dashboard))
        .route("/api/admin/responses/", get(responses::list_responses))
        .route(
            "/api/admin/survey/responses/",
            get(responses::list_responses),
        )
        .route(
            "/api/admin/responses/export.xlsx",
            get(responses::export_responses_xlsx),
        )
        .route(
            "/api/admin/responses/export.pdf",
            get(responses::export_responses_pdf),
        );

    Router::new()
        .merge(limited_routes)
        .merge(public_routes)
        .merge(admin_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
