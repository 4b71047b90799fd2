//! HTTP Request Handlers
//!
//! This module contains all HTTP request handlers organized by domain.

pub mod admin;
pub mod applications;
pub mod auth;
pub mod competitions;
pub mod events;
pub mod health;
pub mod registrations;

use std::time::Duration;

use axum::{http::StatusCode, middleware, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    constants::{API_BASE_PATH, MAX_REQUEST_BODY_BYTES},
    middleware::{
        logging_middleware, optional_auth_middleware, rate_limit_middleware, require_auth,
    },
    state::AppState,
};

/// Create all API routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .nest("/auth", auth::routes())
        .nest("/registrations", registrations::routes())
        .nest(
            "/competitions",
            competitions::routes().merge(applications::competition_routes()),
        )
        .nest("/applications", applications::routes())
        .nest(
            "/admin",
            admin::routes().route_layer(middleware::from_fn(require_auth)),
        )
}

/// The full application: API under its base path plus the shared layers
pub fn app(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config().server.request_timeout_secs);

    // the event stream stays open, so it is kept out of the timeout
    let api = routes()
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .merge(events::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ));

    Router::new()
        .nest(API_BASE_PATH, api)
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
