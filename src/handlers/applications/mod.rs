//! Competition application handlers

mod handler;
pub mod request;
pub mod response;

pub use request::*;
pub use response::*;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::state::AppState;

/// Review routes, addressed by application id
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", delete(handler::delete_application))
        .route("/{id}/approve", post(handler::approve_application))
        .route("/{id}/reject", post(handler::reject_application))
}

/// Routes under a competition, merged into the competition router
pub fn competition_routes() -> Router<AppState> {
    Router::new().route(
        "/{id}/applications",
        get(handler::list_applications).post(handler::submit_application),
    )
}
