//! Registration request handlers

mod handler;
pub mod request;
pub mod response;

pub use request::*;
pub use response::*;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Registration request routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(handler::submit_registration).get(handler::list_registrations),
        )
        .route(
            "/{id}",
            get(handler::get_registration).delete(handler::delete_registration),
        )
        .route("/{id}/approve", post(handler::approve_registration))
        .route("/{id}/reject", post(handler::reject_registration))
}
