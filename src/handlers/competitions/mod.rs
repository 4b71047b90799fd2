//! Competition management handlers

mod handler;
pub mod request;
pub mod response;

pub use request::*;
pub use response::*;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;

/// Competition routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handler::list_competitions).post(handler::create_competition),
        )
        .route(
            "/{id}",
            get(handler::get_competition)
                .patch(handler::update_competition)
                .delete(handler::delete_competition),
        )
        // Publication
        .route("/{id}/submit", post(handler::submit_competition))
        .route("/{id}/approve", post(handler::approve_competition))
        .route("/{id}/reject", post(handler::reject_competition))
        // Phase
        .route("/{id}/start", post(handler::start_competition))
        .route("/{id}/end", post(handler::end_competition))
        .route("/{id}/visibility", put(handler::set_visibility))
        // Page content
        .route("/{id}/content", post(handler::edit_content))
        .route("/{id}/applicant-picker", get(handler::applicant_picker))
}
