//! Admin registry handlers

mod handler;
pub mod request;
pub mod response;

pub use request::*;
pub use response::*;

use axum::{
    routing::{delete, get},
    Router,
};

use crate::state::AppState;

/// Admin routes (require authentication)
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admins", get(handler::list_admins).post(handler::grant_admin))
        .route("/admins/{uid}", delete(handler::revoke_admin))
        .route("/users", get(handler::list_users))
}
