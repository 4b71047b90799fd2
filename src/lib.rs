//! Natjecanja - School Competition Registration Portal
//!
//! Teachers request an account, administrators approve them, and approved
//! teachers publish competitions that students apply to.
//!
//! # Features
//!
//! - Registration requests reviewed by administrators
//! - Competitions with a publication workflow and a phase lifecycle
//! - Individual and team applications with review
//! - Editable competition pages built from content blocks
//! - Live change notifications over Server-Sent Events
//!
//! # Architecture
//!
//! The application follows a layered architecture:
//! - **Handlers**: HTTP request handlers (thin layer)
//! - **Services**: Business logic
//! - **Workflow**: Pure permission and state transition rules
//! - **Repositories**: Document storage (Postgres or in-memory)
//! - **Models**: Domain models

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod events;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod seed;
pub mod services;
pub mod state;
pub mod utils;
pub mod workflow;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, AppResult};
pub use services::Backend;
pub use state::AppState;
