//! HTTP middleware

pub mod auth;
pub mod logging;
pub mod rate_limit;

pub use auth::{optional_auth_middleware, require_auth, AuthenticatedUser, OptionalAuth};
pub use logging::logging_middleware;
pub use rate_limit::rate_limit_middleware;
