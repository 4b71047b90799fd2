//! Application state management
//!
//! This module contains the shared application state that is passed
//! to all request handlers via Axum's State extractor.

use std::sync::Arc;

use redis::aio::ConnectionManager;

use crate::{config::Config, services::Backend};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

/// Inner state (wrapped in Arc for cheap cloning)
struct AppStateInner {
    /// Repositories, identity provider and change feed
    backend: Backend,

    /// Redis connection manager; rate limiting is off without one
    redis: Option<ConnectionManager>,

    /// Application configuration
    config: Config,
}

impl AppState {
    /// Create a new application state
    pub fn new(backend: Backend, redis: Option<ConnectionManager>, config: Config) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                backend,
                redis,
                config,
            }),
        }
    }

    pub fn backend(&self) -> &Backend {
        &self.inner.backend
    }

    /// Get a clone of the Redis connection manager, if configured
    pub fn redis(&self) -> Option<ConnectionManager> {
        self.inner.redis.clone()
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }
}
