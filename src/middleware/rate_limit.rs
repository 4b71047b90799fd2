//! Rate limiting middleware
//!
//! Fixed-window counters in Redis, keyed by a hash of the client address.
//! Only the public write endpoints are limited. Without Redis, or when Redis
//! fails, requests pass.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use redis::AsyncCommands;
use tracing::warn;

use crate::{
    constants::{rate_limits, API_BASE_PATH},
    error::AppError,
    state::AppState,
    utils::hash_string,
};

/// A limited endpoint group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub name: &'static str,
    pub max_requests: i64,
    pub window_secs: i64,
}

const AUTH: Bucket = Bucket {
    name: "auth",
    max_requests: rate_limits::AUTH_MAX_REQUESTS,
    window_secs: rate_limits::AUTH_WINDOW_SECS,
};

const REGISTRATIONS: Bucket = Bucket {
    name: "registrations",
    max_requests: rate_limits::REGISTRATION_MAX_REQUESTS,
    window_secs: rate_limits::REGISTRATION_WINDOW_SECS,
};

const APPLICATIONS: Bucket = Bucket {
    name: "applications",
    max_requests: rate_limits::APPLICATION_MAX_REQUESTS,
    window_secs: rate_limits::APPLICATION_WINDOW_SECS,
};

/// Bucket for a request, if it is limited at all
pub fn bucket_for(method: &Method, path: &str) -> Option<Bucket> {
    if method != Method::POST {
        return None;
    }
    let path = path.strip_prefix(API_BASE_PATH).unwrap_or(path);

    if path == "/auth/login" {
        Some(AUTH)
    } else if path == "/registrations" || path == "/registrations/" {
        Some(REGISTRATIONS)
    } else if path.starts_with("/competitions/") && path.trim_end_matches('/').ends_with("/applications") {
        Some(APPLICATIONS)
    } else {
        None
    }
}

/// Rate limit middleware
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(bucket) = bucket_for(request.method(), request.uri().path()) else {
        return Ok(next.run(request).await);
    };
    let Some(mut redis) = state.redis() else {
        return Ok(next.run(request).await);
    };
    let Some(addr) = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
    else {
        return Ok(next.run(request).await);
    };

    let key = format!(
        "rate_limit:{}:{}",
        bucket.name,
        hash_string(&addr.ip().to_string())
    );

    match redis.incr::<_, _, i64>(&key, 1).await {
        Ok(count) => {
            if count == 1 {
                // Set expiry on first request
                if let Err(e) = redis.expire::<_, ()>(&key, bucket.window_secs).await {
                    warn!(bucket = bucket.name, error = %e, "Could not set rate limit window");
                }
            }
            if count > bucket.max_requests {
                warn!(bucket = bucket.name, count, "Rate limit exceeded");
                return Err(AppError::TooManyRequests);
            }
        }
        Err(e) => {
            warn!(bucket = bucket.name, error = %e, "Rate limiter unavailable, letting request through");
        }
    }

    Ok(next.run(request).await)
}
