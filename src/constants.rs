//! Application-wide constants
//!
//! This module contains all constant values used throughout the application.
//! Constants are grouped by their purpose for better organization.

// =============================================================================
// SERVER DEFAULTS
// =============================================================================

/// Default server host address
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Default request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum accepted request body (content blocks can carry large tables)
pub const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

// =============================================================================
// DATABASE DEFAULTS
// =============================================================================

/// Default maximum database connections in the pool
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Seconds to wait for a pooled connection before reporting the store unavailable
pub const DEFAULT_DATABASE_ACQUIRE_TIMEOUT_SECS: u64 = 5;

/// Storage backends
pub mod storage_backends {
    pub const POSTGRES: &str = "postgres";
    pub const MEMORY: &str = "memory";
}

// =============================================================================
// AUTHENTICATION DEFAULTS
// =============================================================================

/// Default JWT token expiry in hours
pub const DEFAULT_JWT_EXPIRY_HOURS: i64 = 12;

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: u64 = 6;

/// Maximum password length
pub const MAX_PASSWORD_LENGTH: u64 = 128;

/// Length of temporary passwords issued on approval
pub const TEMPORARY_PASSWORD_LENGTH: usize = 12;

/// Role marker stored on admin grants
pub const ADMIN_ROLE: &str = "admin";

// =============================================================================
// LIVE UPDATES
// =============================================================================

/// Buffered change events per subscriber before it starts lagging
pub const CHANGE_FEED_CAPACITY: usize = 256;

/// Interval between SSE keep-alive comments in seconds
pub const SSE_KEEP_ALIVE_SECS: u64 = 15;

// =============================================================================
// API VERSIONING
// =============================================================================

/// API base path
pub const API_BASE_PATH: &str = "/api/v1";

// =============================================================================
// RATE LIMITING
// =============================================================================

/// Rate limiting configuration for public write endpoints
pub mod rate_limits {
    /// Login - max requests
    pub const AUTH_MAX_REQUESTS: i64 = 10;
    /// Login - window in seconds
    pub const AUTH_WINDOW_SECS: i64 = 60;

    /// Registration request submissions - max requests
    pub const REGISTRATION_MAX_REQUESTS: i64 = 5;
    /// Registration request submissions - window in seconds
    pub const REGISTRATION_WINDOW_SECS: i64 = 3600;

    /// Competition applications - max requests
    pub const APPLICATION_MAX_REQUESTS: i64 = 20;
    /// Competition applications - window in seconds
    pub const APPLICATION_WINDOW_SECS: i64 = 600;
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Maximum length of person names, group names and class labels
pub const MAX_NAME_LENGTH: u64 = 100;

/// Maximum length of free-text reasons and notes
pub const MAX_NOTE_LENGTH: u64 = 2000;

/// Maximum competition name length
pub const MAX_COMPETITION_NAME_LENGTH: u64 = 200;

/// Maximum competition description length
pub const MAX_COMPETITION_DESCRIPTION_LENGTH: u64 = 20000;

/// Maximum number of content blocks on a competition page
pub const MAX_CONTENT_BLOCKS: usize = 200;

/// Maximum number of columns in a table block
pub const MAX_TABLE_COLUMNS: usize = 20;

/// Maximum number of rows in a table block
pub const MAX_TABLE_ROWS: usize = 500;

/// Maximum number of members in a group application
pub const MAX_GROUP_MEMBERS: usize = 50;
