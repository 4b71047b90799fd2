//! Utility functions

pub mod crypto;
pub mod validation;

pub use crypto::{generate_secure_token, hash_password, hash_string, verify_password};
pub use validation::{is_valid_email, normalize_email, sanitize_string};
