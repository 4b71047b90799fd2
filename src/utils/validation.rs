//! Input validation utilities

use std::sync::LazyLock;

use regex::Regex;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap_or_else(|e| panic!("invalid email pattern: {e}"))
});

/// `local@domain.tld` with no whitespace
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Lowercase and trim an email so lookups are case-insensitive
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Absolute http(s) link
pub fn validate_link(link: &str) -> Result<(), &'static str> {
    let link = link.trim();
    let rest = link
        .strip_prefix("https://")
        .or_else(|| link.strip_prefix("http://"))
        .ok_or("Link must start with http:// or https://")?;
    if rest.is_empty() || rest.chars().any(char::is_whitespace) {
        return Err("Invalid link");
    }
    Ok(())
}

/// Sanitize string input (remove control characters, trim whitespace)
pub fn sanitize_string(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Sanitized value, or `None` when nothing is left
pub fn sanitize_optional(input: Option<&str>) -> Option<String> {
    input.map(sanitize_string).filter(|s| !s.is_empty())
}
