use crate::error::{AppError, Result};
use regex::Regex;
use std::sync::OnceLock;

pub const INVALID_EMAIL_MESSAGE: &str = "Please enter a valid email address";

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
    })
}

/// Validate an email address and return it trimmed.
///
/// Rules:
/// - one `@` separating non-empty local and domain parts
/// - the domain contains a dot
/// - no whitespace anywhere
pub fn validate_email(email: &str) -> Result<String> {
    let email = email.trim();
    if email.is_empty() || !email_pattern().is_match(email) {
        return Err(AppError::InvalidInput(INVALID_EMAIL_MESSAGE.to_string()));
    }
    Ok(email.to_string())
}
