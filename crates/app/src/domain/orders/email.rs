//! Customer email normalization.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::validation::ValidationError;

#[expect(
    clippy::expect_used,
    reason = "the pattern is a constant and covered by tests"
)]
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_]+([.-]?[A-Za-z0-9_]+)*@[A-Za-z0-9_]+([.-]?[A-Za-z0-9_]+)*(\.[A-Za-z0-9_]{2,3})+$")
        .expect("email pattern compiles")
});

/// Trim and lower-case `raw`, then check it looks like an email address.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyField`] for blank input and
/// [`ValidationError::InvalidEmail`] when the address does not match.
pub fn normalize_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim().to_lowercase();

    if email.is_empty() {
        return Err(ValidationError::EmptyField { field: "email" });
    }

    if !EMAIL.is_match(&email) {
        return Err(ValidationError::InvalidEmail { email });
    }

    Ok(email)
}
