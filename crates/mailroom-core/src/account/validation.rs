//! User validation.

use super::model::NewUser;

/// Validation error for a user entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Username is empty.
    EmptyUsername,
    /// Username contains `@`, whitespace or control characters.
    InvalidUsername,
    /// Email address format is invalid.
    InvalidEmail,
    /// Password is empty.
    EmptyPassword,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyUsername => "Username is required",
            Self::InvalidUsername => "Username may not contain '@', spaces or control characters",
            Self::InvalidEmail => "Invalid email address format",
            Self::EmptyPassword => "Password is required",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyUsername | Self::InvalidUsername => "username",
            Self::InvalidEmail => "email",
            Self::EmptyPassword => "password",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field(), self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating a user.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validate a user entry about to be registered under `domain`.
///
/// # Errors
///
/// Returns a vector of `ValidationError` if any fields are invalid.
pub fn validate_user(user: &NewUser, domain: &str) -> ValidationResult {
    let mut errors = Vec::new();

    if user.username.trim().is_empty() {
        errors.push(ValidationError::EmptyUsername);
    } else if user
        .username
        .chars()
        .any(|c| c == '@' || c.is_whitespace() || c.is_control())
    {
        errors.push(ValidationError::InvalidUsername);
    }

    if !is_valid_email(&user.email_in(domain)) {
        errors.push(ValidationError::InvalidEmail);
    }

    if user.password.is_empty() {
        errors.push(ValidationError::EmptyPassword);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Basic email validation.
fn is_valid_email(email: &str) -> bool {
    let email = email.trim();

    // Must contain exactly one @
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    // Single-label domains such as `localhost` are fine
    !domain.is_empty() && domain.split('.').all(|p| !p.is_empty())
}
