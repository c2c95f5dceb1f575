//! Password type with strength validation.
//!
//! The remote service enforces these rules server-side; validating at parse
//! time keeps obviously-bad passwords from ever reaching the network.

use serde::Serialize;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length.
pub const MAX_PASSWORD_LENGTH: usize = 64;

/// Special characters accepted by the strength check.
const SPECIAL_CHARS: &str = "@$!%*?&";

/// Errors that can occur when parsing a [`Password`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// The input is shorter than the minimum length.
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    TooShort,
    /// The input is longer than the maximum length.
    #[error("password must be less than {MAX_PASSWORD_LENGTH} characters")]
    TooLong,
    /// No lowercase letter present.
    #[error("password must contain at least one lowercase letter")]
    MissingLowercase,
    /// No uppercase letter present.
    #[error("password must contain at least one uppercase letter")]
    MissingUppercase,
    /// No digit present.
    #[error("password must contain at least one number")]
    MissingDigit,
    /// No special character present.
    #[error("password must contain at least one special character (@$!%*?&)")]
    MissingSpecial,
}

/// A password that has passed the client-side strength check.
///
/// `Debug` is implemented manually so the plaintext never appears in logs.
/// The type serializes to its plaintext (it has to cross the wire on login
/// and signup) but is never deserialized from responses.
#[derive(Clone, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    /// Parse a `Password`, enforcing the strength rules.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is outside the 8-64 character range or
    /// is missing a lowercase letter, uppercase letter, digit, or special
    /// character.
    pub fn parse(s: &str) -> Result<Self, PasswordError> {
        if s.len() < MIN_PASSWORD_LENGTH {
            return Err(PasswordError::TooShort);
        }
        if s.len() > MAX_PASSWORD_LENGTH {
            return Err(PasswordError::TooLong);
        }
        if !s.chars().any(|c| c.is_ascii_lowercase()) {
            return Err(PasswordError::MissingLowercase);
        }
        if !s.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(PasswordError::MissingUppercase);
        }
        if !s.chars().any(|c| c.is_ascii_digit()) {
            return Err(PasswordError::MissingDigit);
        }
        if !s.chars().any(|c| SPECIAL_CHARS.contains(c)) {
            return Err(PasswordError::MissingSpecial);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the plaintext password.
    ///
    /// Only the request serializer should need this.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

impl std::str::FromStr for Password {
    type Err = PasswordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
