//! One-time passcode type.
//!
//! Used for email verification and the forgotten-password flow. The service
//! issues 6-digit numeric codes.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Number of digits in a one-time passcode.
pub const OTP_LENGTH: usize = 6;

/// Errors that can occur when parsing an [`Otp`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpError {
    /// The input is empty.
    #[error("OTP is required")]
    Empty,
    /// The input is not exactly six digits.
    #[error("OTP must be {OTP_LENGTH} digits")]
    Malformed,
}

/// A 6-digit one-time passcode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Otp(String);

impl Otp {
    /// Parse an `Otp` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or is not exactly six ASCII
    /// digits.
    pub fn parse(s: &str) -> Result<Self, OtpError> {
        if s.is_empty() {
            return Err(OtpError::Empty);
        }
        if s.len() != OTP_LENGTH || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(OtpError::Malformed);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Otp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Otp {
    type Err = OtpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
