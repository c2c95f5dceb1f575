//! Core types for Paperback.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod otp;
pub mod password;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::Money;
pub use otp::{Otp, OtpError};
pub use password::{Password, PasswordError};
pub use status::*;
