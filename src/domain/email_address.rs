use std::fmt;
use std::str::FromStr;

use regex::Regex;

use thiserror::Error;

lazy_static::lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

/// Reasons a user supplied email address is rejected
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EmailError {
    #[error("Email is required")]
    Missing,

    #[error("Invalid email format")]
    InvalidFormat,
}

/// A user supplied email-address, normalized to its trimmed, lowercase form
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Whether `value` has the shape `local@domain.tld`, without normalizing it first
    pub fn is_well_formed(value: &str) -> bool {
        EMAIL_REGEX.is_match(value)
    }
}

impl FromStr for EmailAddress {
    type Err = EmailError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.is_empty() {
            return Err(EmailError::Missing);
        }
        if !Self::is_well_formed(value) {
            return Err(EmailError::InvalidFormat);
        }

        // Normalize
        let value = value.trim().to_lowercase();

        Ok(Self(value))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
