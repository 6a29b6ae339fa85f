use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use serde::{Deserialize, Serialize};
use serde_aux::prelude::*;

use unicode_segmentation::UnicodeSegmentation;

use super::{EmailAddress, PersonName, ProfileError};

const MAX_OCCUPATION_LEN: usize = 256;
const MIN_PHONE_DIGITS: usize = 7;

/// Stored member record, as read back for the unsubscribe flow
#[derive(Debug, Clone, PartialEq, Deserialize, sqlx::FromRow)]
pub struct Member {
    /// Normalized email, unique across members
    pub email: String,
    /// A null flag reads as still subscribed
    #[serde(default, deserialize_with = "deserialize_default_from_null")]
    pub unsubscribed: bool,
    /// `Some` if and only if `unsubscribed` is set
    #[serde(default)]
    pub unsubscribed_at: Option<DateTime<Utc>>,
}

/// New member request, built by the signup form
#[derive(Debug, Clone)]
pub struct NewMember {
    pub email: EmailAddress,
    pub created_at: DateTime<Utc>,
    pub profile: Profile,
}

impl NewMember {
    pub fn new(email: EmailAddress, profile: Profile) -> Self {
        Self {
            email,
            created_at: Utc::now(),
            profile,
        }
    }
}

/// Optional profile fields. Written once at signup, never touched again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub name: Option<PersonName>,
    pub class_year: Option<ClassYear>,
    pub phone: Option<PhoneNumber>,
    pub occupation: Option<String>,
    pub contact_preference: Option<ContactPreference>,
}

impl Profile {
    /// Parse an occupation, treating blank input as absent
    pub fn parse_occupation(value: &str) -> Result<Option<String>, ProfileError> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }
        if value.graphemes(true).count() > MAX_OCCUPATION_LEN {
            return Err(ProfileError::Occupation);
        }
        Ok(Some(value.to_string()))
    }
}

/// Graduating class year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ClassYear(u16);

impl ClassYear {
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl FromStr for ClassYear {
    type Err = ProfileError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.len() != 4 {
            return Err(ProfileError::ClassYear);
        }
        match value.parse::<u16>() {
            Ok(year) if (1900..=2100).contains(&year) => Ok(Self(year)),
            _ => Err(ProfileError::ClassYear),
        }
    }
}

/// A loosely validated phone number: digits plus the usual separators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for PhoneNumber {
    type Err = ProfileError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();

        let allowed = |c: char| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' ' | '.');
        if !value.chars().all(allowed) {
            return Err(ProfileError::Phone);
        }
        if value.chars().filter(char::is_ascii_digit).count() < MIN_PHONE_DIGITS {
            return Err(ProfileError::Phone);
        }
        Ok(Self(value.to_string()))
    }
}

/// How a member prefers to be contacted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactPreference {
    Email,
    Phone,
    Either,
}

impl ContactPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Either => "either",
        }
    }
}

impl FromStr for ContactPreference {
    type Err = ProfileError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "email" => Ok(Self::Email),
            "phone" => Ok(Self::Phone),
            "either" => Ok(Self::Either),
            _ => Err(ProfileError::ContactPreference),
        }
    }
}

impl fmt::Display for ContactPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
