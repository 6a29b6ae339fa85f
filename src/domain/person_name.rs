use std::collections::HashSet;
use std::str::FromStr;

use unicode_segmentation::UnicodeSegmentation;

use super::ProfileError;

const MAX_LEN: usize = 256;

/// A member's display name, as entered on the signup form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName(String);

impl AsRef<str> for PersonName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for PersonName {
    type Err = ProfileError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        lazy_static::lazy_static! {
            static ref INVALID_CHARS: HashSet<char> = vec!['/', '(', ')', '"', '<', '>', '\\', '{', '}']
                .into_iter()
                .collect();
        }

        let value = value.trim();

        if value.is_empty() {
            return Err(ProfileError::Name("Name cannot be empty"));
        }
        if value.graphemes(true).count() > MAX_LEN {
            return Err(ProfileError::Name("Name too long"));
        }
        if value.chars().any(|c| INVALID_CHARS.contains(&c)) {
            return Err(ProfileError::Name("Name contains invalid characters"));
        }
        Ok(Self(value.to_string()))
    }
}
