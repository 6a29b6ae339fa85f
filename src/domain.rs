mod email_address;
mod member;
mod person_name;

use thiserror::Error;

pub use email_address::{EmailAddress, EmailError};
pub use member::{ClassYear, ContactPreference, Member, NewMember, PhoneNumber, Profile};
pub use person_name::PersonName;

/// Rejected signup profile field
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProfileError {
    #[error("{0}")]
    Name(&'static str),

    #[error("Class year must be a four digit year")]
    ClassYear,

    #[error("Phone number is not valid")]
    Phone,

    #[error("Occupation too long")]
    Occupation,

    #[error("Unknown contact preference")]
    ContactPreference,
}
