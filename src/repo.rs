use std::fmt::Debug;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{EmailAddress, Member, NewMember};
use crate::error::{StoreError, StoreResult};

mod postgres;

pub use postgres::PgMemberRepo;

/// Member repository trait, implemented for each backing store.
/// NOTE: Intended to facilitate easier testing/mocking
#[async_trait::async_trait]
pub trait MemberRepo: Debug + Send + Sync {
    /// Look up a member by normalized email
    async fn find_by_email(&self, email: &EmailAddress) -> StoreResult<Option<Member>>;

    /// Flag a still-subscribed member as unsubscribed. Members already flagged are left untouched.
    async fn mark_unsubscribed(
        &self,
        email: &EmailAddress,
        unsubscribed_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Insert a new member, failing with [`StoreError::Conflict`] if the email is taken
    async fn insert(&self, new_member: &NewMember) -> StoreResult<()>;
}

/// Handle to the member store, constructed once at startup
#[derive(Debug, Clone)]
pub enum Store {
    /// No store credentials were configured
    Disabled,
    Enabled(Arc<dyn MemberRepo>),
}

impl Store {
    pub fn enabled(repo: impl MemberRepo + 'static) -> Self {
        Self::Enabled(Arc::new(repo))
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled(_))
    }

    /// The configured repository, or [`StoreError::Disabled`]
    pub fn repo(&self) -> StoreResult<&dyn MemberRepo> {
        match self {
            Self::Enabled(repo) => Ok(repo.as_ref()),
            Self::Disabled => Err(StoreError::Disabled),
        }
    }
}
