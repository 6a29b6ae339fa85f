use chrono::{DateTime, Utc};

use sqlx::PgPool;

use crate::domain::{EmailAddress, Member, NewMember};
use crate::error::StoreResult;

use super::MemberRepo;

/// Postgres member repository, for running against the store's database directly
#[derive(Debug, Clone)]
pub struct PgMemberRepo {
    pool: PgPool,
}

impl PgMemberRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl MemberRepo for PgMemberRepo {
    #[tracing::instrument(name = "Fetch member by email", skip(self))]
    async fn find_by_email(&self, email: &EmailAddress) -> StoreResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(
            "select email, unsubscribed, unsubscribed_at from members where email = $1",
        )
        .bind(email.as_ref())
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    #[tracing::instrument(name = "Mark member unsubscribed", skip(self))]
    async fn mark_unsubscribed(
        &self,
        email: &EmailAddress,
        unsubscribed_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        sqlx::query(
            "update members set unsubscribed = true, unsubscribed_at = $2 \
             where email = $1 and unsubscribed = false",
        )
        .bind(email.as_ref())
        .bind(unsubscribed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(name = "Insert member", skip(self, new_member), fields(email = %new_member.email))]
    async fn insert(&self, new_member: &NewMember) -> StoreResult<()> {
        let profile = &new_member.profile;

        sqlx::query(
            "insert into members \
             (email, created_at, name, class_year, phone, occupation, contact_preference) \
             values ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(new_member.email.as_ref())
        .bind(new_member.created_at)
        .bind(profile.name.as_ref().map(|name| name.as_ref().to_string()))
        .bind(profile.class_year.map(|year| i32::from(year.value())))
        .bind(profile.phone.as_ref().map(|phone| phone.as_ref().to_string()))
        .bind(profile.occupation.clone())
        .bind(profile.contact_preference.map(|pref| pref.as_str()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
