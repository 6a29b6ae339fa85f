use std::convert::Infallible;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

use chrono::{DateTime, Utc};

use reqwest::{Client, Method, RequestBuilder, Response};

use secrecy::Secret;

use serde::{Deserialize, Serialize};

use url::Url;

use crate::domain::{EmailAddress, Member, NewMember};
use crate::error::{StoreError, StoreResult, UNIQUE_VIOLATION};
use crate::repo::MemberRepo;

const API_KEY_HEADER: &str = "apikey";
const PREFER_HEADER: &str = "Prefer";
const MEMBERS_PATH: &str = "/rest/v1/members";
const MEMBER_COLUMNS: &str = "email,unsubscribed,unsubscribed_at";

/// Client for the hosted store's REST interface (PostgREST dialect)
#[derive(Debug)]
pub struct RestMemberStore {
    client: Client,

    api_members_url: Url,
    api_key: StoreApiKey,
}

impl RestMemberStore {
    pub fn new(api_base_url: Url, api_key: StoreApiKey, api_timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(api_timeout)
            .build()
            .context("Failed to build http client")?;

        let api_members_url = api_base_url
            .join(MEMBERS_PATH)
            .context("Failed to create members endpoint URL")?;

        Ok(Self {
            client,
            api_members_url,
            api_key,
        })
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        use secrecy::ExposeSecret;

        let key = self.api_key.expose_secret();
        self.client
            .request(method, url)
            .header(API_KEY_HEADER, key)
            .bearer_auth(key)
    }

    fn members_url_for(&self, email: &EmailAddress) -> Url {
        let mut url = self.api_members_url.clone();
        url.query_pairs_mut()
            .append_pair("email", &format!("eq.{}", email));
        url
    }
}

#[async_trait::async_trait]
impl MemberRepo for RestMemberStore {
    #[tracing::instrument(name = "Fetch member by email", skip(self))]
    async fn find_by_email(&self, email: &EmailAddress) -> StoreResult<Option<Member>> {
        let mut url = self.members_url_for(email);
        url.query_pairs_mut().append_pair("select", MEMBER_COLUMNS);

        let res = self.request(Method::GET, url).send().await?;
        let rows: Vec<Member> = error_for_status(res).await?.json().await?;

        Ok(rows.into_iter().next())
    }

    #[tracing::instrument(name = "Mark member unsubscribed", skip(self))]
    async fn mark_unsubscribed(
        &self,
        email: &EmailAddress,
        unsubscribed_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut url = self.members_url_for(email);
        url.query_pairs_mut().append_pair("unsubscribed", "is.false");

        let body = UnsubscribeUpdate {
            unsubscribed: true,
            unsubscribed_at,
        };

        let res = self
            .request(Method::PATCH, url)
            .header(PREFER_HEADER, "return=minimal")
            .json(&body)
            .send()
            .await?;
        error_for_status(res).await?;

        Ok(())
    }

    #[tracing::instrument(name = "Insert member", skip(self, new_member), fields(email = %new_member.email))]
    async fn insert(&self, new_member: &NewMember) -> StoreResult<()> {
        let body = NewMemberRow::from(new_member);

        let res = self
            .request(Method::POST, self.api_members_url.clone())
            .header(PREFER_HEADER, "return=minimal")
            .json(&body)
            .send()
            .await?;
        error_for_status(res).await?;

        Ok(())
    }
}

/// Map a non-success store response onto a [`StoreError`]
async fn error_for_status(res: Response) -> StoreResult<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body: StoreErrorBody = res.json().await.unwrap_or_default();
    if body.code.as_deref() == Some(UNIQUE_VIOLATION) {
        return Err(StoreError::Conflict);
    }

    Err(StoreError::Rejected {
        status: status.as_u16(),
        code: body.code,
        message: body.message.unwrap_or_else(|| status.to_string()),
    })
}

/// Publishable or service key for the store's REST interface
#[derive(Debug, Clone)]
pub struct StoreApiKey(Secret<String>);

impl FromStr for StoreApiKey {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Infallible> {
        let value = value.to_string();
        let value = Secret::new(value);

        Ok(Self(value))
    }
}

impl From<Secret<String>> for StoreApiKey {
    fn from(value: Secret<String>) -> Self {
        Self(value)
    }
}

impl secrecy::ExposeSecret<String> for StoreApiKey {
    fn expose_secret(&self) -> &String {
        self.0.expose_secret()
    }
}

#[derive(Debug, Default, Deserialize)]
struct StoreErrorBody {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct UnsubscribeUpdate {
    unsubscribed: bool,
    unsubscribed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct NewMemberRow<'a> {
    email: &'a str,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    class_year: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    occupation: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    contact_preference: Option<&'static str>,
}

impl<'a> From<&'a NewMember> for NewMemberRow<'a> {
    fn from(new_member: &'a NewMember) -> Self {
        let profile = &new_member.profile;
        Self {
            email: new_member.email.as_ref(),
            created_at: new_member.created_at,
            name: profile.name.as_ref().map(AsRef::as_ref),
            class_year: profile.class_year.map(|year| year.value()),
            phone: profile.phone.as_ref().map(AsRef::as_ref),
            occupation: profile.occupation.as_deref(),
            contact_preference: profile.contact_preference.map(|pref| pref.as_str()),
        }
    }
}
