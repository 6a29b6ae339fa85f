use anyhow::Context;

use reqwest::{Client, StatusCode};

use serde::Serialize;

use url::Url;

use crate::controller::unsubscribe::UnsubscribeResponse;

const UNSUBSCRIBE_PATH: &str = "/api/unsubscribe";

/// What the unsubscribe endpoint answered, as seen from the form
#[derive(Debug)]
pub enum UnsubscribeReply {
    /// 200, member flagged by this request
    Unsubscribed,
    /// 200, member was flagged before
    AlreadyUnsubscribed,
    /// 200 with `success: false`
    Refused(Option<String>),
    /// 400
    Invalid(Option<String>),
    /// 404
    NotFound,
    /// Any other status
    Failed(StatusCode),
    /// The endpoint could not be reached
    Network(reqwest::Error),
}

/// HTTP client for the unsubscribe endpoint
#[derive(Debug, Clone)]
pub struct UnsubscribeClient {
    client: Client,
    endpoint: Url,
}

impl UnsubscribeClient {
    pub fn new(site_url: Url) -> anyhow::Result<Self> {
        let endpoint = site_url
            .join(UNSUBSCRIBE_PATH)
            .context("Failed to create unsubscribe endpoint URL")?;

        Ok(Self {
            client: Client::new(),
            endpoint,
        })
    }

    /// Submit a single unsubscribe request. Never retried.
    #[tracing::instrument(name = "Submit unsubscribe request", skip(self))]
    pub async fn unsubscribe(&self, email: &str) -> UnsubscribeReply {
        let res = match self
            .client
            .post(self.endpoint.clone())
            .json(&UnsubscribeRequest { email })
            .send()
            .await
        {
            Ok(res) => res,
            Err(error) => {
                tracing::error!(error.cause_chain = ?error, "Failed to reach unsubscribe endpoint");
                return UnsubscribeReply::Network(error);
            }
        };

        let status = res.status();
        // Unparseable bodies fall back to the per-status defaults
        let body: UnsubscribeResponse = res.json().await.unwrap_or_default();

        match status {
            StatusCode::OK if body.success && body.already_unsubscribed == Some(true) => {
                UnsubscribeReply::AlreadyUnsubscribed
            }
            StatusCode::OK if body.success => UnsubscribeReply::Unsubscribed,
            StatusCode::OK => UnsubscribeReply::Refused(body.error),
            StatusCode::NOT_FOUND => UnsubscribeReply::NotFound,
            StatusCode::BAD_REQUEST => UnsubscribeReply::Invalid(body.error),
            other => UnsubscribeReply::Failed(other),
        }
    }
}

#[derive(Debug, Serialize)]
struct UnsubscribeRequest<'a> {
    email: &'a str,
}
