use actix_web::dev::HttpServiceFactory;
use actix_web::http::{header, Method, StatusCode};
use actix_web::{web, HttpResponse, ResponseError};

use chrono::Utc;

use serde::{Deserialize, Serialize};

use thiserror::Error;

use crate::domain::{EmailAddress, EmailError};
use crate::error::StoreError;
use crate::repo::Store;

/// JSON body sent back by the unsubscribe endpoint
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UnsubscribeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub already_unsubscribed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Request body. `email` stays untyped so a non-string value reads as missing.
#[derive(Debug, Default, Deserialize)]
struct UnsubscribeBody {
    #[serde(default)]
    email: Option<serde_json::Value>,
}

/// Successful unsubscribe outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unsubscribed {
    /// Flag flipped by this request
    Now,
    /// Flag was already set, nothing written
    Already,
}

impl From<Unsubscribed> for UnsubscribeResponse {
    fn from(outcome: Unsubscribed) -> Self {
        match outcome {
            Unsubscribed::Now => Self {
                success: true,
                message: Some("You have been successfully unsubscribed".into()),
                ..Default::default()
            },
            Unsubscribed::Already => Self {
                success: true,
                message: Some("You are already unsubscribed".into()),
                already_unsubscribed: Some(true),
                ..Default::default()
            },
        }
    }
}

/// Unsubscribe a member by email.
///
/// A single attempt: the member is looked up, left alone if already flagged, and otherwise
/// flagged with the current time. Store failures are reported, never retried.
pub async fn unsubscribe_member(
    store: &Store,
    email: Option<&serde_json::Value>,
) -> Result<Unsubscribed, UnsubscribeError> {
    let email: EmailAddress = match email {
        Some(serde_json::Value::String(email)) => email.parse()?,
        _ => return Err(EmailError::Missing.into()),
    };

    let repo = store.repo().map_err(|_| {
        tracing::error!("Store credentials not configured");
        UnsubscribeError::Configuration
    })?;

    let member = repo
        .find_by_email(&email)
        .await
        .map_err(UnsubscribeError::Lookup)?
        .ok_or(UnsubscribeError::NotFound)?;

    if member.unsubscribed {
        tracing::info!("Member already unsubscribed");
        return Ok(Unsubscribed::Already);
    }

    repo.mark_unsubscribed(&email, Utc::now())
        .await
        .map_err(UnsubscribeError::Update)?;

    Ok(Unsubscribed::Now)
}

/// Unsubscribe endpoint
#[tracing::instrument(name = "Unsubscribe a member", skip(store, body))]
async fn unsubscribe(
    store: web::Data<Store>,
    body: web::Bytes,
) -> Result<HttpResponse, UnsubscribeError> {
    // Malformed JSON is treated like a body without an email
    let body: UnsubscribeBody = serde_json::from_slice(&body).unwrap_or_default();

    let outcome = unsubscribe_member(store.get_ref(), body.email.as_ref()).await?;

    Ok(HttpResponse::Ok().json(UnsubscribeResponse::from(outcome)))
}

/// CORS pre-flight
async fn preflight() -> HttpResponse {
    HttpResponse::Ok().finish()
}

async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed()
        .insert_header((header::ALLOW, "POST, OPTIONS"))
        .json(serde_json::json!({ "error": "Method not allowed" }))
}

#[derive(Debug, Error)]
pub enum UnsubscribeError {
    #[error("{0}")]
    Validation(#[from] EmailError),

    #[error("Email not found in our system")]
    NotFound,

    #[error("Server configuration error")]
    Configuration,

    #[error("An unexpected error occurred")]
    Lookup(#[source] StoreError),

    #[error("Failed to unsubscribe. Please try again.")]
    Update(#[source] StoreError),
}

impl ResponseError for UnsubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Configuration | Self::Lookup(_) | Self::Update(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::Lookup(error) => {
                tracing::error!(error.cause_chain = ?error, "Store lookup failed");
            }
            Self::Update(error) => {
                tracing::error!(error.cause_chain = ?error, "Store update failed");
            }
            _ => {}
        }

        HttpResponse::build(self.status_code()).json(UnsubscribeResponse {
            success: false,
            error: Some(self.to_string()),
            ..Default::default()
        })
    }
}

/// Unsubscribe API endpoint
pub fn resource() -> impl HttpServiceFactory {
    web::resource("/unsubscribe")
        .route(web::post().to(unsubscribe))
        .route(web::method(Method::OPTIONS).to(preflight))
        .default_service(web::to(method_not_allowed))
}
