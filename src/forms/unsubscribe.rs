use url::Url;

use crate::client::{UnsubscribeClient, UnsubscribeReply};
use crate::domain::EmailAddress;

use super::Notice;

const SUBMIT_LABEL: &str = "Unsubscribe";
const PROGRESS_LABEL: &str = "Processing...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Idle,
    Validating,
    Submitting,
}

/// Final result of one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Unsubscribed,
    AlreadyUnsubscribed,
    NotFound,
    Invalid,
    Failed,
}

/// Unsubscribe form: validates locally, calls the endpoint, maps the reply to a notice
#[derive(Debug)]
pub struct UnsubscribeForm {
    client: UnsubscribeClient,
    contact_email: String,

    email: String,
    state: FormState,
    notice: Option<Notice>,
    outcome: Option<Outcome>,
}

impl UnsubscribeForm {
    pub fn new(client: UnsubscribeClient, contact_email: impl Into<String>) -> Self {
        Self {
            client,
            contact_email: contact_email.into(),
            email: String::new(),
            state: FormState::Idle,
            notice: None,
            outcome: None,
        }
    }

    /// Fill the email input from the page's `?email=` parameter, if present and valid
    pub fn prefill_from_url(&mut self, page_url: &Url) {
        let email = page_url
            .query_pairs()
            .find(|(key, _)| key == "email")
            .map(|(_, value)| value.into_owned());

        if let Some(email) = email.filter(|email| EmailAddress::is_well_formed(email)) {
            self.email = email;
        }
    }

    /// Edit the email input. Ignored while the input is disabled.
    pub fn set_email(&mut self, value: impl Into<String>) {
        if !self.is_locked() {
            self.email = value.into();
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Input and submit control are disabled while a request is in flight
    pub fn is_locked(&self) -> bool {
        self.state == FormState::Submitting
    }

    pub fn submit_label(&self) -> &'static str {
        if self.is_locked() {
            PROGRESS_LABEL
        } else {
            SUBMIT_LABEL
        }
    }

    /// Validate the input and lock the form.
    ///
    /// Returns the email to send, or `None` if the submission ended locally.
    pub fn begin_submit(&mut self) -> Option<String> {
        if self.is_locked() {
            return None;
        }

        self.notice = None;
        self.state = FormState::Validating;

        let email = self.email.trim().to_string();
        if email.is_empty() {
            self.conclude(Outcome::Invalid, Notice::error("Please enter your email address."));
            return None;
        }
        if !EmailAddress::is_well_formed(&email) {
            self.conclude(Outcome::Invalid, Notice::error("Please enter a valid email address."));
            return None;
        }

        self.state = FormState::Submitting;
        Some(email)
    }

    /// Unlock the form and show the notice for the endpoint's reply
    pub fn finish_submit(&mut self, reply: UnsubscribeReply) -> Outcome {
        let (outcome, notice) = match reply {
            UnsubscribeReply::Unsubscribed => {
                self.email.clear();
                (
                    Outcome::Unsubscribed,
                    Notice::success(
                        "You have been successfully unsubscribed. We're sorry to see you go!",
                    ),
                )
            }
            UnsubscribeReply::AlreadyUnsubscribed => (
                Outcome::AlreadyUnsubscribed,
                Notice::info("You are already unsubscribed from our newsletter."),
            ),
            UnsubscribeReply::Refused(error) => (
                Outcome::Failed,
                Notice::error(error.unwrap_or_else(|| "An error occurred. Please try again.".into())),
            ),
            UnsubscribeReply::NotFound => (
                Outcome::NotFound,
                Notice::warning(
                    "This email address is not in our system. \
                     You may have already been removed or never subscribed.",
                ),
            ),
            UnsubscribeReply::Invalid(error) => (
                Outcome::Invalid,
                Notice::error(error.unwrap_or_else(|| "Invalid email address.".into())),
            ),
            UnsubscribeReply::Failed(status) => {
                tracing::warn!("Unsubscribe endpoint answered {}", status);
                (
                    Outcome::Failed,
                    Notice::error(format!(
                        "Something went wrong. Please try again or contact us at {}.",
                        self.contact_email
                    )),
                )
            }
            UnsubscribeReply::Network(_) => (
                Outcome::Failed,
                Notice::error("Network error. Please check your connection and try again."),
            ),
        };

        self.conclude(outcome, notice);
        outcome
    }

    /// Run a full submission against the endpoint
    pub async fn submit(&mut self) -> Option<Outcome> {
        match self.begin_submit() {
            Some(email) => {
                let reply = self.client.unsubscribe(&email).await;
                Some(self.finish_submit(reply))
            }
            None => self.outcome,
        }
    }

    fn conclude(&mut self, outcome: Outcome, notice: Notice) {
        self.outcome = Some(outcome);
        self.notice = Some(notice);
        self.state = FormState::Idle;
    }
}
