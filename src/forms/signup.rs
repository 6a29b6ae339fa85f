use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::domain::{EmailAddress, NewMember, Profile, ProfileError};
use crate::error::{StoreError, StoreResult};
use crate::repo::Store;
use crate::settings::PublicConfig;

use super::{Banner, Notice};

const SUBMIT_LABEL: &str = "Join";
const PROGRESS_LABEL: &str = "Submitting...";

/// Which fields the signup form collects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSet {
    EmailOnly,
    #[default]
    Profile,
}

/// Raw form input, as typed by the visitor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupFields {
    pub email: String,
    pub name: String,
    pub class_year: String,
    pub phone: String,
    pub occupation: String,
    pub contact_preference: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupOutcome {
    /// New member stored
    Joined,
    /// Email already on the list, nothing overwritten
    AlreadyMember,
    /// No store configured, submission only logged
    Simulated,
    Invalid,
    Failed,
}

/// Mailing-list signup form, inserting straight into the store with the publishable key
#[derive(Debug)]
pub struct SignupForm {
    store: Store,
    field_set: FieldSet,
    contact_email: String,

    fields: SignupFields,
    submitting: bool,
    outcome: Option<SignupOutcome>,
    banner: Option<Banner>,
}

impl SignupForm {
    pub fn new(store: Store, field_set: FieldSet, contact_email: impl Into<String>) -> Self {
        Self {
            store,
            field_set,
            contact_email: contact_email.into(),
            fields: SignupFields::default(),
            submitting: false,
            outcome: None,
            banner: None,
        }
    }

    /// Build the form from the configuration served at `/api/config`
    pub fn from_config(config: &PublicConfig, api_timeout: Duration) -> anyhow::Result<Self> {
        let store = config.store(api_timeout)?;
        let contact_email = config.contact_email.clone().unwrap_or_default();

        Ok(Self::new(store, config.field_set, contact_email))
    }

    pub fn field_set(&self) -> FieldSet {
        self.field_set
    }

    pub fn fields(&self) -> &SignupFields {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut SignupFields {
        &mut self.fields
    }

    pub fn outcome(&self) -> Option<SignupOutcome> {
        self.outcome
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn dismiss_banner(&mut self) {
        if let Some(banner) = self.banner.as_mut() {
            banner.dismiss();
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn submit_label(&self) -> &'static str {
        if self.submitting {
            PROGRESS_LABEL
        } else {
            SUBMIT_LABEL
        }
    }

    /// Build the record to insert from the current input
    pub fn new_member(&self) -> Result<NewMember, Notice> {
        let email: EmailAddress = self
            .fields
            .email
            .trim()
            .parse()
            .map_err(|_| Notice::error("Please enter a valid email address."))?;

        let profile = match self.field_set {
            FieldSet::EmailOnly => Profile::default(),
            FieldSet::Profile => self
                .profile()
                .map_err(|error| Notice::error(error.to_string()))?,
        };

        Ok(NewMember::new(email, profile))
    }

    fn profile(&self) -> Result<Profile, ProfileError> {
        let fields = &self.fields;

        Ok(Profile {
            name: parse_optional(&fields.name)?,
            class_year: parse_optional(&fields.class_year)?,
            phone: parse_optional(&fields.phone)?,
            occupation: Profile::parse_occupation(&fields.occupation)?,
            contact_preference: parse_optional(&fields.contact_preference)?,
        })
    }

    /// Validate the input and lock the form.
    ///
    /// Returns the record to insert, or `None` if the submission ended locally.
    pub fn begin_submit(&mut self) -> Option<NewMember> {
        if self.submitting {
            return None;
        }

        match self.new_member() {
            Ok(new_member) => {
                self.submitting = true;
                Some(new_member)
            }
            Err(notice) => {
                self.conclude(SignupOutcome::Invalid, notice);
                None
            }
        }
    }

    /// Unlock the form and show the notice for the store's answer
    pub fn finish_submit(&mut self, result: StoreResult<()>) -> SignupOutcome {
        let (outcome, notice) = match result {
            Ok(()) => (
                SignupOutcome::Joined,
                Notice::success("Welcome to the community! We'll be in touch."),
            ),
            Err(StoreError::Disabled) => (
                SignupOutcome::Simulated,
                Notice::success("Thanks for your interest! (Note: Database not configured yet)"),
            ),
            Err(StoreError::Conflict) => (
                SignupOutcome::AlreadyMember,
                Notice::info("You're already signed up! We'll be in touch."),
            ),
            Err(error) => {
                tracing::error!(error.cause_chain = ?error, "Failed to save signup");
                (
                    SignupOutcome::Failed,
                    Notice::error(format!(
                        "Something went wrong. Please try again or email {} directly.",
                        self.contact_email
                    )),
                )
            }
        };

        if matches!(outcome, SignupOutcome::Joined | SignupOutcome::Simulated) {
            self.fields = SignupFields::default();
        }
        self.conclude(outcome, notice);

        outcome
    }

    /// Run a full submission against the store
    #[tracing::instrument(name = "Submit signup form", skip(self), fields(email = %self.fields.email))]
    pub async fn submit(&mut self) -> Option<SignupOutcome> {
        match self.begin_submit() {
            Some(new_member) => {
                let result = self.insert(&new_member).await;
                Some(self.finish_submit(result))
            }
            None => self.outcome,
        }
    }

    async fn insert(&self, new_member: &NewMember) -> StoreResult<()> {
        match self.store.repo() {
            Ok(repo) => repo.insert(new_member).await,
            Err(error) => {
                tracing::info!(?new_member, "Store not configured, signup not saved");
                Err(error)
            }
        }
    }

    fn conclude(&mut self, outcome: SignupOutcome, notice: Notice) {
        self.outcome = Some(outcome);
        self.banner = Some(Banner::show(notice, Instant::now()));
        self.submitting = false;
    }
}

/// Parse a field, treating blank input as absent
fn parse_optional<T>(value: &str) -> Result<Option<T>, ProfileError>
where
    T: std::str::FromStr<Err = ProfileError>,
{
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value.parse().map(Some)
}
