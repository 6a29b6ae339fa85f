use std::env;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;

use config::{Config, Environment, File};

use secrecy::Secret;

use serde::{Deserialize, Serialize};
use serde_aux::prelude::*;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};

use url::Url;

use crate::client::{RestMemberStore, StoreApiKey};
use crate::forms::FieldSet;
use crate::repo::{PgMemberRepo, Store};

/// Store URL left in place by the settings template
pub const PLACEHOLDER_STORE_URL: &str = "YOUR_STORE_URL";

/// Runtime environment, either `Dev` for local development, or `Prod` for release
#[derive(Debug)]
pub enum Runtime {
    Dev,
    Prod,
}

impl Runtime {
    pub fn as_str(&self) -> &str {
        match self {
            Runtime::Dev => "dev",
            Runtime::Prod => "prod",
        }
    }
}

impl TryFrom<String> for Runtime {
    type Error = anyhow::Error;

    fn try_from(s: String) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Self::Dev),
            "prod" => Ok(Self::Prod),
            other => anyhow::bail!("{} is not a valid runtime environment", other),
        }
    }
}

/// Application settings wrapper
#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: ApplicationSettings,
    pub store: StoreSettings,
    #[serde(default)]
    pub public: PublicSettings,
}

impl Settings {
    /// Load application settings from the settings directory
    pub fn load() -> anyhow::Result<Self> {
        // Get the path to the settings directory
        let path = env::current_dir()?.join("settings");
        // Get the current environment based on the `APP_ENV` environment variable, default to `Dev`
        let runtime: Runtime = env::var("APP_ENV")
            .unwrap_or_else(|_| "dev".into())
            .try_into()?;

        Self::load_from(runtime, &path)
    }
    /// Load application settings from a specified path and runtime
    pub fn load_from(runtime: Runtime, base_path: &Path) -> anyhow::Result<Self> {
        Config::builder()
            // Include the base settings
            .add_source(File::from(base_path.join("base")).required(true))
            // Include the runtime settings
            .add_source(File::from(base_path.join(runtime.as_str())).required(true))
            // Override/include any settings from environment variables
            // NOTE: Store credentials belong here. Takes the form `APP_<settings category>__<setting name>`.
            .add_source(
                Environment::with_prefix("app")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
            .context("Failed to load/deserialize settings")
    }
    /// The configuration handed to the browser-side forms
    pub fn public_config(&self) -> PublicConfig {
        PublicConfig {
            store_url: self.store.url.clone(),
            publishable_key: self.public.publishable_key.clone(),
            anon_key: None,
            analytics_key: self.public.analytics_key.clone(),
            analytics_host: self.public.analytics_host.clone(),
            contact_email: Some(self.app.contact_email.clone()),
            field_set: self.public.field_set,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ApplicationSettings {
    host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    port: u16,
    /// Address shown to members when something goes wrong
    pub contact_email: String,
}

impl ApplicationSettings {
    /// The application address to bind to
    pub fn addr(&self) -> (&str, u16) {
        (&self.host, self.port)
    }
}

/// Server-side store credentials. Either both `url` and `api_key`, or `database`.
#[derive(Debug, Deserialize)]
pub struct StoreSettings {
    url: Option<String>,
    api_key: Option<Secret<String>>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    api_timeout_milliseconds: u64,
    database: Option<DatabaseSettings>,
}

impl StoreSettings {
    /// The store REST API timeout duration
    pub fn api_timeout(&self) -> Duration {
        Duration::from_millis(self.api_timeout_milliseconds)
    }
    /// Build the store handle. Missing credentials give [`Store::Disabled`] rather than an error.
    pub fn store(&self) -> anyhow::Result<Store> {
        use secrecy::ExposeSecret;

        if let Some(database) = &self.database {
            let pool = PgPoolOptions::new()
                .acquire_timeout(self.api_timeout())
                .connect_lazy_with(database.with_db());
            return Ok(Store::enabled(PgMemberRepo::new(pool)));
        }

        let url = non_blank(self.url.as_deref()).filter(|url| *url != PLACEHOLDER_STORE_URL);
        let api_key = self
            .api_key
            .as_ref()
            .filter(|key| !key.expose_secret().trim().is_empty());

        match (url, api_key) {
            (Some(url), Some(api_key)) => {
                let url = Url::parse(url).context("Failed to parse store URL")?;
                let store = RestMemberStore::new(url, api_key.clone().into(), self.api_timeout())?;
                Ok(Store::enabled(store))
            }
            _ => {
                tracing::warn!("Store credentials not configured, unsubscribe requests will fail");
                Ok(Store::Disabled)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    port: u16,
    host: String,
    name: String,
    username: String,
    password: Secret<String>,
    require_ssl: bool,
}

impl DatabaseSettings {
    /// The database connection options, without specifying the database name
    pub fn without_db(&self) -> PgConnectOptions {
        use secrecy::ExposeSecret;

        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };

        PgConnectOptions::new()
            .port(self.port)
            .host(&self.host)
            .ssl_mode(ssl_mode)
            .username(&self.username)
            .password(self.password.expose_secret())
    }
    /// The database connection options, with the database name
    pub fn with_db(&self) -> PgConnectOptions {
        self.without_db().database(&self.name)
    }
}

/// Client-facing keys. Publishable only, never the server store key.
#[derive(Debug, Default, Deserialize)]
pub struct PublicSettings {
    publishable_key: Option<String>,
    analytics_key: Option<String>,
    analytics_host: Option<String>,
    #[serde(default)]
    field_set: FieldSet,
}

/// Configuration object loaded by the browser-side forms
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publishable_key: Option<String>,
    /// Legacy name for the publishable key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anon_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analytics_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analytics_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    /// Fields collected by the signup form
    #[serde(default)]
    pub field_set: FieldSet,
}

impl PublicConfig {
    /// The publishable key, falling back to the legacy anon key
    pub fn store_key(&self) -> Option<&str> {
        non_blank(self.publishable_key.as_deref()).or_else(|| non_blank(self.anon_key.as_deref()))
    }
    /// The store URL, unless absent or still the template placeholder
    pub fn store_url(&self) -> Option<&str> {
        non_blank(self.store_url.as_deref()).filter(|url| *url != PLACEHOLDER_STORE_URL)
    }
    /// Build the client-side store handle used for direct inserts
    pub fn store(&self, api_timeout: Duration) -> anyhow::Result<Store> {
        let (Some(url), Some(key)) = (self.store_url(), self.store_key()) else {
            tracing::info!("Store not configured, signups will not be saved");
            return Ok(Store::Disabled);
        };

        let url = Url::parse(url).context("Failed to parse store URL")?;
        let key: StoreApiKey = key.parse().context("Failed to parse store key")?;
        let store = RestMemberStore::new(url, key, api_timeout)?;

        Ok(Store::enabled(store))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
