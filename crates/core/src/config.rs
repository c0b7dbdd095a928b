//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the record store.
//! Nothing reads process-wide environment variables during request handling.
//!
//! Missing Airtable credentials are not a startup error: they are reported by
//! [`AirtableConfig::missing_settings`] so the binaries can warn, and the backend rejects the
//! first request with a classified error.

use crate::constants::{
    DEFAULT_AIRTABLE_API_URL, DEFAULT_TIMEOUT_SECS, ENV_ACCESS_TOKEN, ENV_API_URL, ENV_BASE_ID,
    ENV_STORE, ENV_TABLE_NAME, ENV_TIMEOUT_SECS,
};
use crate::error::{ConfigError, ConfigResult};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Which record store implementation to run against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StoreKind {
    /// The hosted Airtable base.
    #[default]
    Airtable,
    /// An in-process store seeded with placeholder rows.
    Memory,
}

impl FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "airtable" => Ok(Self::Airtable),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::StoreKind(s.to_owned())),
        }
    }
}

/// Connection settings for the Airtable backend.
#[derive(Clone)]
pub struct AirtableConfig {
    access_token: String,
    base_id: String,
    table_name: String,
    api_url: Url,
    timeout: Duration,
}

impl AirtableConfig {
    pub fn new(
        access_token: impl Into<String>,
        base_id: impl Into<String>,
        table_name: impl Into<String>,
        api_url: Url,
        timeout: Duration,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            base_id: base_id.into(),
            table_name: table_name.into(),
            api_url,
            timeout,
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn base_id(&self) -> &str {
        &self.base_id
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Names of the required settings that are blank.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        [
            (ENV_ACCESS_TOKEN, &self.access_token),
            (ENV_BASE_ID, &self.base_id),
            (ENV_TABLE_NAME, &self.table_name),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

// The access token never reaches logs.
impl fmt::Debug for AirtableConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AirtableConfig")
            .field("access_token", &"<redacted>")
            .field("base_id", &self.base_id)
            .field("table_name", &self.table_name)
            .field("api_url", &self.api_url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    store_kind: StoreKind,
    airtable: AirtableConfig,
}

impl CoreConfig {
    pub fn new(store_kind: StoreKind, airtable: AirtableConfig) -> Self {
        Self {
            store_kind,
            airtable,
        }
    }

    /// Resolve the configuration from process environment variables.
    ///
    /// Call once at startup, after `.env` has been loaded.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the API URL, timeout or store kind cannot be parsed.
    pub fn from_env() -> ConfigResult<Self> {
        let var = |name: &str| std::env::var(name).ok();

        let airtable = AirtableConfig::new(
            var(ENV_ACCESS_TOKEN).unwrap_or_default(),
            var(ENV_BASE_ID).unwrap_or_default(),
            var(ENV_TABLE_NAME).unwrap_or_default(),
            api_url_from_env_value(var(ENV_API_URL))?,
            timeout_from_env_value(var(ENV_TIMEOUT_SECS))?,
        );

        Ok(Self::new(store_kind_from_env_value(var(ENV_STORE))?, airtable))
    }

    pub fn store_kind(&self) -> StoreKind {
        self.store_kind
    }

    pub fn airtable(&self) -> &AirtableConfig {
        &self.airtable
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the Airtable API origin, falling back to the public API when unset.
pub fn api_url_from_env_value(value: Option<String>) -> ConfigResult<Url> {
    let raw = non_blank(value).unwrap_or_else(|| DEFAULT_AIRTABLE_API_URL.to_string());
    let url = Url::parse(&raw).map_err(|source| ConfigError::ApiUrl {
        value: raw.clone(),
        source,
    })?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::ApiUrlScheme(raw));
    }
    Ok(url)
}

/// Parse the request timeout in whole seconds.
pub fn timeout_from_env_value(value: Option<String>) -> ConfigResult<Duration> {
    match non_blank(value) {
        None => Ok(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        Some(raw) => raw
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or(ConfigError::Timeout(raw)),
    }
}

/// Parse the record store selection. Unset means Airtable.
pub fn store_kind_from_env_value(value: Option<String>) -> ConfigResult<StoreKind> {
    non_blank(value)
        .map(|v| v.parse::<StoreKind>())
        .transpose()
        .map(Option::unwrap_or_default)
}
