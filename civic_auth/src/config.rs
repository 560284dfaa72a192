//! Central configuration for the civic_auth crate

use std::{env, sync::LazyLock, time::Duration};

use thiserror::Error;

/// Name of the profile table in the row store
///
/// Default: "user_profiles"
pub static PROFILE_TABLE: LazyLock<String> = LazyLock::new(|| {
    env::var("CIVIC_AUTH_PROFILE_TABLE").unwrap_or_else(|_| "user_profiles".to_string())
});

/// Request timeout for the shared HTTP client, in seconds
pub static HTTP_TIMEOUT_SECS: LazyLock<u64> = LazyLock::new(|| {
    env::var("CIVIC_AUTH_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(30)
});

const ENV_URL: &str = "CIVIC_AUTH_URL";
const ENV_ANON_KEY: &str = "CIVIC_AUTH_ANON_KEY";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Connection settings for the hosted project
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Project base URL without a trailing slash
    pub url: String,
    /// Public API key sent as `apikey` on every request
    pub anon_key: String,
    pub profile_table: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Result<Self, ConfigError> {
        let url = normalize_url(&url.into())?;
        let anon_key = anon_key.into();
        if anon_key.trim().is_empty() {
            return Err(ConfigError::Missing(ENV_ANON_KEY.to_string()));
        }

        Ok(Self {
            url,
            anon_key,
            profile_table: PROFILE_TABLE.clone(),
            timeout: Duration::from_secs(*HTTP_TIMEOUT_SECS),
        })
    }

    /// Build the configuration from `CIVIC_AUTH_URL` and `CIVIC_AUTH_ANON_KEY`
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = env::var(ENV_URL).map_err(|_| ConfigError::Missing(ENV_URL.to_string()))?;
        let anon_key =
            env::var(ENV_ANON_KEY).map_err(|_| ConfigError::Missing(ENV_ANON_KEY.to_string()))?;
        Self::new(url, anon_key)
    }

    pub fn with_profile_table(mut self, table: impl Into<String>) -> Self {
        self.profile_table = table.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn auth_endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.url, path)
    }

    pub(crate) fn table_endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.url, self.profile_table)
    }
}

fn normalize_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Missing(ENV_URL.to_string()));
    }

    let parsed = url::Url::parse(trimmed)
        .map_err(|e| ConfigError::Invalid(format!("{ENV_URL}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ConfigError::Invalid(format!(
                "{ENV_URL}: unsupported scheme '{other}'"
            )));
        }
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}
