//! Shared HTTP plumbing for the provider and store clients

use std::time::Duration;

use http::header::ACCEPT;
use serde::Deserialize;
use serde_json::Value;

use crate::config::ConfigError;

const APIKEY_HEADER: &str = "apikey";

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(32)
        .build()
        .map_err(|e| ConfigError::Invalid(format!("Failed to create HTTP client: {e}")))
}

/// Attach the project key and bearer token; the anon key doubles as the bearer
/// when no user token is available.
pub(crate) fn with_keys(
    builder: reqwest::RequestBuilder,
    anon_key: &str,
    bearer: Option<&str>,
) -> reqwest::RequestBuilder {
    builder
        .header(APIKEY_HEADER, anon_key)
        .header(ACCEPT, "application/json")
        .bearer_auth(bearer.unwrap_or(anon_key))
}

/// Error payload returned by the auth service or the row store.
///
/// The auth service answers with either `{error, error_description}` or
/// `{code, error_code, msg}`; the row store with `{code, message, details, hint}`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// Decoded failure of a remote call
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ApiFailure {
    pub(crate) status: u16,
    pub(crate) message: String,
    pub(crate) code: Option<String>,
}

impl ErrorBody {
    fn message(&self) -> Option<String> {
        self.error_description
            .clone()
            .or_else(|| self.msg.clone())
            .or_else(|| self.message.clone())
            .or_else(|| self.details.clone())
            .or_else(|| self.error.clone())
    }

    fn code(&self) -> Option<String> {
        if let Some(code) = &self.error_code {
            return Some(code.clone());
        }
        match &self.code {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => self.error.clone(),
        }
    }
}

pub(crate) fn parse_failure(status: u16, body: &str) -> ApiFailure {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed.message().unwrap_or_else(|| {
        if body.trim().is_empty() {
            format!("Request failed with status {status}")
        } else {
            body.trim().to_string()
        }
    });

    ApiFailure {
        status,
        message,
        code: parsed.code(),
    }
}

/// Drain a non-success response into an [`ApiFailure`]
pub(crate) async fn read_failure(response: reqwest::Response) -> ApiFailure {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(status, body = %body, "Remote call failed");
    parse_failure(status, &body)
}
