use thiserror::Error;

use crate::config::ConfigError;
use crate::remote::ApiFailure;

/// Errors reported by the auth provider
///
/// `Api` carries the provider's own message verbatim so that callers can show
/// it to the user.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuthError {
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
    },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Serde error: {0}")]
    Serde(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl AuthError {
    /// User-facing message
    pub fn message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// HTTP status reported by the provider, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Machine-readable error code reported by the provider, if any
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Log the error and return self
    pub fn log(self) -> Self {
        match &self {
            Self::Api {
                status,
                message,
                code,
            } => tracing::error!(status, code = ?code, "Auth provider error: {}", message),
            Self::Http(msg) => tracing::error!("Auth HTTP error: {}", msg),
            Self::Serde(msg) => tracing::error!("Auth serde error: {}", msg),
            Self::Config(msg) => tracing::error!("Auth config error: {}", msg),
        }
        self
    }
}

impl From<ApiFailure> for AuthError {
    fn from(failure: ApiFailure) -> Self {
        Self::Api {
            status: failure.status,
            message: failure.message,
            code: failure.code,
        }
    }
}

impl From<ConfigError> for AuthError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}
