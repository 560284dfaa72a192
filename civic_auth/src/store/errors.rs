use thiserror::Error;

use crate::remote::ApiFailure;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("Store API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A keyed lookup matched more than one row
    #[error("Ambiguous result: {0}")]
    Ambiguous(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Serde error: {0}")]
    Serde(String),
}

impl From<ApiFailure> for StoreError {
    fn from(failure: ApiFailure) -> Self {
        // 23505 is the unique_violation SQLSTATE
        if failure.status == 409 || failure.code.as_deref() == Some("23505") {
            return Self::Conflict(failure.message);
        }
        Self::Api {
            status: failure.status,
            message: failure.message,
            code: failure.code,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}
