use thiserror::Error;

use crate::provider::AuthError;
use crate::store::StoreError;

/// Errors surfaced by the typed profile operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProfileError {
    /// A mutation was attempted without a signed-in user
    #[error("No authenticated user")]
    Unauthenticated,

    #[error("Profile not found: {0}")]
    NotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Auth error: {0}")]
    Auth(AuthError),

    #[error("Store error: {0}")]
    Store(StoreError),
}

// Wrapping conversions only trace; failures are reported where they are handled

impl From<AuthError> for ProfileError {
    fn from(err: AuthError) -> Self {
        let error = Self::Auth(err);
        tracing::debug!("{}", error);
        error
    }
}

impl From<StoreError> for ProfileError {
    fn from(err: StoreError) -> Self {
        let error = Self::Store(err);
        tracing::debug!("{}", error);
        error
    }
}
