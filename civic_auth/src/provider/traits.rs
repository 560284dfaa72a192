use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use super::errors::AuthError;
use super::types::{AuthEvent, AuthResponse, Identity, Session};

/// Operations the facades need from the hosted auth service
#[async_trait]
pub trait AuthProvider: Send + Sync + 'static {
    /// Register a new account. `metadata` is stored on the identity as-is.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Value,
    ) -> Result<AuthResponse, AuthError>;

    /// Verify credentials and start a session.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, AuthError>;

    /// End the current session. Succeeds when there is no session.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Identity behind the current session, confirmed with the provider.
    /// Returns `None` when there is no session or the provider rejects it.
    async fn get_user(&self) -> Result<Option<Identity>, AuthError>;

    /// The current session, refreshed first if it has expired.
    async fn get_session(&self) -> Result<Option<Session>, AuthError>;

    /// Receive session transitions from now on.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
