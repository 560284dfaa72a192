use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::{RwLock, broadcast};

use super::errors::AuthError;
use super::traits::AuthProvider;
use super::types::{AuthEvent, AuthResponse, EVENT_CHANNEL_CAPACITY, Identity, Session};

const MIN_PASSWORD_LEN: usize = 6;
const SESSION_TTL_SECS: i64 = 3600;

struct Account {
    password: String,
    identity: Identity,
}

/// In-process auth provider with the same contract as the hosted service
///
/// Accounts are keyed by lowercased email. Sign-up signs the user in directly
/// unless email confirmation is required.
pub struct InMemoryAuthProvider {
    accounts: RwLock<HashMap<String, Account>>,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
    require_email_confirmation: bool,
}

impl Default for InMemoryAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAuthProvider {
    pub fn new() -> Self {
        tracing::info!("Creating new in-memory auth provider");
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            accounts: RwLock::new(HashMap::new()),
            session: RwLock::new(None),
            events,
            require_email_confirmation: false,
        }
    }

    /// Require `confirm_email` before a new account can sign in
    pub fn with_email_confirmation(mut self) -> Self {
        self.require_email_confirmation = true;
        self
    }

    /// Mark the account's email as confirmed. Returns false for unknown emails.
    pub async fn confirm_email(&self, email: &str) -> bool {
        let mut accounts = self.accounts.write().await;
        match accounts.get_mut(&email.to_lowercase()) {
            Some(account) => {
                account.identity.email_confirmed_at = Some(Utc::now());
                true
            }
            None => false,
        }
    }

    async fn start_session(&self, identity: Identity) -> Session {
        let session = Session::new(
            identity,
            uuid::Uuid::new_v4().to_string(),
            uuid::Uuid::new_v4().to_string(),
            SESSION_TTL_SECS,
        );
        *self.session.write().await = Some(session.clone());
        let _ = self.events.send(AuthEvent::signed_in(session.clone()));
        session
    }
}

fn api_error(status: u16, code: &str, message: &str) -> AuthError {
    AuthError::Api {
        status,
        message: message.to_string(),
        code: Some(code.to_string()),
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuthProvider {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Value,
    ) -> Result<AuthResponse, AuthError> {
        if !email.contains('@') {
            return Err(api_error(
                400,
                "validation_failed",
                "Unable to validate email address: invalid format",
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(api_error(
                422,
                "weak_password",
                "Password should be at least 6 characters.",
            ));
        }

        let key = email.to_lowercase();
        let identity = {
            let mut accounts = self.accounts.write().await;
            if accounts.contains_key(&key) {
                return Err(api_error(422, "user_already_exists", "User already registered"));
            }

            let now = Utc::now();
            let identity = Identity {
                id: uuid::Uuid::new_v4().to_string(),
                email: Some(email.to_string()),
                email_confirmed_at: (!self.require_email_confirmation).then_some(now),
                user_metadata: metadata,
                created_at: Some(now),
            };
            accounts.insert(
                key,
                Account {
                    password: password.to_string(),
                    identity: identity.clone(),
                },
            );
            identity
        };

        if self.require_email_confirmation {
            return Ok(AuthResponse::from_user(identity));
        }

        let session = self.start_session(identity).await;
        Ok(AuthResponse::from_session(session))
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, AuthError> {
        let identity = {
            let accounts = self.accounts.read().await;
            match accounts.get(&email.to_lowercase()) {
                Some(account) if account.password == password => account.identity.clone(),
                _ => {
                    return Err(api_error(
                        400,
                        "invalid_credentials",
                        "Invalid login credentials",
                    ));
                }
            }
        };

        if !identity.is_email_confirmed() {
            return Err(api_error(400, "email_not_confirmed", "Email not confirmed"));
        }

        let session = self.start_session(identity).await;
        Ok(AuthResponse::from_session(session))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if self.session.write().await.take().is_some() {
            let _ = self.events.send(AuthEvent::signed_out());
        }
        Ok(())
    }

    async fn get_user(&self) -> Result<Option<Identity>, AuthError> {
        let Some(session) = self.session.read().await.clone() else {
            return Ok(None);
        };

        // Answer with the account's current record, as the hosted service would
        let accounts = self.accounts.read().await;
        Ok(accounts
            .values()
            .find(|account| account.identity.id == session.user.id)
            .map(|account| account.identity.clone()))
    }

    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        Ok(self.session.read().await.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
