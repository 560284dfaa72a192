use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::{RwLock, broadcast};

use crate::config::ClientConfig;
use crate::remote::{build_client, read_failure, with_keys};

use super::errors::AuthError;
use super::traits::AuthProvider;
use super::types::{
    AuthEvent, AuthResponse, EVENT_CHANNEL_CAPACITY, Identity, Session, SignUpBody,
};

/// HTTP client for a GoTrue-compatible auth service
///
/// Keeps the current session in memory and refreshes it when it expires.
#[derive(Clone)]
pub struct GoTrueProvider {
    config: ClientConfig,
    http_client: reqwest::Client,
    session: Arc<RwLock<Option<Session>>>,
    events: broadcast::Sender<AuthEvent>,
}

impl GoTrueProvider {
    pub fn new(config: ClientConfig) -> Result<Self, AuthError> {
        let http_client = build_client(config.timeout)?;
        Ok(Self::with_client(config, http_client))
    }

    /// Build the provider around an existing client so it can share the
    /// connection pool with the row store.
    pub fn with_client(config: ClientConfig, http_client: reqwest::Client) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config,
            http_client,
            session: Arc::new(RwLock::new(None)),
            events,
        }
    }

    /// Install a session obtained elsewhere, e.g. one persisted by the caller.
    pub async fn set_session(&self, session: Session) {
        self.store_session(AuthEvent::signed_in, session).await;
    }

    async fn store_session(&self, event: fn(Session) -> AuthEvent, session: Session) -> Session {
        let session = session.with_expiry_from(Utc::now());
        let mut current = self.session.write().await;
        *current = Some(session.clone());
        // Sent under the lock so events follow the order of cache writes.
        // No receivers is fine.
        let _ = self.events.send(event(session.clone()));
        session
    }

    /// Drop the cached session if it is still the one holding `access_token`.
    /// Returns whatever is cached afterwards.
    async fn clear_session_if(&self, access_token: &str) -> Option<Session> {
        let mut current = self.session.write().await;
        if !holds_token(&current, access_token) {
            tracing::debug!("Session replaced while the request was in flight, keeping it");
            return current.clone();
        }

        *current = None;
        tracing::debug!("Cleared local session");
        let _ = self.events.send(AuthEvent::signed_out());
        None
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, AuthError> {
        if !response.status().is_success() {
            return Err(read_failure(response).await.into());
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| AuthError::Serde(format!("Failed to deserialize response body: {e}")))
    }

    async fn token_grant(&self, grant_type: &str, body: Value) -> Result<Session, AuthError> {
        let url = self.config.auth_endpoint("token");
        let response = with_keys(self.http_client.post(&url), &self.config.anon_key, None)
            .query(&[("grant_type", grant_type)])
            .json(&body)
            .send()
            .await?;

        Self::decode(response).await
    }

    /// Exchange the refresh token of `stale` for a new session. The result is
    /// only cached while `stale` is still current; otherwise the newer cached
    /// session is returned and the refreshed one is discarded.
    async fn refresh(&self, stale: &Session) -> Result<Option<Session>, AuthError> {
        tracing::debug!("Refreshing expired session");
        let refreshed = self
            .token_grant(
                "refresh_token",
                json!({ "refresh_token": stale.refresh_token }),
            )
            .await?
            .with_expiry_from(Utc::now());

        let mut current = self.session.write().await;
        if !holds_token(&current, &stale.access_token) {
            tracing::debug!("Session replaced during refresh, discarding refreshed tokens");
            return Ok(current.clone());
        }

        *current = Some(refreshed.clone());
        let _ = self
            .events
            .send(AuthEvent::token_refreshed(refreshed.clone()));
        Ok(Some(refreshed))
    }
}

fn holds_token(current: &Option<Session>, access_token: &str) -> bool {
    current
        .as_ref()
        .is_some_and(|session| session.access_token == access_token)
}

#[async_trait]
impl AuthProvider for GoTrueProvider {
    #[tracing::instrument(skip(self, password, metadata))]
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Value,
    ) -> Result<AuthResponse, AuthError> {
        let url = self.config.auth_endpoint("signup");
        let response = with_keys(self.http_client.post(&url), &self.config.anon_key, None)
            .json(&json!({
                "email": email,
                "password": password,
                "data": metadata,
            }))
            .send()
            .await?;

        match Self::decode::<SignUpBody>(response).await? {
            SignUpBody::Session(session) => {
                tracing::info!(user_id = %session.user.id, "Sign-up returned a session");
                let session = self.store_session(AuthEvent::signed_in, session).await;
                Ok(AuthResponse::from_session(session))
            }
            SignUpBody::User(user) => {
                tracing::info!(user_id = %user.id, "Sign-up awaiting email confirmation");
                Ok(AuthResponse::from_user(user))
            }
        }
    }

    #[tracing::instrument(skip(self, password))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, AuthError> {
        let session = self
            .token_grant("password", json!({ "email": email, "password": password }))
            .await?;

        tracing::info!(user_id = %session.user.id, "Password sign-in succeeded");
        let session = self.store_session(AuthEvent::signed_in, session).await;
        Ok(AuthResponse::from_session(session))
    }

    #[tracing::instrument(skip(self))]
    async fn sign_out(&self) -> Result<(), AuthError> {
        let token = match self.session.read().await.as_ref() {
            Some(session) => session.access_token.clone(),
            None => {
                tracing::debug!("No session to sign out");
                return Ok(());
            }
        };

        let url = self.config.auth_endpoint("logout");
        let response = with_keys(
            self.http_client.post(&url),
            &self.config.anon_key,
            Some(&token),
        )
        .send()
        .await?;

        if !response.status().is_success() {
            let failure = read_failure(response).await;
            // The token is already unusable; drop it locally anyway
            if !matches!(failure.status, 401 | 403 | 404) {
                return Err(failure.into());
            }
            tracing::debug!(status = failure.status, "Session already invalid remotely");
        }

        self.clear_session_if(&token).await;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn get_user(&self) -> Result<Option<Identity>, AuthError> {
        let Some(session) = self.get_session().await? else {
            return Ok(None);
        };

        let url = self.config.auth_endpoint("user");
        let response = with_keys(
            self.http_client.get(&url),
            &self.config.anon_key,
            Some(&session.access_token),
        )
        .send()
        .await?;

        match response.status().as_u16() {
            401 | 403 => {
                tracing::debug!("Provider rejected the session token");
                Ok(None)
            }
            _ => Ok(Some(Self::decode(response).await?)),
        }
    }

    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        let current = self.session.read().await.clone();
        let Some(session) = current else {
            return Ok(None);
        };

        if !session.is_expired(Utc::now()) {
            return Ok(Some(session));
        }

        if session.refresh_token.is_empty() {
            tracing::debug!("Session expired without a refresh token");
            return Ok(self.clear_session_if(&session.access_token).await);
        }

        match self.refresh(&session).await {
            Ok(current) => Ok(current),
            Err(AuthError::Api {
                status, message, ..
            }) => {
                tracing::warn!(status, "Session refresh rejected: {}", message);
                Ok(self.clear_session_if(&session.access_token).await)
            }
            // Keep the session on transport failures so a later call can retry
            Err(e) => Err(e),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
