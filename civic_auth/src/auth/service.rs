use tokio::sync::broadcast::error::RecvError;

use crate::context::AuthContext;
use crate::profile::{ProfileError, ProfileService};
use crate::provider::{AuthError, AuthResponse, Session};

use super::subscription::AuthSubscription;
use super::types::{AuthUser, SignInData, SignUpData};

/// Identity facade: account lifecycle plus the composed current user
#[derive(Clone)]
pub struct AuthService {
    context: AuthContext,
    profiles: ProfileService,
}

impl AuthService {
    pub fn new(context: AuthContext) -> Self {
        let profiles = ProfileService::new(context.clone());
        Self { context, profiles }
    }

    /// The profile facade over the same context
    pub fn profiles(&self) -> &ProfileService {
        &self.profiles
    }

    /// Register an account. No profile row is written here.
    #[tracing::instrument(skip(self, data), fields(email = %data.email))]
    pub async fn sign_up(&self, data: SignUpData) -> Result<AuthResponse, AuthError> {
        let response = self
            .context
            .provider()
            .sign_up(&data.email, &data.password, data.metadata())
            .await
            .map_err(AuthError::log)?;

        if response.session.is_none() {
            tracing::info!("Sign-up accepted, awaiting email confirmation");
        }
        Ok(response)
    }

    #[tracing::instrument(skip(self, data), fields(email = %data.email))]
    pub async fn sign_in(&self, data: SignInData) -> Result<AuthResponse, AuthError> {
        let response = self
            .context
            .provider()
            .sign_in_with_password(&data.email, &data.password)
            .await
            .map_err(AuthError::log)?;

        tracing::info!("Signed in");
        Ok(response)
    }

    #[tracing::instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.context
            .provider()
            .sign_out()
            .await
            .map_err(AuthError::log)?;

        tracing::info!("Signed out");
        Ok(())
    }

    /// The current identity composed with its profile, `Ok(None)` when nobody
    /// is signed in
    pub async fn try_get_current_user(&self) -> Result<Option<AuthUser>, ProfileError> {
        let Some(identity) = self.context.provider().get_user().await? else {
            return Ok(None);
        };

        let profile = self.profiles.try_get_profile(&identity.id).await?;
        Ok(Some(AuthUser::new(identity, profile)))
    }

    pub async fn get_current_user(&self) -> Option<AuthUser> {
        match self.try_get_current_user().await {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(error = %e, "Error getting current user");
                None
            }
        }
    }

    pub async fn get_session(&self) -> Option<Session> {
        match self.context.provider().get_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(error = %e, "Error getting session");
                None
            }
        }
    }

    pub async fn get_access_token(&self) -> Option<String> {
        self.get_session().await.map(|session| session.access_token)
    }

    pub async fn is_authenticated(&self) -> bool {
        self.get_session().await.is_some()
    }

    /// Call `callback` with the composed user after every session change, or
    /// with `None` once the session ends.
    ///
    /// Must be called from within a tokio runtime. Events are delivered in
    /// emission order on a dedicated task.
    pub fn on_auth_state_change<F>(&self, mut callback: F) -> AuthSubscription
    where
        F: FnMut(Option<AuthUser>) + Send + 'static,
    {
        // Subscribe before spawning so no event emitted after this call is missed
        let mut events = self.context.provider().subscribe();
        let profiles = self.profiles.clone();

        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        tracing::debug!(event = %event.kind, "Auth state changed");
                        let user = match event.session {
                            Some(session) => {
                                let profile = profiles.get_profile(&session.user.id).await;
                                Some(AuthUser::new(session.user, profile))
                            }
                            None => None,
                        };
                        callback(user);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Auth listener lagged, events dropped");
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!("Auth event stream closed");
                        break;
                    }
                }
            }
        });

        AuthSubscription::new(handle)
    }
}
