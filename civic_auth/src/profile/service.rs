use chrono::Utc;

use crate::context::AuthContext;
use crate::provider::Identity;

use super::errors::ProfileError;
use super::types::{
    CreateProfileData, NewProfileRow, ProfileChanges, UpdateProfileData, UserProfile, UserRole,
};

/// The signed-in identity together with the token that authorizes store calls
struct Principal {
    identity: Identity,
    token: Option<String>,
}

/// Profile facade over the row store
///
/// The `try_` methods return typed errors. The plain methods log failures and
/// degrade to `None` / `false`.
#[derive(Clone)]
pub struct ProfileService {
    context: AuthContext,
}

impl ProfileService {
    pub fn new(context: AuthContext) -> Self {
        Self { context }
    }

    async fn current_principal(&self) -> Result<Option<Principal>, ProfileError> {
        let provider = self.context.provider();
        let Some(identity) = provider.get_user().await? else {
            return Ok(None);
        };
        let token = provider.get_session().await?.map(|s| s.access_token);
        Ok(Some(Principal { identity, token }))
    }

    async fn require_principal(&self) -> Result<Principal, ProfileError> {
        self.current_principal()
            .await?
            .ok_or(ProfileError::Unauthenticated)
    }

    async fn session_token(&self) -> Result<Option<String>, ProfileError> {
        Ok(self
            .context
            .provider()
            .get_session()
            .await?
            .map(|s| s.access_token))
    }

    #[tracing::instrument(skip(self))]
    pub async fn try_get_current_user_profile(&self) -> Result<Option<UserProfile>, ProfileError> {
        let Some(principal) = self.current_principal().await? else {
            tracing::debug!("No authenticated user");
            return Ok(None);
        };

        let profile = self
            .context
            .store()
            .select_by_id(&principal.identity.id, principal.token.as_deref())
            .await?;

        if profile.is_none() {
            tracing::warn!(user_id = %principal.identity.id, "Authenticated user has no profile");
        }
        Ok(profile)
    }

    #[tracing::instrument(skip(self))]
    pub async fn try_get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, ProfileError> {
        let token = self.session_token().await?;
        let profile = self
            .context
            .store()
            .select_by_id(user_id, token.as_deref())
            .await?;
        Ok(profile)
    }

    /// Update the signed-in user's profile. Only the supplied fields and
    /// `updated_at` change. An update with no fields writes nothing and
    /// returns the stored row.
    #[tracing::instrument(skip(self, updates))]
    pub async fn try_update_profile(
        &self,
        updates: UpdateProfileData,
    ) -> Result<UserProfile, ProfileError> {
        let principal = self.require_principal().await?;
        let user_id = principal.identity.id;
        let store = self.context.store();

        let profile = if updates.is_empty() {
            tracing::debug!("No profile fields to update");
            store
                .select_by_id(&user_id, principal.token.as_deref())
                .await?
        } else {
            let changes = ProfileChanges::new(updates, Utc::now());
            store
                .update_by_id(&user_id, changes, principal.token.as_deref())
                .await?
        };
        profile.ok_or(ProfileError::NotFound(user_id))
    }

    #[tracing::instrument(skip(self, data))]
    pub async fn try_create_profile(
        &self,
        data: CreateProfileData,
    ) -> Result<UserProfile, ProfileError> {
        let principal = self.require_principal().await?;
        self.insert_for(principal, data).await
    }

    /// Return the signed-in user's profile, creating it first if it is missing
    #[tracing::instrument(skip(self, data))]
    pub async fn try_ensure_profile(
        &self,
        data: CreateProfileData,
    ) -> Result<UserProfile, ProfileError> {
        let principal = self.require_principal().await?;
        let existing = self
            .context
            .store()
            .select_by_id(&principal.identity.id, principal.token.as_deref())
            .await?;

        match existing {
            Some(profile) => Ok(profile),
            None => self.insert_for(principal, data).await,
        }
    }

    async fn insert_for(
        &self,
        principal: Principal,
        data: CreateProfileData,
    ) -> Result<UserProfile, ProfileError> {
        let Principal { identity, token } = principal;
        let email = identity.email.ok_or_else(|| {
            ProfileError::InvalidData(format!("Identity {} has no email", identity.id))
        })?;

        let row = NewProfileRow {
            id: identity.id,
            email,
            data,
        };
        let profile = self.context.store().insert(row, token.as_deref()).await?;
        tracing::info!(user_id = %profile.id, role = %profile.role, "Profile created");
        Ok(profile)
    }

    pub async fn get_current_user_profile(&self) -> Option<UserProfile> {
        degrade(
            self.try_get_current_user_profile().await,
            "Error getting current user profile",
        )
        .flatten()
    }

    pub async fn get_profile(&self, user_id: &str) -> Option<UserProfile> {
        degrade(self.try_get_profile(user_id).await, "Error getting profile").flatten()
    }

    pub async fn update_profile(&self, updates: UpdateProfileData) -> Option<UserProfile> {
        degrade(
            self.try_update_profile(updates).await,
            "Error updating profile",
        )
    }

    pub async fn create_profile(&self, data: CreateProfileData) -> Option<UserProfile> {
        degrade(self.try_create_profile(data).await, "Error creating profile")
    }

    pub async fn ensure_profile(&self, data: CreateProfileData) -> Option<UserProfile> {
        degrade(self.try_ensure_profile(data).await, "Error ensuring profile")
    }

    /// True iff the signed-in user's profile carries `role`
    pub async fn has_role(&self, role: UserRole) -> bool {
        self.get_current_user_profile()
            .await
            .is_some_and(|profile| profile.has_role(role))
    }

    pub async fn is_official(&self) -> bool {
        self.has_role(UserRole::Official).await
    }

    pub async fn is_citizen(&self) -> bool {
        self.has_role(UserRole::Citizen).await
    }
}

fn degrade<T>(result: Result<T, ProfileError>, context: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::error!(error = %e, "{}", context);
            None
        }
    }
}
