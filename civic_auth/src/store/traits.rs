use async_trait::async_trait;

use crate::profile::{NewProfileRow, ProfileChanges, UserProfile};

use super::errors::StoreError;

/// Keyed access to the profile table
///
/// `token` is the signed-in user's access token when there is one; stores that
/// enforce row-level access use it to authorize the call.
#[async_trait]
pub trait ProfileStore: Send + Sync + 'static {
    async fn select_by_id(
        &self,
        id: &str,
        token: Option<&str>,
    ) -> Result<Option<UserProfile>, StoreError>;

    async fn insert(
        &self,
        row: NewProfileRow,
        token: Option<&str>,
    ) -> Result<UserProfile, StoreError>;

    /// Apply `changes` to the row with this id and return it, or `None` when no
    /// row matched.
    async fn update_by_id(
        &self,
        id: &str,
        changes: ProfileChanges,
        token: Option<&str>,
    ) -> Result<Option<UserProfile>, StoreError>;
}
