use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::profile::{NewProfileRow, ProfileChanges, UserProfile};

use super::errors::StoreError;
use super::traits::ProfileStore;

/// In-process profile table
///
/// Counts successful mutations so tests can assert that nothing was written.
#[derive(Default)]
pub struct InMemoryProfileStore {
    rows: RwLock<HashMap<String, UserProfile>>,
    writes: AtomicUsize,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        tracing::info!("Creating new in-memory profile store");
        Self::default()
    }

    /// Put a row in place without counting it as a write
    pub async fn seed(&self, profile: UserProfile) {
        self.rows.write().await.insert(profile.id.clone(), profile);
    }

    /// Number of inserts and updates applied so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn select_by_id(
        &self,
        id: &str,
        _token: Option<&str>,
    ) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.rows.read().await.get(id).cloned())
    }

    async fn insert(
        &self,
        row: NewProfileRow,
        _token: Option<&str>,
    ) -> Result<UserProfile, StoreError> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&row.id) {
            return Err(StoreError::Conflict(format!(
                "duplicate key value violates unique constraint: id={}",
                row.id
            )));
        }

        let profile = UserProfile::from_new_row(row, Utc::now());
        rows.insert(profile.id.clone(), profile.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(profile)
    }

    async fn update_by_id(
        &self,
        id: &str,
        changes: ProfileChanges,
        _token: Option<&str>,
    ) -> Result<Option<UserProfile>, StoreError> {
        let mut rows = self.rows.write().await;
        let Some(profile) = rows.get_mut(id) else {
            return Ok(None);
        };

        profile.apply(&changes);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(Some(profile.clone()))
    }
}
