use async_trait::async_trait;

use crate::config::ClientConfig;
use crate::profile::{NewProfileRow, ProfileChanges, UserProfile};
use crate::remote::{build_client, read_failure, with_keys};

use super::errors::StoreError;
use super::traits::ProfileStore;

const PREFER_HEADER: &str = "Prefer";
const RETURN_REPRESENTATION: &str = "return=representation";

/// Profile table accessed through a PostgREST-compatible endpoint
#[derive(Clone)]
pub struct RestProfileStore {
    config: ClientConfig,
    http_client: reqwest::Client,
}

impl RestProfileStore {
    pub fn new(config: ClientConfig) -> Result<Self, StoreError> {
        let http_client = build_client(config.timeout)
            .map_err(|e| StoreError::Http(e.to_string()))?;
        Ok(Self::with_client(config, http_client))
    }

    pub fn with_client(config: ClientConfig, http_client: reqwest::Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    fn filter_url(&self, id: &str) -> String {
        format!(
            "{}?id=eq.{}",
            self.config.table_endpoint(),
            urlencoding::encode(id)
        )
    }

    async fn rows(response: reqwest::Response) -> Result<Vec<UserProfile>, StoreError> {
        if !response.status().is_success() {
            return Err(read_failure(response).await.into());
        }

        let body = response.text().await?;
        tracing::debug!(body = %body, "Row store response");
        serde_json::from_str(&body)
            .map_err(|e| StoreError::Serde(format!("Failed to deserialize rows: {e}")))
    }
}

#[async_trait]
impl ProfileStore for RestProfileStore {
    #[tracing::instrument(skip(self, token), fields(table = %self.config.profile_table))]
    async fn select_by_id(
        &self,
        id: &str,
        token: Option<&str>,
    ) -> Result<Option<UserProfile>, StoreError> {
        let url = format!("{}&select=*", self.filter_url(id));
        let response = with_keys(self.http_client.get(&url), &self.config.anon_key, token)
            .send()
            .await?;

        let mut rows = Self::rows(response).await?;
        match rows.len() {
            0 => {
                tracing::info!(found = false, "Profile lookup completed - not found");
                Ok(None)
            }
            1 => {
                tracing::info!(found = true, "Profile lookup completed");
                Ok(rows.pop())
            }
            n => Err(StoreError::Ambiguous(format!("{n} rows matched id {id}"))),
        }
    }

    #[tracing::instrument(skip(self, row, token), fields(profile_id = %row.id))]
    async fn insert(
        &self,
        row: NewProfileRow,
        token: Option<&str>,
    ) -> Result<UserProfile, StoreError> {
        let url = self.config.table_endpoint();
        let response = with_keys(self.http_client.post(&url), &self.config.anon_key, token)
            .header(PREFER_HEADER, RETURN_REPRESENTATION)
            .json(&row)
            .send()
            .await?;

        let profile = Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::UnexpectedResponse("Insert returned no row".to_string()))?;

        tracing::info!("Profile insert completed");
        Ok(profile)
    }

    #[tracing::instrument(skip(self, changes, token))]
    async fn update_by_id(
        &self,
        id: &str,
        changes: ProfileChanges,
        token: Option<&str>,
    ) -> Result<Option<UserProfile>, StoreError> {
        let url = self.filter_url(id);
        let response = with_keys(self.http_client.patch(&url), &self.config.anon_key, token)
            .header(PREFER_HEADER, RETURN_REPRESENTATION)
            .json(&changes)
            .send()
            .await?;

        let profile = Self::rows(response).await?.into_iter().next();
        tracing::info!(updated = profile.is_some(), "Profile update completed");
        Ok(profile)
    }
}
