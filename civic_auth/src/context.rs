use std::sync::Arc;

use crate::config::ClientConfig;
use crate::provider::{AuthError, AuthProvider, GoTrueProvider};
use crate::remote::build_client;
use crate::store::{ProfileStore, RestProfileStore};

/// The provider and row store shared by both facades
///
/// Passing the context explicitly keeps the facades free of global state; tests
/// build one from the in-memory implementations.
#[derive(Clone)]
pub struct AuthContext {
    provider: Arc<dyn AuthProvider>,
    store: Arc<dyn ProfileStore>,
}

impl AuthContext {
    pub fn new(provider: Arc<dyn AuthProvider>, store: Arc<dyn ProfileStore>) -> Self {
        Self { provider, store }
    }

    /// HTTP-backed context; the provider and the store share one connection pool
    pub fn from_config(config: &ClientConfig) -> Result<Self, AuthError> {
        let http_client = build_client(config.timeout)?;
        let provider = GoTrueProvider::with_client(config.clone(), http_client.clone());
        let store = RestProfileStore::with_client(config.clone(), http_client);

        tracing::info!(url = %config.url, table = %config.profile_table, "Auth context ready");
        Ok(Self::new(Arc::new(provider), Arc::new(store)))
    }

    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_config(&ClientConfig::from_env()?)
    }

    pub fn provider(&self) -> &Arc<dyn AuthProvider> {
        &self.provider
    }

    pub fn store(&self) -> &Arc<dyn ProfileStore> {
        &self.store
    }
}
