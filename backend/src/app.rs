//! Wiring of the client-side services from an [`AppConfig`].
//!
//! The remote profile store is only created when both its URL and its key
//! are configured; otherwise the app runs against the local store alone.

use anyhow::Result;
use shared::AiOptions;
use std::sync::Arc;
use tracing::info;

use crate::config::AppConfig;
use crate::domain::{AppStore, AuthSessionProvider, HydrationSource, SyncController};
use crate::io::AiGatewayClient;
use crate::storage::{LocalStore, RemoteProfileStorage, SupabaseProfileStore};

/// Everything a client needs: the store, its sync controller and the AI gateway
pub struct HealthApp {
    pub store: AppStore,
    pub sync: SyncController,
    pub ai: AiGatewayClient,
    remote_enabled: bool,
}

/// Open the local database, pick the remote store and build the services
pub async fn initialize_app(
    config: &AppConfig,
    auth: Arc<dyn AuthSessionProvider>,
) -> Result<HealthApp> {
    info!(database_url = %config.database_url, "Setting up local store");
    let local = LocalStore::open(&config.database_url).await?;

    let remote: Option<Arc<dyn RemoteProfileStorage>> =
        match SupabaseProfileStore::from_config(&config.remote)? {
            Some(remote) => Some(Arc::new(remote)),
            None => None,
        };
    let remote_enabled = remote.is_some();
    info!(remote_enabled, "Setting up sync controller");

    let store = AppStore::new();
    let sync = SyncController::new(store.clone(), local, remote, auth, config.sync);
    let ai = AiGatewayClient::new(&config.ai)?;

    Ok(HealthApp {
        store,
        sync,
        ai,
        remote_enabled,
    })
}

impl HealthApp {
    pub fn remote_enabled(&self) -> bool {
        self.remote_enabled
    }

    /// Hydrate and start syncing
    pub async fn start(&self) -> Option<HydrationSource> {
        self.sync.initialize().await
    }

    pub async fn analyze(&self, prompt: &str, options: AiOptions) -> String {
        self.ai.analyze(&self.store, prompt, options).await
    }
}
