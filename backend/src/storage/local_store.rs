//! # Local Store
//!
//! Namespaced JSON access on top of a [`KeyValueStorage`] backend.
//!
//! ## Key Responsibilities
//! - **Namespacing**: every collection lives under `vardcoachen-<name>`
//! - **Never failing reads**: missing or unreadable values return the caller's
//!   default, the problem is logged
//! - **Best-effort writes**: write failures are logged and swallowed

use serde_json::{Map, Value};
use shared::HealthDocument;
use std::sync::Arc;
use tracing::{debug, error};

use super::sqlite::SqliteKeyValueStore;
use super::traits::KeyValueStorage;
use crate::domain::normalize::normalize_document;
use crate::domain::state::{HealthState, Slice};

/// Prefix of every key this application writes
pub const KEY_PREFIX: &str = "vardcoachen-";

/// Raw (not JSON encoded) key holding the anonymous profile id
pub const PROFILE_ID_KEY: &str = "vardcoachen-profile-id";

#[derive(Clone)]
pub struct LocalStore {
    backend: Arc<dyn KeyValueStorage>,
}

impl LocalStore {
    pub fn new(backend: Arc<dyn KeyValueStorage>) -> Self {
        Self { backend }
    }

    /// Local store on the sqlite database at `database_url`
    pub async fn open(database_url: &str) -> anyhow::Result<Self> {
        let backend = SqliteKeyValueStore::new(database_url).await?;
        Ok(Self::new(Arc::new(backend)))
    }

    pub fn key(name: &str) -> String {
        format!("{}{}", KEY_PREFIX, name)
    }

    /// Raw JSON stored under `name`, if any can be read
    pub async fn read_value(&self, name: &str) -> Option<Value> {
        let key = Self::key(name);
        let raw = match self.backend.get_value(&key).await {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return None,
            Err(e) => {
                error!(key = %key, error = %e, "Failed to read from local store");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                error!(key = %key, error = %e, "Failed to parse stored value");
                None
            }
        }
    }

    /// Encode and store `value` under `name`. Failures are logged only.
    pub async fn write(&self, name: &str, value: &Value) {
        let key = Self::key(name);
        match serde_json::to_string(value) {
            Ok(encoded) => {
                if let Err(e) = self.backend.put_value(&key, &encoded).await {
                    error!(key = %key, error = %e, "Failed to write to local store");
                }
            }
            Err(e) => error!(key = %key, error = %e, "Failed to encode value"),
        }
    }

    /// Persist one collection of the state under its own key
    pub async fn write_slice(&self, state: &HealthState, slice: Slice) {
        match state.slice_json(slice) {
            Ok(value) => {
                debug!(key = slice.storage_key(), "Persisting collection");
                self.write(slice.storage_key(), &value).await;
            }
            Err(e) => error!(key = slice.storage_key(), error = %e, "Failed to encode collection"),
        }
    }

    /// Read every collection key into one normalized document
    pub async fn load_document(&self) -> HealthDocument {
        let mut raw = Map::new();
        for slice in Slice::ALL {
            if let Some(value) = self.read_value(slice.storage_key()).await {
                raw.insert(slice.document_field().to_string(), value);
            }
        }
        normalize_document(&Value::Object(raw))
    }

    /// Remove every collection key. The profile id is kept.
    pub async fn clear_collections(&self) {
        for slice in Slice::ALL {
            let key = Self::key(slice.storage_key());
            if let Err(e) = self.backend.delete_value(&key).await {
                error!(key = %key, error = %e, "Failed to clear local collection");
            }
        }
    }

    /// Locally persisted anonymous profile id
    pub async fn profile_id(&self) -> Option<String> {
        match self.backend.get_value(PROFILE_ID_KEY).await {
            Ok(id) => id.filter(|id| !id.trim().is_empty()),
            Err(e) => {
                error!(error = %e, "Failed to read profile id");
                None
            }
        }
    }

    pub async fn set_profile_id(&self, profile_id: &str) {
        if let Err(e) = self.backend.put_value(PROFILE_ID_KEY, profile_id).await {
            error!(profile_id, error = %e, "Failed to persist profile id");
        }
    }
}
