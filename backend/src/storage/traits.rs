//! # Storage Traits
//!
//! This module defines the storage abstraction traits that let the sync
//! controller work against different backends (sqlite, in-memory, Supabase)
//! without knowing which one it has.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Trait defining the interface for the durable local key/value store
///
/// Values are opaque strings (serialized JSON). Namespacing of keys is the
/// caller's business, see [`LocalStore`](super::local_store::LocalStore).
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Retrieve a value by its key
    async fn get_value(&self, key: &str) -> Result<Option<String>>;

    /// Store a value, overwriting any existing value for the same key
    async fn put_value(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value by its key
    /// Returns true if the key existed
    async fn delete_value(&self, key: &str) -> Result<bool>;

    /// List all keys in the store
    async fn list_keys(&self) -> Result<Vec<String>>;
}

/// Failure talking to the remote profile store
#[derive(Debug, Error)]
pub enum RemoteStoreError {
    #[error("remote profile store request failed: {0}")]
    Transport(String),

    #[error("remote profile store returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("remote profile store returned an unreadable response: {0}")]
    InvalidResponse(String),
}

/// Trait defining the interface for the remote, per-profile document store
///
/// One JSON document per profile id. A missing profile is `Ok(None)`, never
/// an error.
#[async_trait]
pub trait RemoteProfileStorage: Send + Sync {
    /// Fetch the document stored for a profile
    async fn fetch_profile(&self, profile_id: &str) -> Result<Option<Value>, RemoteStoreError>;

    /// Create or replace the whole document of a profile
    async fn upsert_profile(&self, profile_id: &str, document: &Value)
        -> Result<(), RemoteStoreError>;
}
