//! # Storage Module
//!
//! Handles all data persistence for the health dataset.
//!
//! ## Key Responsibilities
//!
//! - **Local persistence**: one key per collection in a durable key/value store
//! - **Remote profiles**: an optional per-profile document store
//! - **Storage abstraction**: the sync controller only sees the traits
//!
//! ## Current Implementation
//!
//! - **Local**: SQLite via SQLx (`sqlite`), or an in-memory map (`memory`)
//! - **Remote**: Supabase PostgREST over reqwest (`supabase`), or in-memory
//!
//! Local access goes through [`LocalStore`], which namespaces keys and turns
//! every failure into a logged fallback.

pub mod local_store;
pub mod memory;
pub mod sqlite;
pub mod supabase;
pub mod traits;

pub use local_store::LocalStore;
pub use memory::{InMemoryProfileStore, MemoryKeyValueStore};
pub use sqlite::SqliteKeyValueStore;
pub use supabase::SupabaseProfileStore;
pub use traits::{KeyValueStorage, RemoteProfileStorage, RemoteStoreError};
