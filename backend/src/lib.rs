//! # Vårdcoachen Backend
//!
//! Core of the Vårdcoachen personal health organizer: the reducer-driven
//! state container, local persistence, the optional remote profile store,
//! the sync controller that ties them together, and the AI gateway.
//!
//! ## Architecture
//!
//! ```text
//! UI (any client)
//!     ↓ actions
//! Domain (AppStore, reducer, sync controller)
//!     ↓
//! Storage (local key/value store, remote profile store)
//!
//! IO (AI proxy endpoint, AI gateway client)
//! ```
//!
//! Clients build their services with [`app::initialize_app`]; the binary in
//! `main.rs` runs the AI proxy.

pub mod app;
pub mod config;
pub mod domain;
pub mod io;
pub mod logging;
pub mod storage;
