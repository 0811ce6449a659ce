//! # Domain Module
//!
//! Contains the health dataset and every rule for changing it.
//!
//! All changes go through one reducer. UI code and the sync controller only
//! see the [`AppStore`] handle, which owns the current [`HealthState`] and
//! publishes each new state to subscribers.
//!
//! ## Module Organization
//!
//! - **state**: the in-memory state and its persistable slices
//! - **actions**: the closed set of state changes
//! - **reducer**: pure `(state, action) -> state` transition
//! - **store**: shared handle with one helper per action
//! - **normalize**: coercing loaded documents into a fixed shape
//! - **profile**: session and profile id resolution
//! - **sync_controller**: hydration, local persistence and debounced upload
//! - **calendar**: saving appointments with a medication snapshot
//! - **visit_sync**: doctor visits mirrored into the calendar
//! - **selectors**: read helpers for views
//! - **demo**: bundled demo profile
//!
//! ## Key Responsibilities
//!
//! - **Single writer**: only the reducer produces new states
//! - **Shape guarantees**: collections are never missing after a load
//! - **Change detection**: untouched slices keep their allocation, so the
//!   sync layer writes only what changed
//! - **Lenient references**: deleting an entity does not cascade, except that
//!   a deleted visit takes its AI analyses with it

pub mod actions;
pub mod calendar;
pub mod demo;
pub mod normalize;
pub mod profile;
pub mod reducer;
pub mod selectors;
pub mod state;
pub mod store;
pub mod sync_controller;
pub mod visit_sync;

pub use actions::Action;
pub use normalize::normalize_document;
pub use profile::{AuthSession, AuthSessionProvider, NoAuth, PendingAuth, StaticSession};
pub use reducer::reduce;
pub use state::{HealthState, Slice, View};
pub use store::AppStore;
pub use sync_controller::{HydrationSource, SyncController, SyncPhase};
