//! # Sync Controller
//!
//! Orchestrates startup hydration and steady-state replication between the
//! [`AppStore`], the [`LocalStore`] and the optional remote profile store.
//!
//! ## Lifecycle
//!
//! `Uninitialized -> Loading -> Hydrated`
//!
//! - **Uninitialized**: waits for the authentication check to finish
//! - **Loading**: reads the local document, resolves the profile id and, when
//!   a remote store is configured, fetches (or seeds) the remote document
//! - **Hydrated**: one `LOAD_ALL_DATA` has been dispatched and the hydration
//!   latch is released. From then on changed collections are written to the
//!   local store, and any data change (re)arms a debounced upload of the full
//!   document.
//!
//! Remote failures never leave this module: they are logged and the local
//! document is used instead.

use serde_json::Value;
use shared::HealthDocument;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

use super::actions::Action;
use super::normalize::{is_blank_document, normalize_document};
use super::profile::{resolve_profile_id, AuthSessionProvider};
use super::state::HealthState;
use super::store::AppStore;
use crate::config::SyncConfig;
use crate::storage::{LocalStore, RemoteProfileStorage, RemoteStoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Uninitialized,
    Loading,
    Hydrated,
}

/// Where the hydrated data came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationSource {
    /// Local store only: no remote configured, or the remote failed
    Local,
    /// An existing remote document
    Remote,
    /// The remote profile was empty and has just been seeded
    SeededRemote,
}

pub struct SyncController {
    store: AppStore,
    local: LocalStore,
    remote: Option<Arc<dyn RemoteProfileStorage>>,
    auth: Arc<dyn AuthSessionProvider>,
    config: SyncConfig,
    phase: watch::Sender<SyncPhase>,
    started: AtomicBool,
    disposed: AtomicBool,
    hydrated: AtomicBool,
    remote_ready: Arc<AtomicBool>,
    profile_id: Mutex<Option<String>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SyncController {
    pub fn new(
        store: AppStore,
        local: LocalStore,
        remote: Option<Arc<dyn RemoteProfileStorage>>,
        auth: Arc<dyn AuthSessionProvider>,
        config: SyncConfig,
    ) -> Self {
        let (phase, _) = watch::channel(SyncPhase::Uninitialized);
        Self {
            store,
            local,
            remote,
            auth,
            config,
            phase,
            started: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
            hydrated: AtomicBool::new(false),
            remote_ready: Arc::new(AtomicBool::new(false)),
            profile_id: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn phase(&self) -> SyncPhase {
        *self.phase.borrow()
    }

    /// Whether the hydration latch has been released
    pub fn is_hydrated(&self) -> bool {
        self.hydrated.load(Ordering::SeqCst)
    }

    /// Whether remote uploads are enabled for this session
    pub fn is_remote_ready(&self) -> bool {
        self.remote_ready.load(Ordering::SeqCst)
    }

    /// Profile id the remote document is stored under, once resolved
    pub fn profile_id(&self) -> Option<String> {
        self.profile_id.lock().ok().and_then(|id| id.clone())
    }

    /// Hydrate the store and start replicating changes
    pub async fn initialize(&self) -> Option<HydrationSource> {
        let source = self.hydrate().await?;
        self.start();
        Some(source)
    }

    /// Load the authoritative document into the store.
    ///
    /// Runs once. Returns `None` for any later call, and when the controller
    /// was disposed before loading finished; nothing is dispatched then.
    pub async fn hydrate(&self) -> Option<HydrationSource> {
        if self.started.swap(true, Ordering::SeqCst) {
            warn!("Hydration already ran, ignoring");
            return None;
        }

        // Nothing may start before the auth check has resolved
        let session = self.auth.current_session().await;
        self.phase.send_replace(SyncPhase::Loading);
        info!(authenticated = session.is_some(), "Starting hydration");

        self.store.dispatch(Action::SetLoading(true));
        let local_document = self.local.load_document().await;

        let (document, source) = match &self.remote {
            Some(remote) => {
                let profile_id = resolve_profile_id(session.as_ref(), &self.local).await;
                if let Ok(mut slot) = self.profile_id.lock() {
                    *slot = Some(profile_id.clone());
                }

                match self
                    .load_remote(remote.as_ref(), &profile_id, session.is_some(), &local_document)
                    .await
                {
                    Ok((document, source)) => {
                        self.remote_ready.store(true, Ordering::SeqCst);
                        (document, source)
                    }
                    Err(e) => {
                        error!(profile_id = %profile_id, error = %e, "Remote init failed, falling back to local data");
                        (local_document, HydrationSource::Local)
                    }
                }
            }
            None => (local_document, HydrationSource::Local),
        };

        if self.is_disposed() {
            info!("Disposed during hydration, discarding loaded data");
            return None;
        }

        self.store.dispatch(Action::LoadAllData(document));
        self.store.dispatch(Action::SetLoading(false));

        self.hydrated.store(true, Ordering::SeqCst);
        self.phase.send_replace(SyncPhase::Hydrated);
        info!(?source, "Hydration complete");
        Some(source)
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    async fn load_remote(
        &self,
        remote: &dyn RemoteProfileStorage,
        profile_id: &str,
        authenticated: bool,
        local_document: &HealthDocument,
    ) -> Result<(HealthDocument, HydrationSource), RemoteStoreError> {
        let existing = remote.fetch_profile(profile_id).await?;

        if !is_blank_document(existing.as_ref()) {
            let raw = existing.unwrap_or(Value::Null);
            debug!(profile_id, "Using remote document");
            return Ok((normalize_document(&raw), HydrationSource::Remote));
        }

        // A fresh sign-in must not inherit whatever an anonymous session left locally
        let seed = if authenticated {
            HealthDocument::default()
        } else {
            local_document.clone()
        };
        let seed_value = serde_json::to_value(&seed)
            .map_err(|e| RemoteStoreError::InvalidResponse(e.to_string()))?;
        remote.upsert_profile(profile_id, &seed_value).await?;

        info!(profile_id, from_local = !authenticated, "Seeded empty remote profile");
        Ok((seed, HydrationSource::SeededRemote))
    }

    /// Spawn the replication tasks. Does nothing before hydration, after
    /// dispose, or when already started.
    pub fn start(&self) {
        if self.is_disposed() {
            return;
        }
        if !self.is_hydrated() {
            warn!("Sync started before hydration, ignoring");
            return;
        }
        let Ok(mut tasks) = self.tasks.lock() else {
            error!("Sync task registry poisoned");
            return;
        };
        if !tasks.is_empty() {
            return;
        }

        // Changes are measured against the state at this point, not at the
        // first poll of each task, so an edit made in between is still seen
        let baseline = self.store.state();

        tasks.push(tokio::spawn(persist_locally(
            self.store.subscribe(),
            baseline.clone(),
            self.local.clone(),
        )));

        match (&self.remote, self.profile_id()) {
            (Some(remote), Some(profile_id)) if self.is_remote_ready() => {
                tasks.push(tokio::spawn(upload_debounced(
                    self.store.clone(),
                    self.store.subscribe(),
                    baseline,
                    Arc::clone(remote),
                    profile_id,
                    self.config,
                )));
            }
            (Some(_), _) => warn!("Remote store unavailable this session, syncing locally only"),
            (None, _) => {}
        }
    }

    /// Stop replication. A pending debounced upload is dropped; an upload
    /// already in flight finishes on its own.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        if let Ok(mut tasks) = self.tasks.lock() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
    }
}

impl Drop for SyncController {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Write each changed collection to its own local key
async fn persist_locally(
    mut receiver: watch::Receiver<HealthState>,
    mut previous: HealthState,
    local: LocalStore,
) {
    loop {
        let current = receiver.borrow_and_update().clone();
        for slice in current.changed_slices(&previous) {
            local.write_slice(&current, slice).await;
        }
        previous = current;

        if receiver.changed().await.is_err() {
            break;
        }
    }
}

/// Upload the full document once changes have been quiet for the debounce window
async fn upload_debounced(
    store: AppStore,
    mut receiver: watch::Receiver<HealthState>,
    mut previous: HealthState,
    remote: Arc<dyn RemoteProfileStorage>,
    profile_id: String,
    config: SyncConfig,
) {
    let mut deadline: Option<Instant> = None;

    let current = receiver.borrow_and_update().clone();
    if !current.changed_slices(&previous).is_empty() {
        deadline = Some(Instant::now() + config.debounce);
    }
    previous = current;

    loop {
        tokio::select! {
            changed = receiver.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = receiver.borrow_and_update().clone();
                if !current.changed_slices(&previous).is_empty() {
                    deadline = Some(Instant::now() + config.debounce);
                }
                previous = current;
            }
            _ = wait_until(deadline), if deadline.is_some() => {
                deadline = None;
                // Upload what the state is now, not what it was when the timer was armed
                let document = store.state().to_document();
                match serde_json::to_value(&document) {
                    Ok(value) => {
                        let remote = Arc::clone(&remote);
                        let profile_id = profile_id.clone();
                        tokio::spawn(async move {
                            match remote.upsert_profile(&profile_id, &value).await {
                                Ok(()) => debug!(profile_id = %profile_id, "Remote profile synced"),
                                Err(e) => error!(profile_id = %profile_id, error = %e, "Remote sync failed"),
                            }
                        });
                    }
                    Err(e) => error!(error = %e, "Failed to encode document for upload"),
                }
            }
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::{AuthSession, NoAuth, PendingAuth, StaticSession};
    use crate::storage::{InMemoryProfileStore, KeyValueStorage, MemoryKeyValueStore};
    use serde_json::json;
    use shared::{Diagnosis, EntityId, Note};
    use std::time::Duration;

    struct Harness {
        store: AppStore,
        backend: MemoryKeyValueStore,
        local: LocalStore,
        remote: InMemoryProfileStore,
    }

    fn harness() -> Harness {
        let backend = MemoryKeyValueStore::new();
        Harness {
            store: AppStore::new(),
            local: LocalStore::new(Arc::new(backend.clone())),
            backend,
            remote: InMemoryProfileStore::new(),
        }
    }

    impl Harness {
        fn controller(&self, with_remote: bool, auth: Arc<dyn AuthSessionProvider>) -> SyncController {
            let remote: Option<Arc<dyn RemoteProfileStorage>> = if with_remote {
                Some(Arc::new(self.remote.clone()))
            } else {
                None
            };
            SyncController::new(
                self.store.clone(),
                self.local.clone(),
                remote,
                auth,
                SyncConfig::default(),
            )
        }
    }

    fn diagnosis(id: &str) -> Diagnosis {
        Diagnosis {
            id: EntityId::from(id),
            name: format!("Diagnos {}", id),
            ..Diagnosis::default()
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_local_only_hydration() {
        let h = harness();
        h.backend
            .put_value("vardcoachen-diagnoses", r#"[{"id":"d1","name":"Astma"}]"#)
            .await
            .unwrap();

        let controller = h.controller(false, Arc::new(NoAuth));
        assert_eq!(controller.phase(), SyncPhase::Uninitialized);

        let source = controller.hydrate().await;
        assert_eq!(source, Some(HydrationSource::Local));
        assert_eq!(controller.phase(), SyncPhase::Hydrated);
        assert!(controller.is_hydrated());
        assert!(!controller.is_remote_ready());
        assert!(!h.store.state().is_loading);
        assert_eq!(h.store.state().diagnoses[0].name, "Astma");
        assert_eq!(controller.profile_id(), None);
    }

    #[tokio::test]
    async fn test_remote_document_is_authoritative() {
        let h = harness();
        h.local.set_profile_id("p1").await;
        h.local.write("diagnoses", &json!([{ "id": "local" }])).await;
        let remote = InMemoryProfileStore::with_profile(
            "p1",
            json!({ "diagnoses": [{ "id": "remote" }], "diary": [{ "id": "e1" }] }),
        );
        let controller = SyncController::new(
            h.store.clone(),
            h.local.clone(),
            Some(Arc::new(remote.clone())),
            Arc::new(NoAuth),
            SyncConfig::default(),
        );

        assert_eq!(controller.hydrate().await, Some(HydrationSource::Remote));
        let state = h.store.state();
        assert_eq!(state.diagnoses[0].id.as_str(), "remote");
        assert_eq!(state.diary_entries.len(), 1);
        assert_eq!(remote.upsert_count(), 0);
        assert!(controller.is_remote_ready());
    }

    #[tokio::test]
    async fn test_non_object_remote_data_is_seeded() {
        let h = harness();
        h.local.set_profile_id("p1").await;
        h.local.write("notes", &json!([{ "id": "n1", "title": "Lokal" }])).await;
        let remote = InMemoryProfileStore::with_profile("p1", json!([]));
        let controller = SyncController::new(
            h.store.clone(),
            h.local.clone(),
            Some(Arc::new(remote.clone())),
            Arc::new(NoAuth),
            SyncConfig::default(),
        );

        assert_eq!(controller.hydrate().await, Some(HydrationSource::SeededRemote));
        let seeded = remote.profile("p1").unwrap();
        assert_eq!(seeded["notes"][0]["id"], json!("n1"));
        assert_eq!(h.store.state().notes.len(), 1);
    }

    #[tokio::test]
    async fn test_authenticated_user_gets_empty_seed() {
        let h = harness();
        h.local.write("diagnoses", &json!([{ "id": "anonymous-data" }])).await;

        let auth = StaticSession(Some(AuthSession::new("user-7")));
        let controller = h.controller(true, Arc::new(auth));

        assert_eq!(controller.hydrate().await, Some(HydrationSource::SeededRemote));
        assert_eq!(controller.profile_id().as_deref(), Some("user-7"));
        assert!(h.store.state().diagnoses.is_empty());

        let seeded = h.remote.profile("user-7").unwrap();
        assert_eq!(seeded["diagnoses"], json!([]));
        assert_eq!(seeded["notes"], json!([]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_seed_falls_back_and_disables_uploads() {
        let h = harness();
        h.local.write("diagnoses", &json!([{ "id": "d1" }])).await;
        h.remote.fail_upsert(true);

        let controller = h.controller(true, Arc::new(NoAuth));
        assert_eq!(controller.initialize().await, Some(HydrationSource::Local));
        assert_eq!(h.store.state().diagnoses.len(), 1);
        assert!(!controller.is_remote_ready());

        h.remote.fail_upsert(false);
        h.store.add_diagnosis(diagnosis("d2"));
        tokio::time::sleep(Duration::from_millis(1100)).await;
        settle().await;
        assert_eq!(h.remote.upsert_count(), 0);
    }

    #[tokio::test]
    async fn test_hydration_waits_for_auth() {
        let h = harness();
        let auth = PendingAuth::new();
        let controller = Arc::new(h.controller(false, Arc::new(auth.clone())));

        let task = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.hydrate().await })
        };
        settle().await;

        assert_eq!(controller.phase(), SyncPhase::Uninitialized);
        assert!(!controller.is_hydrated());
        assert!(!h.store.state().is_loading);

        auth.resolve(None);
        assert_eq!(task.await.unwrap(), Some(HydrationSource::Local));
        assert!(controller.is_hydrated());
    }

    #[tokio::test]
    async fn test_hydrate_runs_once() {
        let h = harness();
        h.local.set_profile_id("p1").await;
        let remote = InMemoryProfileStore::with_profile("p1", json!({ "diagnoses": [] }));
        let controller = SyncController::new(
            h.store.clone(),
            h.local.clone(),
            Some(Arc::new(remote)),
            Arc::new(NoAuth),
            SyncConfig::default(),
        );
        assert_eq!(controller.hydrate().await, Some(HydrationSource::Remote));

        h.store.add_diagnosis(diagnosis("d1"));
        assert_eq!(controller.hydrate().await, None);
        assert_eq!(h.store.state().diagnoses.len(), 1);
    }

    #[tokio::test]
    async fn test_dispose_during_hydration_skips_load() {
        let h = harness();
        h.local.write("diagnoses", &json!([{ "id": "d1" }])).await;
        let auth = PendingAuth::new();
        let controller = Arc::new(h.controller(false, Arc::new(auth.clone())));

        let task = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.initialize().await })
        };
        settle().await;

        controller.dispose();
        auth.resolve(None);

        assert_eq!(task.await.unwrap(), None);
        assert!(h.store.state().diagnoses.is_empty());
        assert!(!controller.is_hydrated());

        h.store.add_diagnosis(diagnosis("d2"));
        settle().await;
        assert_eq!(
            h.backend.get_value("vardcoachen-diagnoses").await.unwrap().as_deref(),
            Some(r#"[{"id":"d1"}]"#)
        );
    }

    #[tokio::test]
    async fn test_no_local_writes_before_hydration() {
        let h = harness();
        let controller = h.controller(false, Arc::new(NoAuth));

        controller.start();
        h.store.add_diagnosis(diagnosis("early"));
        settle().await;

        assert!(h.backend.list_keys().await.unwrap().is_empty());
        assert!(!controller.is_hydrated());
    }

    #[tokio::test]
    async fn test_only_changed_collections_are_written() {
        let h = harness();
        let controller = h.controller(false, Arc::new(NoAuth));
        controller.initialize().await;

        h.store.add_note(Note {
            id: EntityId::from("n1"),
            title: "Inför besöket".to_string(),
            ..Note::default()
        });
        settle().await;

        assert_eq!(h.backend.list_keys().await.unwrap(), vec!["vardcoachen-notes"]);
        let written = h.backend.get_value("vardcoachen-notes").await.unwrap().unwrap();
        assert!(written.contains("Inför besöket"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_edit_after_initialize_is_saved_and_uploaded() {
        let h = harness();
        let controller = h.controller(true, Arc::new(NoAuth));
        assert_eq!(controller.initialize().await, Some(HydrationSource::SeededRemote));
        assert_eq!(h.remote.upsert_count(), 1);

        // Dispatched before the replication tasks have been polled once
        h.store.add_diagnosis(diagnosis("d1"));

        tokio::time::sleep(Duration::from_secs(5)).await;
        settle().await;

        assert_eq!(h.local.load_document().await.diagnoses.len(), 1);
        assert_eq!(h.remote.upsert_count(), 2);
        let profile_id = controller.profile_id().unwrap();
        let uploaded = h.remote.profile(&profile_id).unwrap();
        assert_eq!(uploaded["diagnoses"][0]["id"], json!("d1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_restarts_on_each_change() {
        let h = harness();
        let controller = h.controller(true, Arc::new(NoAuth));
        assert_eq!(controller.initialize().await, Some(HydrationSource::SeededRemote));
        assert_eq!(h.remote.upsert_count(), 1);

        h.store.add_diagnosis(diagnosis("a"));
        tokio::time::sleep(Duration::from_millis(800)).await;
        h.store.add_diagnosis(diagnosis("b"));
        tokio::time::sleep(Duration::from_millis(800)).await;
        settle().await;
        assert_eq!(h.remote.upsert_count(), 1);

        tokio::time::sleep(Duration::from_millis(300)).await;
        settle().await;
        assert_eq!(h.remote.upsert_count(), 2);

        let profile_id = controller.profile_id().unwrap();
        let uploaded = h.remote.profile(&profile_id).unwrap();
        assert_eq!(uploaded["diagnoses"].as_array().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ui_only_changes_do_not_upload() {
        let h = harness();
        let controller = h.controller(true, Arc::new(NoAuth));
        controller.initialize().await;

        h.store.toggle_mobile_menu();
        h.store.set_loading(true);
        tokio::time::sleep(Duration::from_secs(2)).await;
        settle().await;

        assert_eq!(h.remote.upsert_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_cancels_pending_upload() {
        let h = harness();
        let controller = h.controller(true, Arc::new(NoAuth));
        controller.initialize().await;

        h.store.add_diagnosis(diagnosis("a"));
        settle().await;
        controller.dispose();

        tokio::time::sleep(Duration::from_secs(5)).await;
        settle().await;
        assert_eq!(h.remote.upsert_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_failure_is_not_fatal() {
        let h = harness();
        let controller = h.controller(true, Arc::new(NoAuth));
        controller.initialize().await;

        h.remote.fail_upsert(true);
        h.store.add_diagnosis(diagnosis("a"));
        tokio::time::sleep(Duration::from_millis(1100)).await;
        settle().await;
        assert_eq!(h.remote.upsert_count(), 1);

        // The next change triggers a fresh attempt
        h.remote.fail_upsert(false);
        h.store.add_diagnosis(diagnosis("b"));
        tokio::time::sleep(Duration::from_millis(1100)).await;
        settle().await;
        assert_eq!(h.remote.upsert_count(), 2);
        assert_eq!(h.store.state().diagnoses.len(), 2);
    }
}
