//! Profile identity: who the remote document belongs to.
//!
//! An authenticated user's id wins. Without a session, a random id is
//! generated once and kept in the local store for later sessions.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use crate::storage::LocalStore;

/// Signed-in user, as reported by the authentication collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user_id: String,
    pub email: Option<String>,
}

impl AuthSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
        }
    }
}

/// Source of the current session. The future resolves only once the
/// authentication check has finished.
#[async_trait]
pub trait AuthSessionProvider: Send + Sync {
    async fn current_session(&self) -> Option<AuthSession>;
}

/// No authentication at all: always anonymous
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

#[async_trait]
impl AuthSessionProvider for NoAuth {
    async fn current_session(&self) -> Option<AuthSession> {
        None
    }
}

/// Session that is known up front
#[derive(Debug, Clone, Default)]
pub struct StaticSession(pub Option<AuthSession>);

#[async_trait]
impl AuthSessionProvider for StaticSession {
    async fn current_session(&self) -> Option<AuthSession> {
        self.0.clone()
    }
}

/// Session that becomes known later, when [`PendingAuth::resolve`] is called
#[derive(Debug, Clone)]
pub struct PendingAuth {
    state: Arc<watch::Sender<Option<Option<AuthSession>>>>,
}

impl Default for PendingAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingAuth {
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self {
            state: Arc::new(state),
        }
    }

    /// Finish the authentication check
    pub fn resolve(&self, session: Option<AuthSession>) {
        self.state.send_replace(Some(session));
    }
}

#[async_trait]
impl AuthSessionProvider for PendingAuth {
    async fn current_session(&self) -> Option<AuthSession> {
        let mut receiver = self.state.subscribe();
        let session = match receiver.wait_for(|state| state.is_some()).await {
            Ok(state) => (*state).clone().flatten(),
            // The sender lives in `self`, so this cannot close while we wait
            Err(_) => None,
        };
        session
    }
}

/// Resolve the profile id for this session
pub async fn resolve_profile_id(session: Option<&AuthSession>, local: &LocalStore) -> String {
    if let Some(session) = session {
        return session.user_id.clone();
    }

    if let Some(existing) = local.profile_id().await {
        return existing;
    }

    let generated = Uuid::new_v4().to_string();
    info!(profile_id = %generated, "Generated new anonymous profile id");
    local.set_profile_id(&generated).await;
    generated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKeyValueStore;
    use std::time::Duration;

    fn local() -> LocalStore {
        LocalStore::new(Arc::new(MemoryKeyValueStore::new()))
    }

    #[tokio::test]
    async fn test_session_user_wins() {
        let local = local();
        local.set_profile_id("anonymous").await;

        let session = AuthSession::new("user-42");
        assert_eq!(resolve_profile_id(Some(&session), &local).await, "user-42");
    }

    #[tokio::test]
    async fn test_anonymous_id_is_generated_once() {
        let local = local();
        let first = resolve_profile_id(None, &local).await;
        let second = resolve_profile_id(None, &local).await;

        assert!(!first.is_empty());
        assert_eq!(first, second);
        assert_eq!(local.profile_id().await, Some(first));
    }

    #[tokio::test]
    async fn test_pending_auth_waits_for_resolution() {
        let auth = PendingAuth::new();
        let waiter = {
            let auth = auth.clone();
            tokio::spawn(async move { auth.current_session().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        auth.resolve(Some(AuthSession::new("user-1")));
        let session = waiter.await.unwrap();
        assert_eq!(session.map(|s| s.user_id).as_deref(), Some("user-1"));
    }
}
