use super::driver::ProctorHandle;
use super::signals::DirectiveSignals;
use crate::constants::SESSION_ID_LEN;
use crate::utils::generator::random_string;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

pub struct SessionEntry {
    pub id: String,
    pub user_id: String,
    pub problem_id: u32,
    pub handle: ProctorHandle,
    pub signals: Arc<DirectiveSignals>,
}

/// Running sessions by id. An entry is dropped once its session tells the
/// client to navigate away.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<SessionEntry>>>,
}

impl SessionRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn insert(
        self: &Arc<Self>,
        user_id: &str,
        problem_id: u32,
        handle: ProctorHandle,
        signals: Arc<DirectiveSignals>,
    ) -> Arc<SessionEntry> {
        let mut sessions = self.sessions.write().await;
        let mut id = random_string(SESSION_ID_LEN);
        while sessions.contains_key(&id) {
            id = random_string(SESSION_ID_LEN);
        }
        let entry = Arc::new(SessionEntry {
            id: id.clone(),
            user_id: user_id.to_string(),
            problem_id,
            handle,
            signals,
        });
        sessions.insert(id.clone(), entry.clone());
        drop(sessions);

        let registry = Arc::downgrade(self);
        let watched = entry.clone();
        tokio::spawn(async move {
            watched.handle.navigated().await;
            if let Some(registry) = registry.upgrade() {
                registry.remove(&watched.id).await;
            }
        });
        entry
    }

    /// The session `id` if it belongs to `user_id`.
    pub async fn get(&self, id: &str, user_id: &str) -> Option<Arc<SessionEntry>> {
        self.sessions
            .read()
            .await
            .get(id)
            .filter(|e| e.user_id == user_id)
            .cloned()
    }

    pub async fn remove(&self, id: &str) -> Option<Arc<SessionEntry>> {
        let removed = self.sessions.write().await.remove(id);
        if removed.is_some() {
            debug!(session = id, "session dropped");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
