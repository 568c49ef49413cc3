use super::persistence::{MemoryPersistence, Persistence, Snapshot};
use super::seed;
use crate::constants;
use crate::model::{problem::Problem, user::User};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{error, info};

#[derive(Debug, Default)]
pub struct Tables {
    pub users: Vec<User>,
    pub seed_problems: Vec<Problem>,
    pub custom_problems: Vec<Problem>,
    pub next_user_id: u64,
}

impl Tables {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            next_user_id: self.next_user_id,
            ..Snapshot::new(self.users.clone(), self.custom_problems.clone())
        }
    }

    /// Hands out a fresh user id.
    pub fn allocate_user_id(&mut self) -> String {
        let id = self.next_user_id;
        self.next_user_id += 1;
        id.to_string()
    }
}

/// The single owner of users and problems. Constructed once and handed to
/// every dao function by reference.
pub struct Store {
    tables: RwLock<Tables>,
    persistence: Arc<dyn Persistence>,
}

impl Store {
    /// Loads the last snapshot (if any) and ensures the admin account exists.
    pub async fn open(persistence: Arc<dyn Persistence>) -> Result<Self> {
        let snapshot = persistence.load().await?.unwrap_or_default();
        Ok(Self::from_snapshot(snapshot, persistence))
    }

    pub fn in_memory() -> Self {
        Self::from_snapshot(Snapshot::default(), Arc::new(MemoryPersistence::default()))
    }

    fn from_snapshot(snapshot: Snapshot, persistence: Arc<dyn Persistence>) -> Self {
        let mut tables = Tables {
            users: snapshot.users,
            seed_problems: seed::seed_problems(),
            custom_problems: snapshot.custom_problems,
            next_user_id: snapshot.next_user_id,
        };
        if !tables.users.iter().any(|u| u.is_admin()) {
            tables
                .users
                .insert(0, User::admin(constants::ADMIN_LOGIN.as_str()));
        }
        // older snapshots carry no counter
        let past_max = tables
            .users
            .iter()
            .filter_map(|u| u.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        tables.next_user_id = tables.next_user_id.max(past_max);
        info!(
            users = tables.users.len(),
            custom_problems = tables.custom_problems.len(),
            "store opened"
        );
        Self {
            tables: RwLock::new(tables),
            persistence,
        }
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().await
    }

    /// Applies `f` under the write lock and mirrors the result to the
    /// persistence port before releasing it. A failed save is logged and the
    /// in-memory state stays authoritative.
    pub async fn mutate<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        let mut tables = self.tables.write().await;
        let ret = f(&mut tables);
        let snapshot = tables.snapshot();
        if let Err(e) = self.persistence.save(&snapshot).await {
            error!("failed to persist snapshot: {:#}", e);
        }
        ret
    }
}
