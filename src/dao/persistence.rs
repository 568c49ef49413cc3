use crate::constants::SCHEMA_VERSION;
use crate::model::{problem::Problem, user::User};
use anyhow::Result;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::Mutex;

/// Everything that outlives a process: users and admin-authored problems.
/// Seed problems are rebuilt from code on every start.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub version: u32,
    pub users: Vec<User>,
    pub custom_problems: Vec<Problem>,
    /// Next user id to hand out. Ids of removed users are never reused.
    #[serde(default)]
    pub next_user_id: u64,
}

impl Snapshot {
    pub fn new(users: Vec<User>, custom_problems: Vec<Problem>) -> Self {
        Self {
            version: SCHEMA_VERSION,
            users,
            custom_problems,
            next_user_id: 0,
        }
    }

    pub fn check_version(self) -> Result<Self> {
        if self.version != SCHEMA_VERSION {
            anyhow::bail!(
                "snapshot schema version {} is not supported (expected {})",
                self.version,
                SCHEMA_VERSION
            );
        }
        Ok(self)
    }
}

pub trait Persistence: Send + Sync {
    fn load(&self) -> BoxFuture<'_, Result<Option<Snapshot>>>;
    fn save<'a>(&'a self, snapshot: &'a Snapshot) -> BoxFuture<'a, Result<()>>;
}

#[derive(Default)]
pub struct MemoryPersistence {
    slot: Mutex<Option<Snapshot>>,
}

impl MemoryPersistence {
    pub fn with(snapshot: Snapshot) -> Self {
        Self {
            slot: Mutex::new(Some(snapshot)),
        }
    }
}

impl Persistence for MemoryPersistence {
    fn load(&self) -> BoxFuture<'_, Result<Option<Snapshot>>> {
        Box::pin(async move {
            match self.slot.lock().await.clone() {
                Some(s) => Ok(Some(s.check_version()?)),
                None => Ok(None),
            }
        })
    }

    fn save<'a>(&'a self, snapshot: &'a Snapshot) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            *self.slot.lock().await = Some(snapshot.clone());
            Ok(())
        })
    }
}

/// Keeps the snapshot as one JSON document on disk.
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Persistence for JsonFilePersistence {
    fn load(&self) -> BoxFuture<'_, Result<Option<Snapshot>>> {
        Box::pin(async move {
            if !self.path.exists() {
                return Ok(None);
            }
            let content = async_fs::read_to_string(&self.path).await?;
            let snapshot: Snapshot = serde_json::from_str(content.as_str())
                .map_err(|e| anyhow::anyhow!("snapshot {} is malformed: {}", self.path.display(), e))?;
            Ok(Some(snapshot.check_version()?))
        })
    }

    fn save<'a>(&'a self, snapshot: &'a Snapshot) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    async_fs::create_dir_all(parent).await?;
                }
            }
            // atomic replace
            let tmp = self.path.with_extension("json.tmp");
            async_fs::write(&tmp, serde_json::to_vec_pretty(snapshot)?).await?;
            async_fs::rename(&tmp, &self.path).await?;
            Ok(())
        })
    }
}
