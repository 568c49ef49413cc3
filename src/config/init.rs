use crate::dao::persistence::{JsonFilePersistence, MemoryPersistence, Persistence};
use crate::dao::store::Store;
use crate::dao::submission_dao::{Engine, ScoringPolicy};
use crate::proctor::machine::ProctorPolicy;
use crate::utils::judger;
use crate::AppState;
use crate::{config::env, constants};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub async fn init() -> anyhow::Result<AppState> {
    let dotenv = dotenv::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    if let Err(e) = dotenv {
        warn!("no .env loaded: {}", e);
    }

    let persistence: Arc<dyn Persistence> = match env::get_opt("STORE_PATH") {
        Some(path) => {
            info!(%path, "persisting to json snapshot");
            Arc::new(JsonFilePersistence::new(path))
        }
        None => {
            warn!("STORE_PATH not set, state lives in memory only");
            Arc::new(MemoryPersistence::default())
        }
    };
    let store = Arc::new(Store::open(persistence).await?);
    if constants::ADMIN_PASSWORD.is_empty() {
        warn!("ADMIN_PASSWORD not set, admin login is disabled");
    }

    let executor = judger::executor_from_env()?;
    let engine = Engine::new(store, executor).with_scoring(ScoringPolicy::from_env());
    let proctor = ProctorPolicy::from_env();
    info!(
        budget = proctor.session_budget_secs,
        max_violations = proctor.max_violations,
        clipboard = ?proctor.clipboard,
        round = %engine.scoring.round,
        "policies loaded"
    );
    Ok(AppState::new(engine, proctor))
}
