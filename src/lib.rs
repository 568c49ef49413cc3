pub mod config;
pub mod constants;
pub mod dao;
pub mod macros;
pub mod middleware;
pub mod model;
pub mod proctor;
pub mod service;
pub mod types;
pub mod utils;

use dao::store::Store;
use dao::submission_dao::Engine;
use proctor::machine::ProctorPolicy;
use proctor::registry::SessionRegistry;
use std::sync::Arc;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub engine: Arc<Engine>,
    pub sessions: Arc<SessionRegistry>,
    pub proctor: ProctorPolicy,
}

impl AppState {
    pub fn new(engine: Engine, proctor: ProctorPolicy) -> Self {
        Self {
            store: engine.store.clone(),
            engine: Arc::new(engine),
            sessions: SessionRegistry::new(),
            proctor,
        }
    }
}
