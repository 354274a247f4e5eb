use std::sync::Arc;

use crate::config::AppConfig;
use crate::goals::checkpoints::CheckpointEngine;
use crate::storage::OkrStore;

pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn OkrStore>,
    pub engine: CheckpointEngine,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn OkrStore>) -> Self {
        let engine = CheckpointEngine::new(store.clone());
        Self {
            config,
            store,
            engine,
        }
    }
}
