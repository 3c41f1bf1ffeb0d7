// Application state module
// Wires the configured store into the shared handler context

use std::sync::Arc;

use super::types::{Config, StoreConfig};
use crate::api::{Context, Tables};
use crate::store::{MemoryStore, SnapshotFile, Store};

/// Application state shared by every connection
pub struct AppState {
    pub config: Config,
    pub context: Context,
}

impl AppState {
    /// Build state with an in-memory store shaped by the store config
    pub fn new(config: &Config) -> Self {
        let store = build_store(&config.store);
        Self::with_store(config, store)
    }

    /// Build state around an existing store
    pub fn with_store(config: &Config, store: Arc<dyn Store>) -> Self {
        Self {
            config: config.clone(),
            context: Context::new(store, Tables::from(&config.store)),
        }
    }
}

impl From<&StoreConfig> for Tables {
    fn from(cfg: &StoreConfig) -> Self {
        Self {
            spaces: cfg.spaces_table.clone(),
            users: cfg.users_table.clone(),
            owner_index: cfg.owner_index.clone(),
        }
    }
}

fn build_store(cfg: &StoreConfig) -> Arc<dyn Store> {
    let mut store = MemoryStore::new()
        .with_table(&cfg.spaces_table, "spaceId")
        .with_table(&cfg.users_table, "userId");
    if cfg.owner_index_enabled {
        store = store.with_index(&cfg.spaces_table, &cfg.owner_index, "hoster");
    }
    if let Some(ref path) = cfg.snapshot_file {
        store = store.with_snapshot(SnapshotFile::new(path));
    }
    Arc::new(store)
}
