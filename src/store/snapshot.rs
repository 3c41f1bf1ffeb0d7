// Store snapshot persistence
// Saves the whole dataset to a TOML file after each mutation

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use super::errors::{StoreError, StoreResult};
use super::Item;
use crate::logger;

/// Serialized form of the dataset: table name -> key -> item
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Snapshot {
    #[serde(default)]
    pub tables: HashMap<String, HashMap<String, Item>>,
}

/// Snapshot file handle
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the snapshot, starting empty when the file is missing or unreadable
    pub fn load(&self) -> Snapshot {
        if !self.path.exists() {
            return Snapshot::default();
        }

        match fs::read_to_string(&self.path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(snapshot) => {
                    logger::log_info(&format!(
                        "Loaded store snapshot from {}",
                        self.path.display()
                    ));
                    snapshot
                }
                Err(e) => {
                    logger::log_error(&format!(
                        "Failed to parse snapshot file {}: {e}",
                        self.path.display()
                    ));
                    Snapshot::default()
                }
            },
            Err(e) => {
                logger::log_error(&format!(
                    "Failed to read snapshot file {}: {e}",
                    self.path.display()
                ));
                Snapshot::default()
            }
        }
    }

    /// Write the snapshot, creating parent directories as needed
    pub fn save(&self, snapshot: &Snapshot) -> StoreResult<()> {
        let content = toml::to_string_pretty(snapshot)
            .map_err(|e| StoreError::Snapshot(format!("Failed to serialize snapshot: {e}")))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Snapshot(format!("Failed to create snapshot directory: {e}"))
                })?;
            }
        }

        fs::write(&self.path, content)
            .map_err(|e| StoreError::Snapshot(format!("Failed to write snapshot file: {e}")))
    }
}
