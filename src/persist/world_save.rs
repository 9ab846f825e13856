//! `world/overrides.json`: world clock plus the sparse block-override map
//! (spec.md §4.11).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ServerError};
use crate::persist::atomic::write_json_atomic;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideEntry {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub state_id: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorldSave {
    pub age: i64,
    pub time_of_day: i64,
    pub overrides: Vec<OverrideEntry>,
}

fn path(data_dir: &Path) -> std::path::PathBuf {
    data_dir.join("world").join("overrides.json")
}

/// Best-effort load: a missing or corrupt file leaves the caller to use
/// in-memory defaults (spec.md §4.11 "Load on startup is best-effort").
#[must_use]
pub fn load(data_dir: &Path) -> Option<WorldSave> {
    let bytes = std::fs::read(path(data_dir)).ok()?;
    serde_json::from_slice(&bytes).ok()
}

pub fn save(data_dir: &Path, save: &WorldSave) -> Result<()> {
    let target = path(data_dir);
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ServerError::StorageError(e.to_string()))?;
    }
    write_json_atomic(&target, save).map_err(|e| ServerError::StorageError(e.to_string()))
}
