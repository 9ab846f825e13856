//! `players/<hyphenated-uuid>.json` (spec.md §4.11).

use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, ServerError};
use crate::persist::atomic::write_json_atomic;
use crate::player::{GameMode, Inventory, Position, Slot};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedInventory {
    pub slots: Vec<Slot>,
    pub armor: Vec<Slot>,
    pub held_slot: i8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSave {
    pub uuid: Uuid,
    pub username: String,
    pub position: SavedPosition,
    pub gamemode: u8,
    pub inventory: SavedInventory,
}

fn path(data_dir: &Path, uuid: &Uuid) -> std::path::PathBuf {
    data_dir.join("players").join(format!("{uuid}.json"))
}

#[must_use]
pub fn load(data_dir: &Path, uuid: &Uuid) -> Option<PlayerSave> {
    let bytes = std::fs::read(path(data_dir, uuid)).ok()?;
    serde_json::from_slice(&bytes).ok()
}

pub fn save(
    data_dir: &Path,
    uuid: &Uuid,
    username: &str,
    position: &Position,
    gamemode: GameMode,
    inventory: &Inventory,
) -> Result<()> {
    let target = path(data_dir, uuid);
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ServerError::StorageError(e.to_string()))?;
    }

    let data = PlayerSave {
        uuid: *uuid,
        username: username.to_string(),
        position: SavedPosition {
            x: position.x,
            y: position.y,
            z: position.z,
            yaw: position.yaw,
            pitch: position.pitch,
        },
        gamemode: gamemode as u8,
        inventory: SavedInventory {
            slots: inventory.main.to_vec(),
            armor: inventory.armor.to_vec(),
            held_slot: inventory.held_slot,
        },
    };
    write_json_atomic(&target, &data).map_err(|e| ServerError::StorageError(e.to_string()))
}
