//! Atomic JSON persistence of world overrides, world clock, and per-player
//! state (spec.md §4.11).

pub mod atomic;
pub mod player_save;
pub mod world_save;

pub use player_save::PlayerSave;
pub use world_save::WorldSave;
