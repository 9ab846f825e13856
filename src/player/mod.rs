//! Player state, inventory, and the shared player manager.

pub mod inventory;
pub mod manager;
pub mod state;

pub use inventory::{Inventory, InternalSlot, Slot};
pub use manager::{ItemEntity, PlayerManager, VisibilityEffects};
pub use state::{
    Abilities, DragSession, EntityFlags, GameMode, PacketSink, Player, Position, SkinParts,
    SkinProperty,
};
