//! Per-player mutable state (spec.md §3 "Player", §4.7).

use bitflags::bitflags;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::player::inventory::Inventory;

bitflags! {
    /// Player-abilities flag byte sent in the abilities packet.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Abilities: u8 {
        const INVULNERABLE  = 0x01;
        const FLYING        = 0x02;
        const ALLOW_FLYING  = 0x04;
        const CREATIVE_MODE = 0x08;
    }
}

bitflags! {
    /// Entity-flags byte (metadata index 0): bit 1 sneak, bit 3 sprint
    /// (spec.md §6.2).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EntityFlags: u8 {
        const ON_FIRE = 0x01;
        const SNEAKING = 0x02;
        const SPRINTING = 0x08;
        const INVISIBLE = 0x20;
    }
}

bitflags! {
    /// Skin-parts bitmask (metadata index 10 for players).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SkinParts: u8 {
        const CAPE = 0x01;
        const JACKET = 0x02;
        const LEFT_SLEEVE = 0x04;
        const RIGHT_SLEEVE = 0x08;
        const LEFT_PANTS = 0x10;
        const RIGHT_PANTS = 0x20;
        const HAT = 0x40;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    Survival = 0,
    Creative = 1,
    Adventure = 2,
    Spectator = 3,
}

impl GameMode {
    #[must_use]
    pub fn abilities(self) -> Abilities {
        match self {
            GameMode::Creative => {
                Abilities::CREATIVE_MODE | Abilities::ALLOW_FLYING | Abilities::INVULNERABLE
            }
            GameMode::Spectator => {
                Abilities::ALLOW_FLYING | Abilities::FLYING | Abilities::INVULNERABLE
            }
            GameMode::Survival | GameMode::Adventure => Abilities::empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
    pub on_ground: bool,
}

impl Position {
    #[must_use]
    pub fn fixed(&self) -> (i32, i32, i32) {
        (
            (self.x * 32.0).floor() as i32,
            (self.y * 32.0).floor() as i32,
            (self.z * 32.0).floor() as i32,
        )
    }

    #[must_use]
    pub fn chunk(&self) -> (i32, i32) {
        ((self.x as i32) >> 4, (self.z as i32) >> 4)
    }
}

impl Default for Position {
    fn default() -> Self {
        Position {
            x: 0.0,
            y: 64.0,
            z: 0.0,
            yaw: 0.0,
            pitch: 0.0,
            on_ground: true,
        }
    }
}

/// In-progress drag/paint click state (mode 5), spanning the start/add/end
/// packet sequence for one window click gesture (spec.md §4.10 "Inventory
/// click").
#[derive(Debug, Clone)]
pub struct DragSession {
    pub right_click: bool,
    pub slots: Vec<i16>,
}

/// A skin property triple as returned by the identity endpoint (spec.md §6.4).
#[derive(Debug, Clone)]
pub struct SkinProperty {
    pub name: String,
    pub value: String,
    pub signature: Option<String>,
}

/// A destination for outbound packets, implemented by the connection that
/// owns this player's socket. The player manager and play-phase handlers
/// send through this rather than holding a `TcpStream` directly, so they
/// stay agnostic to framing and the stream cipher (spec.md §4.9's per-
/// connection write lock lives behind this trait's implementation).
pub trait PacketSink: Send + Sync {
    fn send_packet(&self, packet_id: i32, payload: &[u8]) -> crate::error::Result<()>;
}

/// Player mutable state, guarded by its own `RwLock` per spec.md §4.7 ("Per-
/// player state is guarded by a per-player lock"). The inventory carries a
/// second, inner lock so equipment fan-out can read it independently.
pub struct Player {
    pub entity_id: i32,
    pub uuid: Uuid,
    pub username: String,
    pub skin_properties: Vec<SkinProperty>,
    pub sink: std::sync::Arc<dyn PacketSink>,
    inner: RwLock<PlayerInner>,
    pub inventory: RwLock<Inventory>,
    pub cursor: RwLock<crate::player::inventory::Slot>,
    pub drag: RwLock<Option<DragSession>>,
}

struct PlayerInner {
    position: Position,
    last_fixed: (i32, i32, i32),
    game_mode: GameMode,
    entity_flags: EntityFlags,
    skin_parts: SkinParts,
    visibility: std::collections::HashSet<i32>,
}

impl Player {
    #[must_use]
    pub fn new(
        entity_id: i32,
        uuid: Uuid,
        username: String,
        sink: std::sync::Arc<dyn PacketSink>,
    ) -> Self {
        let position = Position::default();
        Player {
            entity_id,
            uuid,
            username,
            skin_properties: Vec::new(),
            sink,
            inner: RwLock::new(PlayerInner {
                last_fixed: position.fixed(),
                position,
                game_mode: GameMode::Creative,
                entity_flags: EntityFlags::empty(),
                skin_parts: SkinParts::all(),
                visibility: std::collections::HashSet::new(),
            }),
            inventory: RwLock::new(Inventory::new()),
            cursor: RwLock::new(crate::player::inventory::Slot::EMPTY),
            drag: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn position(&self) -> Position {
        self.inner.read().position
    }

    #[must_use]
    pub fn game_mode(&self) -> GameMode {
        self.inner.read().game_mode
    }

    pub fn set_game_mode(&self, mode: GameMode) {
        self.inner.write().game_mode = mode;
    }

    #[must_use]
    pub fn entity_flags(&self) -> EntityFlags {
        self.inner.read().entity_flags
    }

    pub fn set_entity_flags(&self, flags: EntityFlags) {
        self.inner.write().entity_flags = flags;
    }

    #[must_use]
    pub fn skin_parts(&self) -> SkinParts {
        self.inner.read().skin_parts
    }

    /// Updates position/look, returning `(old_fixed, new_fixed)` for the
    /// caller to pick a relative-move vs. teleport wire representation
    /// (spec.md §4.7 "Movement contract").
    pub fn set_position(&self, pos: Position) -> ((i32, i32, i32), (i32, i32, i32)) {
        let mut guard = self.inner.write();
        let old_fixed = guard.last_fixed;
        let new_fixed = pos.fixed();
        guard.position = pos;
        guard.last_fixed = new_fixed;
        (old_fixed, new_fixed)
    }

    #[must_use]
    pub fn is_tracking(&self, entity_id: i32) -> bool {
        self.inner.read().visibility.contains(&entity_id)
    }

    pub fn start_tracking(&self, entity_id: i32) -> bool {
        self.inner.write().visibility.insert(entity_id)
    }

    pub fn stop_tracking(&self, entity_id: i32) -> bool {
        self.inner.write().visibility.remove(&entity_id)
    }

    #[must_use]
    pub fn tracked_ids(&self) -> Vec<i32> {
        self.inner.read().visibility.iter().copied().collect()
    }

    /// Sends a packet to this player, logging (but not propagating) a
    /// failed write — a dead connection is torn down by its own read loop
    /// noticing the broken socket, not by whoever tried to broadcast to it.
    pub fn send(&self, packet_id: i32, payload: &[u8]) {
        if let Err(err) = self.sink.send_packet(packet_id, payload) {
            log::warn!("failed to send packet {packet_id} to {}: {err}", self.username);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullSink;
    impl PacketSink for NullSink {
        fn send_packet(&self, _packet_id: i32, _payload: &[u8]) -> crate::error::Result<()> {
            Ok(())
        }
    }

    fn test_player(entity_id: i32, username: &str) -> Player {
        Player::new(
            entity_id,
            Uuid::nil(),
            username.to_string(),
            std::sync::Arc::new(NullSink),
        )
    }

    #[test]
    fn fixed_point_floors_and_scales_by_32() {
        let pos = Position {
            x: 1.5,
            y: 64.0,
            z: -0.1,
            yaw: 0.0,
            pitch: 0.0,
            on_ground: true,
        };
        let (fx, fy, fz) = pos.fixed();
        assert_eq!(fx, 48);
        assert_eq!(fy, 2048);
        assert_eq!(fz, -4);
    }

    #[test]
    fn set_position_tracks_previous_fixed_point() {
        let player = test_player(1, "Alice");
        let first = Position::default();
        let (old, new) = player.set_position(first);
        assert_eq!(old, new);

        let moved = Position {
            x: 1.0,
            ..first
        };
        let (old2, new2) = player.set_position(moved);
        assert_eq!(old2, first.fixed());
        assert_eq!(new2, moved.fixed());
    }

    #[test]
    fn creative_abilities_include_flying_and_invulnerable() {
        let abilities = GameMode::Creative.abilities();
        assert!(abilities.contains(Abilities::ALLOW_FLYING));
        assert!(abilities.contains(Abilities::CREATIVE_MODE));
    }

    #[test]
    fn tracking_set_toggles() {
        let player = test_player(1, "Alice");
        assert!(!player.is_tracking(5));
        assert!(player.start_tracking(5));
        assert!(player.is_tracking(5));
        assert!(player.stop_tracking(5));
        assert!(!player.is_tracking(5));
    }
}
