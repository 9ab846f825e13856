//! `(phase, direction, id) -> name` lookup (spec.md §4.5). Used for
//! diagnostics and for routing unknown play-phase packets, which are
//! silently ignored rather than treated as protocol errors (spec.md §7).

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Handshake,
    Status,
    Login,
    Play,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Serverbound,
    Clientbound,
}

/// Names every packet this crate's catalog recognizes, for log lines.
/// Unrecognized IDs return `None` rather than an error: spec.md §7 says
/// unknown IDs in the play phase must be silently ignored (varied client
/// builds send packets the core doesn't support), and in the other phases
/// they're already converted to `ProtocolError` by the caller before this
/// lookup would be useful.
#[must_use]
pub fn lookup(phase: Phase, direction: Direction, id: i32) -> Option<&'static str> {
    use Direction::{Clientbound, Serverbound};
    use Phase::{Handshake, Login, Play, Status};

    Some(match (phase, direction, id) {
        (Handshake, Serverbound, 0x00) => "Handshake",
        (Status, Serverbound, 0x00) => "StatusRequest",
        (Status, Serverbound, 0x01) => "StatusPing",
        (Status, Clientbound, 0x00) => "StatusResponse",
        (Status, Clientbound, 0x01) => "StatusPong",
        (Login, Serverbound, 0x00) => "LoginStart",
        (Login, Serverbound, 0x01) => "EncryptionResponse",
        (Login, Clientbound, 0x00) => "LoginDisconnect",
        (Login, Clientbound, 0x01) => "EncryptionRequest",
        (Login, Clientbound, 0x02) => "LoginSuccess",
        (Play, Clientbound, 0x00) => "KeepAlive",
        (Play, Clientbound, 0x01) => "JoinGame",
        (Play, Clientbound, 0x02) => "ChatMessage",
        (Play, Clientbound, 0x03) => "TimeUpdate",
        (Play, Clientbound, 0x04) => "EntityEquipment",
        (Play, Clientbound, 0x05) => "SpawnPosition",
        (Play, Clientbound, 0x08) => "PlayerPositionLook",
        (Play, Clientbound, 0x0C) => "SpawnPlayer",
        (Play, Clientbound, 0x0D) => "CollectItem",
        (Play, Clientbound, 0x0E) => "SpawnObject",
        (Play, Clientbound, 0x13) => "DestroyEntities",
        (Play, Clientbound, 0x15) => "EntityRelativeMove",
        (Play, Clientbound, 0x16) => "EntityLookAndRelativeMove",
        (Play, Clientbound, 0x18) => "EntityTeleport",
        (Play, Clientbound, 0x19) => "EntityHeadLook",
        (Play, Clientbound, 0x1C) => "EntityMetadata",
        (Play, Clientbound, 0x21) => "ChunkData",
        (Play, Clientbound, 0x23) => "BlockChange",
        (Play, Clientbound, 0x25) => "BlockBreakAnimation",
        (Play, Clientbound, 0x28) => "WorldEvent",
        (Play, Clientbound, 0x2F) => "SetSlot",
        (Play, Clientbound, 0x30) => "WindowItems",
        (Play, Clientbound, 0x32) => "ConfirmTransaction",
        (Play, Clientbound, 0x37) => "PlayerListItem",
        (Play, Clientbound, 0x38) => "PlayerAbilities",
        (Play, Clientbound, 0x3A) => "TabComplete",
        (Play, Clientbound, 0x40) => "Disconnect",
        (Play, Serverbound, 0x00) => "KeepAlive",
        (Play, Serverbound, 0x01) => "ChatMessage",
        (Play, Serverbound, 0x04) => "PlayerPosition",
        (Play, Serverbound, 0x05) => "PlayerLook",
        (Play, Serverbound, 0x06) => "PlayerPositionAndLook",
        (Play, Serverbound, 0x07) => "PlayerDigging",
        (Play, Serverbound, 0x08) => "PlayerBlockPlacement",
        (Play, Serverbound, 0x0D) => "CloseWindow",
        (Play, Serverbound, 0x0E) => "ClickWindow",
        (Play, Serverbound, 0x14) => "TabComplete",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_id_resolves() {
        assert_eq!(
            lookup(Phase::Play, Direction::Clientbound, 0x01),
            Some("JoinGame")
        );
    }

    #[test]
    fn unknown_id_is_none() {
        assert_eq!(lookup(Phase::Play, Direction::Clientbound, 0x7F), None);
    }
}
