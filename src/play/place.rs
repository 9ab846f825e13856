//! Block place, packet 0x08 (spec.md §4.10 "Block place").

use std::io::Cursor;
use std::sync::Arc;

use crate::net::connection::Shared;
use crate::player::Player;
use crate::protocol::packets::play::clientbound as cb;
use crate::wire;

fn encode(packet: &cb::BlockChange) -> Vec<u8> {
    let mut buf = Vec::new();
    packet
        .encode(&mut buf)
        .expect("encoding to a Vec<u8> cannot fail");
    buf
}

/// `(dx, dy, dz)` for each of the six Minecraft face IDs.
fn face_normal(face: i8) -> (i32, i32, i32) {
    match face {
        0 => (0, -1, 0),
        1 => (0, 1, 0),
        2 => (0, 0, -1),
        3 => (0, 0, 1),
        4 => (-1, 0, 0),
        5 => (1, 0, 0),
        _ => (0, 0, 0),
    }
}

/// Handles a `PlayerBlockPlacement` packet. `tail` holds the held-item slot
/// payload followed by the cursor offset, a shape the tag vocabulary can't
/// express (spec.md §4.10, §9).
pub fn handle(shared: &Shared, player: &Arc<Player>, location: (i32, i32, i32), face: i8, tail: &[u8]) {
    if location == (-1, -1, -1) {
        return;
    }

    let mut cursor = Cursor::new(tail);
    let Ok(block_id) = wire::read_i16(&mut cursor) else { return };
    if block_id == -1 {
        return;
    }

    let (dx, dy, dz) = face_normal(face);
    let (x, y, z) = (location.0 + dx, location.1 + dy, location.2 + dz);
    if !(0..256).contains(&y) {
        return;
    }

    let state = (block_id as u16) << 4;
    shared.world.set_block(x, y, z, state);

    let packet = cb::BlockChange {
        location: (x, y, z),
        block_state: state as i32,
    };
    let payload = encode(&packet);
    shared
        .players
        .broadcast_except(cb::BlockChange::ID, &payload, player.entity_id);
    player.send(cb::BlockChange::ID, &payload);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::play::effects::NetEffects;
    use crate::player::PlayerManager;
    use crate::world::{FlatGenerator, WorldStore};
    use parking_lot::Mutex;
    use uuid::Uuid;

    struct RecordingSink {
        sent: Mutex<Vec<(i32, Vec<u8>)>>,
    }
    impl crate::player::state::PacketSink for RecordingSink {
        fn send_packet(&self, packet_id: i32, payload: &[u8]) -> crate::error::Result<()> {
            self.sent.lock().push((packet_id, payload.to_vec()));
            Ok(())
        }
    }

    fn test_shared() -> Shared {
        let world = Arc::new(WorldStore::new(Arc::new(FlatGenerator::new())));
        let effects = Arc::new(NetEffects::new());
        let players = Arc::new(PlayerManager::new(effects.clone(), 8));
        effects.bind(Arc::downgrade(&players));
        Shared {
            config: Config::default(),
            world,
            players,
            key_pair: None,
            http: reqwest::blocking::Client::new(),
            commands: Arc::new(crate::play::commands::CommandTable::new()),
        }
    }

    fn held_item_tail(block_id: i16) -> Vec<u8> {
        let mut buf = Vec::new();
        let _ = wire::write_i16(block_id, &mut buf);
        buf
    }

    #[test]
    fn placing_against_the_top_face_sets_the_block_above() {
        let shared = test_shared();
        let sink = Arc::new(RecordingSink { sent: Mutex::new(Vec::new()) });
        let player = Arc::new(Player::new(1, Uuid::new_v4(), "Alice".to_string(), sink.clone()));
        shared.players.add(player.clone());
        sink.sent.lock().clear();

        handle(&shared, &player, (0, 64, 0), 1, &held_item_tail(5));

        assert_eq!(shared.world.get_block(0, 65, 0), 5 << 4);
        assert!(sink.sent.lock().iter().any(|(id, _)| *id == cb::BlockChange::ID));
    }

    #[test]
    fn empty_held_item_places_nothing() {
        let shared = test_shared();
        let sink = Arc::new(RecordingSink { sent: Mutex::new(Vec::new()) });
        let player = Arc::new(Player::new(1, Uuid::new_v4(), "Alice".to_string(), sink));

        handle(&shared, &player, (0, 64, 0), 1, &held_item_tail(-1));

        assert_eq!(shared.world.get_block(0, 65, 0), 0);
    }

    #[test]
    fn sentinel_location_is_ignored() {
        let shared = test_shared();
        let sink = Arc::new(RecordingSink { sent: Mutex::new(Vec::new()) });
        let player = Arc::new(Player::new(1, Uuid::new_v4(), "Alice".to_string(), sink.clone()));

        handle(&shared, &player, (-1, -1, -1), 1, &held_item_tail(5));

        assert!(sink.sent.lock().is_empty());
    }
}
