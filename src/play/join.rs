//! The join sequence (spec.md §4.10 "Join sequence").

use std::sync::Arc;

use crate::error::Result;
use crate::net::connection::{encode, Shared};
use crate::persist::player_save;
use crate::play::chunks::send_chunks;
use crate::player::{GameMode, Inventory, Player, Position};
use crate::protocol::packets::play::clientbound as cb;

/// Runs the full join sequence, including restoring persisted state and
/// adding the player to the manager (spec.md §4.10 steps 1-3; step 4, the
/// keep-alive task, is launched by the caller in `net::connection`).
pub fn join(shared: &Shared, player: &Arc<Player>) -> Result<()> {
    if let Some(saved) = player_save::load(&shared.config.data_dir, &player.uuid) {
        let position = Position {
            x: saved.position.x,
            y: saved.position.y,
            z: saved.position.z,
            yaw: saved.position.yaw,
            pitch: saved.position.pitch,
            on_ground: true,
        };
        player.set_position(position);
        let mode = match saved.gamemode {
            1 => GameMode::Creative,
            2 => GameMode::Adventure,
            3 => GameMode::Spectator,
            _ => GameMode::Survival,
        };
        player.set_game_mode(mode);

        let mut inventory = Inventory::new();
        for (i, slot) in saved.inventory.slots.into_iter().enumerate().take(36) {
            inventory.main[i] = slot;
        }
        for (i, slot) in saved.inventory.armor.into_iter().enumerate().take(4) {
            inventory.armor[i] = slot;
        }
        inventory.held_slot = saved.inventory.held_slot;
        *player.inventory.write() = inventory;
    }

    player.send(
        cb::JoinGame::ID,
        &encode(&cb::JoinGame {
            entity_id: player.entity_id,
            gamemode: player.game_mode() as u8,
            dimension: 0,
            difficulty: 1,
            max_players: shared.config.max_players.min(255) as u8,
            level_type: "default".to_string(),
            reduced_debug_info: false,
        }),
    );

    player.send(
        cb::SpawnPosition::ID,
        &encode(&cb::SpawnPosition { location: (0, 64, 0) }),
    );

    let abilities = player.game_mode().abilities();
    player.send(
        cb::PlayerAbilities::ID,
        &encode(&cb::PlayerAbilities {
            flags: abilities.bits() as i8,
            flying_speed: 0.05,
            walking_speed: 0.1,
        }),
    );

    let pos = player.position();
    player.send(
        cb::PlayerPositionLook::ID,
        &encode(&cb::PlayerPositionLook {
            x: pos.x,
            y: pos.y,
            z: pos.z,
            yaw: pos.yaw,
            pitch: pos.pitch,
            flags: 0,
        }),
    );

    send_chunks(player, &shared.world, shared.config.view_distance);

    player.send(
        cb::TimeUpdate::ID,
        &encode(&cb::TimeUpdate {
            world_age: shared.world.age(),
            time_of_day: shared.world.time_of_day(),
        }),
    );

    send_window_items(player);

    player.send(
        cb::ChatMessage::ID,
        &encode(&cb::ChatMessage {
            json: format!(r#"{{"text":"Hello, world! Welcome, {}."}}"#, player.username),
            position: 1,
        }),
    );

    Ok(())
}

/// Sends a full window-0 inventory snapshot (spec.md §4.10 step 3,
/// §4.10 "Inventory click" resend-after-click).
pub fn send_window_items(player: &Player) {
    let inventory = player.inventory.read();
    let mut slots = Vec::new();
    for proto in 0..45i16 {
        let slot = if proto == 0 {
            crate::play::recipe::match_crafting_grid(&inventory.crafting).unwrap_or(crate::player::Slot::EMPTY)
        } else {
            match crate::player::Inventory::protocol_to_internal(proto) {
                Some(internal) => inventory.get(internal),
                None => crate::player::Slot::EMPTY,
            }
        };
        encode_slot(&slot, &mut slots);
    }
    drop(inventory);

    player.send(
        cb::WindowItems::ID,
        &encode(&cb::WindowItems {
            window_id: 0,
            slots,
        }),
    );
}

fn encode_slot(slot: &crate::player::Slot, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&encode_slot_bytes(slot));
}

/// The slot wire shape (spec.md §4.1): empty is a bare `-1` VarShort marker,
/// otherwise block ID, count, damage. Shared by the join-time window-items
/// snapshot and every handler that sends a single set-slot update.
#[must_use]
pub fn encode_slot_bytes(slot: &crate::player::Slot) -> Vec<u8> {
    use crate::wire;
    let mut buf = Vec::new();
    if slot.is_empty() {
        let _ = wire::write_i16(-1, &mut buf);
    } else {
        let _ = wire::write_i16(slot.block_id, &mut buf);
        let _ = wire::write_i8(slot.count, &mut buf);
        let _ = wire::write_i16(slot.damage, &mut buf);
    }
    buf
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

    #[test]
    fn empty_slot_encodes_as_negative_one_marker() {
        let bytes = encode_slot_bytes(&crate::player::Slot::EMPTY);
        assert_eq!(bytes, vec![0xFF, 0xFF]);
    }

    #[test]
    fn join_sequence_sends_join_game_then_welcome_message() {
        let shared = test_shared();
        let sink = Arc::new(RecordingSink { sent: Mutex::new(Vec::new()) });
        let player = Arc::new(Player::new(1, Uuid::new_v4(), "Alice".to_string(), sink.clone()));

        join(&shared, &player).unwrap();

        let ids: Vec<i32> = sink.sent.lock().iter().map(|(id, _)| *id).collect();
        assert_eq!(ids.first(), Some(&cb::JoinGame::ID));
        assert!(ids.contains(&cb::ChatMessage::ID));
        assert!(ids.contains(&cb::WindowItems::ID));
    }

    #[test]
    fn send_window_items_reports_crafting_output_in_proto_slot_zero() {
        use crate::data::registry::{CRAFTING_TABLE, PLANKS};
        let sink = Arc::new(RecordingSink { sent: Mutex::new(Vec::new()) });
        let player = Player::new(1, Uuid::new_v4(), "Alice".to_string(), sink.clone());
        let plank = crate::player::Slot { block_id: PLANKS, count: 1, damage: 0 };
        player.inventory.write().crafting = [plank, plank, plank, plank];

        send_window_items(&player);

        let (_, payload) = sink.sent.lock().pop().unwrap();
        let packet = cb::WindowItems::decode(&mut std::io::Cursor::new(payload)).unwrap();
        let mut cursor = std::io::Cursor::new(packet.slots);
        let first_slot_id = crate::wire::read_i16(&mut cursor).unwrap();
        assert_eq!(first_slot_id, CRAFTING_TABLE);
    }
}
