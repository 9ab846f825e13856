//! Block dig, packet 0x07 (spec.md §4.10 "Block dig").

use std::sync::Arc;

use crate::data::registry::{block_info, break_time_ticks};
use crate::net::connection::Shared;
use crate::play::join::send_window_items;
use crate::player::{GameMode, Player, Slot};
use crate::protocol::packets::play::clientbound as cb;
use crate::world::WorldStore;

fn encode<P>(packet: &P) -> Vec<u8>
where
    P: PacketEncode,
{
    packet.encode_to_vec()
}

trait PacketEncode {
    fn encode_to_vec(&self) -> Vec<u8>;
}

macro_rules! impl_packet_encode {
    ($($ty:ty),* $(,)?) => {
        $(impl PacketEncode for $ty {
            fn encode_to_vec(&self) -> Vec<u8> {
                let mut buf = Vec::new();
                self.encode(&mut buf).expect("encoding to a Vec<u8> cannot fail");
                buf
            }
        })*
    };
}

impl_packet_encode!(
    cb::BlockChange,
    cb::BlockBreakAnimation,
    cb::WorldEvent,
);

/// Scans up to 64 blocks beneath `start_y` for the first non-air cell,
/// returning the surface it would rest on (spec.md §4.10, §9 "Item-entity
/// landing simulation").
fn ground_height(world: &WorldStore, start_y: i32, x: f64, z: f64) -> f64 {
    let ix = x.floor() as i32;
    let iz = z.floor() as i32;
    for dy in 0..64 {
        let y = start_y - dy;
        if y < 0 {
            break;
        }
        if world.get_block(ix, y, iz) != 0 {
            return (y + 1) as f64;
        }
    }
    (start_y - 64).max(0) as f64
}

/// Handles a `PlayerDigging` packet; `status`, `x`/`y`/`z`, `face` are the
/// decoded fields (spec.md §4.10).
pub fn handle(shared: &Shared, player: &Arc<Player>, status: i8, x: i32, y: i32, z: i32) {
    match status {
        0 => {
            if player.game_mode() == GameMode::Creative {
                break_block(shared, player, x, y, z);
            }
            // Survival: the break-time formula (`break_time_ticks`) exists
            // for clients that want authoritative validation; the actual
            // mutation happens on status 2, trusting the client's timing.
        }
        1 => {
            let packet = cb::BlockBreakAnimation {
                entity_id: player.entity_id,
                location: (x, y, z),
                destroy_stage: -1,
            };
            shared.players.broadcast_to_trackers(
                cb::BlockBreakAnimation::ID,
                &encode(&packet),
                player.entity_id,
            );
        }
        2 => break_block(shared, player, x, y, z),
        3 => drop_held(shared, player, true),
        4 => drop_held(shared, player, false),
        _ => {}
    }
}

fn break_block(shared: &Shared, player: &Arc<Player>, x: i32, y: i32, z: i32) {
    let state = shared.world.get_block(x, y, z);
    let block_id = (state >> 4) as i16;
    let Some(info) = block_info(block_id) else { return };
    if !info.diggable {
        return;
    }

    if player.game_mode() == GameMode::Survival {
        let held = player.inventory.read().held_item();
        if break_time_ticks(&info, held.block_id).is_none() {
            return;
        }
    }

    shared.world.set_block(x, y, z, 0);

    let change = cb::BlockChange {
        location: (x, y, z),
        block_state: 0,
    };
    shared
        .players
        .broadcast_except(cb::BlockChange::ID, &encode(&change), player.entity_id);

    let event = cb::WorldEvent {
        effect_id: 2001,
        location: (x, y, z),
        data: state as i32,
        disable_relative_volume: false,
    };
    shared
        .players
        .broadcast_to_trackers(cb::WorldEvent::ID, &encode(&event), player.entity_id);

    if player.game_mode() == GameMode::Survival {
        if let Some((drop_id, drop_count)) = info.drop {
            let slot = Slot {
                block_id: drop_id,
                count: drop_count,
                damage: 0,
            };
            let world = Arc::clone(&shared.world);
            let ground_at = move |px: f64, pz: f64| ground_height(&world, y, px, pz);
            shared.players.spawn_item_entity(
                slot,
                x as f64 + 0.5,
                y as f64 + 0.5,
                z as f64 + 0.5,
                0.0,
                ground_at,
            );
        }
    }
}

fn drop_held(shared: &Shared, player: &Arc<Player>, drop_all: bool) {
    let (throw_x, throw_y, throw_z, yaw) = {
        let pos = player.position();
        (pos.x, pos.y + 1.62, pos.z, pos.yaw)
    };

    let dropped = {
        let mut inventory = player.inventory.write();
        let idx = inventory.held_slot as usize;
        let held = inventory.main[idx];
        if held.is_empty() {
            return;
        }
        let count = if drop_all { held.count } else { 1 };
        let remaining = held.count - count;
        inventory.main[idx] = if remaining <= 0 {
            Slot::EMPTY
        } else {
            Slot { count: remaining, ..held }
        };
        Slot {
            block_id: held.block_id,
            count,
            damage: held.damage,
        }
    };

    let world = Arc::clone(&shared.world);
    let start_y = throw_y.floor() as i32;
    let ground_at = move |px: f64, pz: f64| ground_height(&world, start_y, px, pz);
    shared
        .players
        .spawn_item_entity(dropped, throw_x, throw_y, throw_z, yaw, ground_at);
    send_window_items(player);
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
    fn creative_status_zero_breaks_block_immediately() {
        let shared = test_shared();
        shared.world.set_block(5, 64, 5, 1 << 4);
        let sink = Arc::new(RecordingSink { sent: Mutex::new(Vec::new()) });
        let player = Arc::new(Player::new(1, Uuid::new_v4(), "Alice".to_string(), sink));
        player.set_game_mode(GameMode::Creative);
        shared.players.add(player.clone());

        handle(&shared, &player, 0, 5, 64, 5);

        assert_eq!(shared.world.get_block(5, 64, 5), 0);
    }

    #[test]
    fn survival_status_zero_does_not_break_block() {
        let shared = test_shared();
        shared.world.set_block(5, 64, 5, 1 << 4);
        let sink = Arc::new(RecordingSink { sent: Mutex::new(Vec::new()) });
        let player = Arc::new(Player::new(1, Uuid::new_v4(), "Alice".to_string(), sink));
        player.set_game_mode(GameMode::Survival);
        shared.players.add(player.clone());

        handle(&shared, &player, 0, 5, 64, 5);

        assert_eq!(shared.world.get_block(5, 64, 5), 1 << 4);
    }

    #[test]
    fn drop_held_removes_one_item_and_spawns_it() {
        let shared = test_shared();
        let sink = Arc::new(RecordingSink { sent: Mutex::new(Vec::new()) });
        let player = Arc::new(Player::new(1, Uuid::new_v4(), "Alice".to_string(), sink.clone()));
        player.inventory.write().main[0] = Slot { block_id: 5, count: 3, damage: 0 };
        shared.players.add(player.clone());
        sink.sent.lock().clear();

        handle(&shared, &player, 4, 0, 0, 0);

        assert_eq!(player.inventory.read().main[0], Slot { block_id: 5, count: 2, damage: 0 });
        assert!(sink.sent.lock().iter().any(|(id, _)| *id == cb::SpawnObject::ID));
    }
}
