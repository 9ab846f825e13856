//! Movement packets 0x04/0x05/0x06 (spec.md §4.10 "Movement").

use std::sync::Arc;

use crate::net::connection::Shared;
use crate::play::join::send_window_items;
use crate::player::{Player, Position};
use crate::protocol::packets::play::clientbound as cb;

fn angle_byte(degrees: f32) -> i8 {
    ((degrees / 360.0) * 256.0) as i8
}

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
    cb::EntityRelativeMove,
    cb::EntityLookAndRelativeMove,
    cb::EntityTeleport,
    cb::EntityHeadLook,
    cb::PlayerPositionLook,
);

/// Handles a position and/or look update, applying world-radius clamping,
/// emitting the appropriate relative/teleport fan-out, and re-running
/// tracking and pickup (spec.md §4.10 "Movement").
pub fn handle(
    shared: &Shared,
    player: &Arc<Player>,
    new_xyz: Option<(f64, f64, f64)>,
    new_look: Option<(f32, f32)>,
    on_ground: bool,
) {
    let current = player.position();
    let mut target = Position {
        x: new_xyz.map_or(current.x, |(x, _, _)| x),
        y: new_xyz.map_or(current.y, |(_, y, _)| y),
        z: new_xyz.map_or(current.z, |(_, _, z)| z),
        yaw: new_look.map_or(current.yaw, |(yaw, _)| yaw),
        pitch: new_look.map_or(current.pitch, |(_, pitch)| pitch),
        on_ground,
    };

    let radius = shared.config.world_radius;
    let mut clamped = false;
    if radius > 0 {
        // `world_radius` is in chunks (spec.md §6.5); convert to the block
        // bound before clamping the block-space position.
        let block_radius = (radius * 16) as f64;
        let clamped_x = target.x.clamp(-block_radius, block_radius);
        let clamped_z = target.z.clamp(-block_radius, block_radius);
        if clamped_x != target.x || clamped_z != target.z {
            clamped = true;
            target.x = clamped_x;
            target.z = clamped_z;
        }
    }

    let (old_fixed, new_fixed) = player.set_position(target);
    let pos_changed = new_xyz.is_some();
    let look_changed = new_look.is_some();

    if pos_changed {
        let dx = (new_fixed.0 - old_fixed.0) as i64;
        let dy = (new_fixed.1 - old_fixed.1) as i64;
        let dz = (new_fixed.2 - old_fixed.2) as i64;
        let fits = dx.abs() <= 127 && dy.abs() <= 127 && dz.abs() <= 127;

        if look_changed && fits {
            let packet = cb::EntityLookAndRelativeMove {
                entity_id: player.entity_id,
                dx: dx as i8,
                dy: dy as i8,
                dz: dz as i8,
                yaw: angle_byte(target.yaw),
                pitch: angle_byte(target.pitch),
                on_ground,
            };
            shared.players.broadcast_to_trackers(
                cb::EntityLookAndRelativeMove::ID,
                &encode(&packet),
                player.entity_id,
            );
        } else if fits {
            let packet = cb::EntityRelativeMove {
                entity_id: player.entity_id,
                dx: dx as i8,
                dy: dy as i8,
                dz: dz as i8,
                on_ground,
            };
            shared.players.broadcast_to_trackers(
                cb::EntityRelativeMove::ID,
                &encode(&packet),
                player.entity_id,
            );
        } else {
            let packet = cb::EntityTeleport {
                entity_id: player.entity_id,
                x: new_fixed.0,
                y: new_fixed.1,
                z: new_fixed.2,
                yaw: angle_byte(target.yaw),
                pitch: angle_byte(target.pitch),
                on_ground,
            };
            shared.players.broadcast_to_trackers(
                cb::EntityTeleport::ID,
                &encode(&packet),
                player.entity_id,
            );
        }
    }

    if look_changed {
        let packet = cb::EntityHeadLook {
            entity_id: player.entity_id,
            head_yaw: angle_byte(target.yaw),
        };
        shared
            .players
            .broadcast_to_trackers(cb::EntityHeadLook::ID, &encode(&packet), player.entity_id);
    }

    if clamped {
        let packet = cb::PlayerPositionLook {
            x: target.x,
            y: target.y,
            z: target.z,
            yaw: target.yaw,
            pitch: target.pitch,
            flags: 0,
        };
        player.send(cb::PlayerPositionLook::ID, &encode(&packet));
    }

    if pos_changed {
        shared.players.update_tracking(player.entity_id);
        if shared.players.try_pickup_items(player) {
            send_window_items(player);
        }
    }
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
    fn small_move_broadcasts_relative_move_to_trackers() {
        let shared = test_shared();
        let mover = Arc::new(Player::new(1, Uuid::new_v4(), "Mover".to_string(), Arc::new(RecordingSink { sent: Mutex::new(Vec::new()) })));
        let watcher_sink = Arc::new(RecordingSink { sent: Mutex::new(Vec::new()) });
        let watcher = Arc::new(Player::new(2, Uuid::new_v4(), "Watcher".to_string(), watcher_sink.clone()));
        shared.players.add(mover.clone());
        shared.players.add(watcher.clone());
        watcher.start_tracking(mover.entity_id);
        watcher_sink.sent.lock().clear();

        handle(&shared, &mover, Some((1.0, 64.0, 0.0)), None, true);

        let sent = watcher_sink.sent.lock();
        assert!(sent.iter().any(|(id, _)| *id == cb::EntityRelativeMove::ID));
    }

    #[test]
    fn world_radius_clamps_position_and_replies_with_teleport() {
        let mut shared = test_shared();
        shared.config.world_radius = 10;
        let sink = Arc::new(RecordingSink { sent: Mutex::new(Vec::new()) });
        let player = Arc::new(Player::new(1, Uuid::new_v4(), "Alice".to_string(), sink.clone()));
        shared.players.add(player.clone());
        sink.sent.lock().clear();

        // A radius of 10 chunks bounds block positions to +/-160.
        handle(&shared, &player, Some((200.0, 64.0, 0.0)), None, true);

        assert_eq!(player.position().x, 160.0);
        let sent = sink.sent.lock();
        assert!(sent.iter().any(|(id, _)| *id == cb::PlayerPositionLook::ID));
    }
}
