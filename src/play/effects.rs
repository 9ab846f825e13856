//! Concrete packet construction for the player manager's visibility and
//! item-entity fan-out (spec.md §4.8). The manager itself only knows entity
//! IDs and trait calls; this module is where those calls become bytes.

use std::sync::{OnceLock, Weak};

use crate::error::Result;
use crate::player::{ItemEntity, Player, PlayerManager, VisibilityEffects};
use crate::protocol::metadata::{item_metadata, player_metadata};
use crate::protocol::packets::play::clientbound as cb;
use crate::wire;

/// Implements `VisibilityEffects` against the real wire packets. Holds a
/// weak back-reference to the manager it serves so fan-out methods that are
/// conceptually "send to everyone" (collect, destroy) can reach the full
/// player set without the manager depending on the wire layer.
pub struct NetEffects {
    manager: OnceLock<Weak<PlayerManager>>,
}

impl NetEffects {
    #[must_use]
    pub fn new() -> Self {
        NetEffects {
            manager: OnceLock::new(),
        }
    }

    /// Must be called once, right after the owning `PlayerManager` is
    /// wrapped in an `Arc` (construction order: effects, then manager, then
    /// this back-reference).
    pub fn bind(&self, manager: Weak<PlayerManager>) {
        let _ = self.manager.set(manager);
    }

    fn manager(&self) -> Option<std::sync::Arc<PlayerManager>> {
        self.manager.get()?.upgrade()
    }
}

impl Default for NetEffects {
    fn default() -> Self {
        Self::new()
    }
}

fn angle_byte(degrees: f32) -> i8 {
    ((degrees / 360.0) * 256.0) as i8
}

fn destroy_entities_payload(ids: &[i32]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    wire::write_varint(ids.len() as i32, &mut buf)?;
    for &id in ids {
        wire::write_varint(id, &mut buf)?;
    }
    Ok(buf)
}

fn player_list_entry(subject: &Player, action: i32) -> Result<Vec<u8>> {
    let mut entries = Vec::new();
    wire::write_uuid(subject.uuid, &mut entries)?;
    match action {
        0 => {
            wire::write_string(&subject.username, &mut entries)?;
            wire::write_varint(subject.skin_properties.len() as i32, &mut entries)?;
            for prop in &subject.skin_properties {
                wire::write_string(&prop.name, &mut entries)?;
                wire::write_string(&prop.value, &mut entries)?;
                match &prop.signature {
                    Some(sig) => {
                        wire::write_bool(true, &mut entries)?;
                        wire::write_string(sig, &mut entries)?;
                    }
                    None => wire::write_bool(false, &mut entries)?,
                }
            }
            wire::write_varint(subject.game_mode() as i32, &mut entries)?;
            wire::write_varint(0, &mut entries)?; // ping
            wire::write_bool(false, &mut entries)?; // no custom display name
        }
        4 => {}
        _ => unreachable!("only add (0) and remove (4) player-list actions are used"),
    }
    Ok(entries)
}

/// Sends the held item plus the four armor slots as five `EntityEquipment`
/// packets (spec.md §8 scenario 4, "5x entity-equipment"). Slot indices
/// follow the 1.8 protocol: 0 = held, 1..=4 = boots/leggings/chestplate/
/// helmet.
fn send_equipment(target: &Player, subject: &Player) {
    let inventory = subject.inventory.read();
    let held = inventory.held_item();
    let armor = inventory.armor;
    drop(inventory);

    for (equipment_slot, item) in std::iter::once((0i16, held)).chain(
        armor
            .into_iter()
            .enumerate()
            .map(|(i, slot)| (i as i16 + 1, slot)),
    ) {
        let packet = cb::EntityEquipment {
            entity_id: subject.entity_id,
            slot: equipment_slot,
            item: crate::play::join::encode_slot_bytes(&item),
        };
        target.send(cb::EntityEquipment::ID, &packet.encode_to_vec());
    }
}

fn send_player_list_item(target: &Player, subject: &Player, action: i32) {
    let Ok(entry) = player_list_entry(subject, action) else { return };
    let mut entries = Vec::new();
    let _ = wire::write_varint(1, &mut entries);
    entries.extend_from_slice(&entry);
    let packet = cb::PlayerListItem { action, entries };
    let mut buf = Vec::new();
    if packet.encode(&mut buf).is_ok() {
        target.send(cb::PlayerListItem::ID, &buf);
    }
}

impl VisibilityEffects for NetEffects {
    fn send_add_tab_list(&self, target: &Player, subject: &Player) {
        send_player_list_item(target, subject, 0);
    }

    fn send_remove_tab_list(&self, target: &Player, subject: &Player) {
        send_player_list_item(target, subject, 4);
    }

    fn send_spawn(&self, target: &Player, subject: &Player) {
        let pos = subject.position();
        let (x, y, z) = pos.fixed();
        let Ok(metadata) = player_metadata(subject.entity_flags(), subject.skin_parts()) else {
            return;
        };
        let packet = cb::SpawnPlayer {
            entity_id: subject.entity_id,
            uuid: subject.uuid.to_string(),
            x,
            y,
            z,
            yaw: angle_byte(pos.yaw),
            pitch: angle_byte(pos.pitch),
            current_item: subject.inventory.read().held_item().block_id,
            metadata,
        };
        let mut buf = Vec::new();
        if packet.encode(&mut buf).is_ok() {
            target.send(cb::SpawnPlayer::ID, &buf);
        }

        target.send(
            cb::EntityHeadLook::ID,
            &cb::EntityHeadLook {
                entity_id: subject.entity_id,
                head_yaw: angle_byte(pos.yaw),
            }
            .encode_to_vec(),
        );

        send_equipment(target, subject);
    }

    fn send_destroy(&self, target: &Player, subject: &Player) {
        if let Ok(payload) = destroy_entities_payload(&[subject.entity_id]) {
            target.send(
                cb::DestroyEntities::ID,
                &(cb::DestroyEntities { entity_ids: payload }.encode_to_vec()),
            );
        }
    }

    fn send_absolute_teleport(&self, target: &Player, subject: &Player) {
        let pos = subject.position();
        let (x, y, z) = pos.fixed();
        let packet = cb::EntityTeleport {
            entity_id: subject.entity_id,
            x,
            y,
            z,
            yaw: angle_byte(pos.yaw),
            pitch: angle_byte(pos.pitch),
            on_ground: pos.on_ground,
        };
        target.send(cb::EntityTeleport::ID, &packet.encode_to_vec());
    }

    fn send_item_spawn(&self, target: &Player, item: &ItemEntity) {
        let packet = cb::SpawnObject {
            entity_id: item.entity_id,
            kind: 2, // dropped item, per the 1.8 object-type table
            x: (item.x * 32.0) as i32,
            y: (item.y * 32.0) as i32,
            z: (item.z * 32.0) as i32,
            pitch: 0,
            yaw: 0,
            data: 1,
            speed_x: item.velocity.0,
            speed_y: item.velocity.1,
            speed_z: item.velocity.2,
        };
        target.send(cb::SpawnObject::ID, &packet.encode_to_vec());

        if let Ok(metadata) = item_metadata(item.slot) {
            let meta_packet = cb::EntityMetadata {
                entity_id: item.entity_id,
                metadata,
            };
            target.send(cb::EntityMetadata::ID, &meta_packet.encode_to_vec());
        }
    }

    fn send_item_destroy(&self, target: &Player, item_id: i32) {
        if let Ok(payload) = destroy_entities_payload(&[item_id]) {
            target.send(cb::DestroyEntities::ID, &cb::DestroyEntities { entity_ids: payload }.encode_to_vec());
        }
    }

    fn send_item_collect(&self, collector: i32, item_id: i32) {
        let Some(manager) = self.manager() else { return };
        let packet = cb::CollectItem {
            collected_entity_id: item_id,
            collector_entity_id: collector,
        };
        let payload = packet.encode_to_vec();
        for player in manager.all() {
            player.send(cb::CollectItem::ID, &payload);
        }
    }
}

/// Small convenience so call sites above don't repeat the encode-to-`Vec`
/// dance for every fixed-shape packet.
trait EncodeToVec {
    fn encode_to_vec(&self) -> Vec<u8>;
}

macro_rules! impl_encode_to_vec {
    ($($ty:ty),* $(,)?) => {
        $(impl EncodeToVec for $ty {
            fn encode_to_vec(&self) -> Vec<u8> {
                let mut buf = Vec::new();
                self.encode(&mut buf).expect("encoding to a Vec<u8> cannot fail");
                buf
            }
        })*
    };
}

impl_encode_to_vec!(
    cb::DestroyEntities,
    cb::EntityTeleport,
    cb::SpawnObject,
    cb::EntityMetadata,
    cb::CollectItem,
    cb::EntityHeadLook,
    cb::EntityEquipment,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::inventory::Slot;
    use parking_lot::Mutex;
    use std::sync::Arc;
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

    fn test_player(entity_id: i32, name: &str) -> (Arc<Player>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink { sent: Mutex::new(Vec::new()) });
        let player = Arc::new(Player::new(entity_id, Uuid::new_v4(), name.to_string(), sink.clone()));
        (player, sink)
    }

    #[test]
    fn send_spawn_sends_spawn_then_head_look_then_five_equipment_packets() {
        let (target, target_sink) = test_player(1, "Target");
        let (subject, _subject_sink) = test_player(2, "Subject");
        subject.inventory.write().main[0] = Slot { block_id: 5, count: 1, damage: 0 };
        subject.inventory.write().armor[3] = Slot { block_id: 10, count: 1, damage: 0 };

        let net_effects = NetEffects::new();
        net_effects.send_spawn(&target, &subject);

        let sent = target_sink.sent.lock();
        let ids: Vec<i32> = sent.iter().map(|(id, _)| *id).collect();
        assert_eq!(
            ids,
            vec![
                cb::SpawnPlayer::ID,
                cb::EntityHeadLook::ID,
                cb::EntityEquipment::ID,
                cb::EntityEquipment::ID,
                cb::EntityEquipment::ID,
                cb::EntityEquipment::ID,
                cb::EntityEquipment::ID,
            ]
        );
    }

    #[test]
    fn send_destroy_emits_one_destroy_entities_packet() {
        let (target, target_sink) = test_player(1, "Target");
        let (subject, _subject_sink) = test_player(2, "Subject");

        NetEffects::new().send_destroy(&target, &subject);

        let sent = target_sink.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, cb::DestroyEntities::ID);
    }
}
